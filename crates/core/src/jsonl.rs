// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) encoding.
//!
//! Records are stored one JSON document per line. Decoding skips blank
//! lines so hand-edited or partially written blobs stay readable.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Encodes records as JSONL, one record per line.
pub fn encode<T: Serialize>(records: &[T]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Decodes JSONL records.
///
/// Skips empty lines. Errors name the offending line number.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::CorruptedData(format!("not utf-8: {e}")))?;

    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(line)
            .map_err(|e| Error::CorruptedData(format!("line {}: {e}", index + 1)))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
