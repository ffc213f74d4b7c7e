// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test-vector file parsing.
//!
//! The format is line-oriented, one transaction per line:
//!
//! ```text
//! h<index> <value>       load <value> into history register <index>
//! w<index> <value>       load <value> into weight register <index>
//! <sf> <qr> <expected>   push a sample, expect <expected> on readback
//! ```
//!
//! Whitespace between the tag letter and the index is also accepted
//! (`h 0 1234`). Blank lines and lines starting with `#` are skipped.
//! A line that fits none of these shapes aborts parsing: it means the file
//! is corrupt or from an incompatible generator, not that the device
//! misbehaved.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use roqa_common::Sample;
use roqa_session::LoadTarget;

/// Errors from vector-file parsing.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("I/O error reading vector file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed vector at line {line}: {detail}")]
    Malformed { line: usize, detail: String },
}

/// One parsed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestVector {
    /// Load a register and expect nothing back.
    Load {
        target: LoadTarget,
        index: u8,
        value: Sample,
    },
    /// Push a quantized residual and compare the readback against
    /// `expected`.
    Sample {
        scale_factor: u8,
        residual: u8,
        expected: Sample,
    },
}

/// Parse vectors from a reader, one per line.
pub fn parse_vectors<R: BufRead>(reader: R) -> Result<Vec<TestVector>, VectorError> {
    let mut vectors = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        vectors.push(parse_line(trimmed, line_no)?);
    }
    Ok(vectors)
}

/// Load and parse a vector file.
pub fn load_vector_file(path: &Path) -> Result<Vec<TestVector>, VectorError> {
    let file = File::open(path)?;
    parse_vectors(BufReader::new(file))
}

fn parse_line(line: &str, line_no: usize) -> Result<TestVector, VectorError> {
    let malformed = |detail: String| VectorError::Malformed {
        line: line_no,
        detail,
    };

    if line.starts_with('h') || line.starts_with('w') {
        let target = if line.starts_with('w') {
            LoadTarget::Weight
        } else {
            LoadTarget::History
        };
        let fields: Vec<&str> = line[1..].split_whitespace().collect();
        if fields.len() != 2 {
            return Err(malformed(format!(
                "expected load index and value, got {:?}",
                line
            )));
        }
        let index: u8 = fields[0]
            .parse()
            .map_err(|_| malformed(format!("bad register index {:?}", fields[0])))?;
        if index > 3 {
            return Err(malformed(format!("register index {} out of range", index)));
        }
        let value: Sample = fields[1]
            .parse()
            .map_err(|_| malformed(format!("bad load value {:?}", fields[1])))?;
        return Ok(TestVector::Load {
            target,
            index,
            value,
        });
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(malformed(format!(
            "expected scale factor, residual and sample, got {:?}",
            line
        )));
    }
    let scale_factor: u8 = fields[0]
        .parse()
        .map_err(|_| malformed(format!("bad scale factor {:?}", fields[0])))?;
    if scale_factor > 15 {
        return Err(malformed(format!(
            "scale factor {} out of range",
            scale_factor
        )));
    }
    let residual: u8 = fields[1]
        .parse()
        .map_err(|_| malformed(format!("bad residual code {:?}", fields[1])))?;
    if residual > 7 {
        return Err(malformed(format!("residual code {} out of range", residual)));
    }
    let expected: Sample = fields[2]
        .parse()
        .map_err(|_| malformed(format!("bad expected sample {:?}", fields[2])))?;
    Ok(TestVector::Sample {
        scale_factor,
        residual,
        expected,
    })
}
