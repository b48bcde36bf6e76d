//! Primitive field encodings for snapshot interchange
//!
//! Big-endian integers, length-prefixed UTF-8 strings (length -1 encodes
//! a null string), and length-prefixed arrays. Every length prefix is
//! bounded so a corrupt or hostile stream cannot request an absurd
//! allocation. The field order of a full snapshot sits one level up, in
//! [`crate::interchange`].

use std::io::{self, Read, Write};

use thiserror::Error;
use types::trade::TradeLineError;

/// Hard cap on any single length prefix.
pub const MAX_FIELD_LEN: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("negative length prefix {0}")]
    NegativeLength(i32),

    #[error("length prefix {0} exceeds the {MAX_FIELD_LEN} byte limit")]
    OversizedField(u64),

    #[error("string field is not valid utf-8")]
    InvalidUtf8,

    #[error("snapshot covers {found} members, this replica's roster has {expected}")]
    RosterMismatch { expected: usize, found: usize },

    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),

    #[error("bad trade line: {0}")]
    TradeLine(#[from] TradeLineError),
}

pub fn write_i32(w: &mut impl Write, value: i32) -> Result<(), InterchangeError> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_i32(r: &mut impl Read) -> Result<i32, InterchangeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

pub fn write_i64(w: &mut impl Write, value: i64) -> Result<(), InterchangeError> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_i64(r: &mut impl Read) -> Result<i64, InterchangeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

/// Writes a length prefix the reader will accept.
pub fn write_len(w: &mut impl Write, len: usize) -> Result<(), InterchangeError> {
    if len > MAX_FIELD_LEN {
        return Err(InterchangeError::OversizedField(len as u64));
    }
    write_i32(w, len as i32)
}

/// Reads a non-negative, bounded length prefix.
pub fn read_len(r: &mut impl Read) -> Result<usize, InterchangeError> {
    let len = read_i32(r)?;
    if len < 0 {
        return Err(InterchangeError::NegativeLength(len));
    }
    if len as usize > MAX_FIELD_LEN {
        return Err(InterchangeError::OversizedField(len as u64));
    }
    Ok(len as usize)
}

pub fn write_string(w: &mut impl Write, value: &str) -> Result<(), InterchangeError> {
    write_len(w, value.len())?;
    w.write_all(value.as_bytes())?;
    Ok(())
}

pub fn read_string(r: &mut impl Read) -> Result<String, InterchangeError> {
    let len = read_len(r)?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| InterchangeError::InvalidUtf8)
}

/// Writes a possibly-null string. Null is the length prefix -1 with no
/// payload bytes.
pub fn write_opt_string(w: &mut impl Write, value: Option<&str>) -> Result<(), InterchangeError> {
    match value {
        Some(s) => write_string(w, s),
        None => write_i32(w, -1),
    }
}

pub fn read_opt_string(r: &mut impl Read) -> Result<Option<String>, InterchangeError> {
    let len = read_i32(r)?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 {
        return Err(InterchangeError::NegativeLength(len));
    }
    if len as usize > MAX_FIELD_LEN {
        return Err(InterchangeError::OversizedField(len as u64));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| InterchangeError::InvalidUtf8)
}

pub fn write_string_array(w: &mut impl Write, values: &[String]) -> Result<(), InterchangeError> {
    write_len(w, values.len())?;
    for value in values {
        write_string(w, value)?;
    }
    Ok(())
}

pub fn read_string_array(r: &mut impl Read) -> Result<Vec<String>, InterchangeError> {
    let count = read_len(r)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(read_string(r)?);
    }
    Ok(values)
}

pub fn write_i64_array(w: &mut impl Write, values: &[i64]) -> Result<(), InterchangeError> {
    write_len(w, values.len())?;
    for value in values {
        write_i64(w, *value)?;
    }
    Ok(())
}

pub fn read_i64_array(r: &mut impl Read) -> Result<Vec<i64>, InterchangeError> {
    let count = read_len(r)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(read_i64(r)?);
    }
    Ok(values)
}

pub fn write_byte_array(w: &mut impl Write, bytes: &[u8]) -> Result<(), InterchangeError> {
    write_len(w, bytes.len())?;
    w.write_all(bytes)?;
    Ok(())
}

pub fn read_byte_array(r: &mut impl Read) -> Result<Vec<u8>, InterchangeError> {
    let len = read_len(r)?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}
