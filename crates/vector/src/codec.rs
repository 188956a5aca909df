//! Binary layout of vector columns
//!
//! A vector of declared dimension `D` is stored as exactly `D * 8` bytes:
//! each element an IEEE-754 `f64`, little-endian, in input order. There is
//! no header, no length prefix and no padding. A payload of any other length
//! is corrupt and is never truncated or padded into shape.

use byteorder::{ByteOrder, LittleEndian};
use strata_core::{Error, Result};

/// Bytes per stored element
pub const BYTES_PER_ELEMENT: usize = std::mem::size_of::<f64>();

/// Stored byte length of a vector with `dimension` elements
pub const fn encoded_len(dimension: usize) -> usize {
    dimension * BYTES_PER_ELEMENT
}

/// Check that `vector` has exactly `dimension` elements
pub fn check_dimension(vector: &[f64], dimension: usize) -> Result<()> {
    if vector.len() != dimension {
        return Err(Error::DimensionMismatch {
            expected: dimension,
            got: vector.len(),
        });
    }
    Ok(())
}

/// Encode a vector into its stored byte form
///
/// # Errors
///
/// Returns `DimensionMismatch` if `vector.len() != dimension`.
pub fn encode(vector: &[f64], dimension: usize) -> Result<Vec<u8>> {
    check_dimension(vector, dimension)?;
    let mut buf = vec![0u8; encoded_len(dimension)];
    LittleEndian::write_f64_into(vector, &mut buf);
    Ok(buf)
}

/// Decode a stored byte payload
///
/// # Errors
///
/// Returns `CorruptVector` if the payload is not exactly `dimension * 8`
/// bytes (which covers lengths that are not a multiple of 8).
pub fn decode(bytes: &[u8], dimension: usize) -> Result<Vec<f64>> {
    let expected = encoded_len(dimension);
    if bytes.len() != expected {
        return Err(Error::CorruptVector {
            len: bytes.len(),
            expected,
        });
    }
    let mut out = vec![0.0f64; dimension];
    LittleEndian::read_f64_into(bytes, &mut out);
    Ok(out)
}
