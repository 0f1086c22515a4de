//! Minimal ABI word readers.
//!
//! Calldata is decoded positionally, one 32-byte word at a time, with strict checks on
//! padding so that a dirty high-order byte is rejected rather than silently dropped.

use alloy_primitives::{Address, FixedBytes, Selector, U256};

use crate::errors::DecodeError;

pub const WORD: usize = 32;

pub fn read_selector(bytes: &[u8], i: &mut usize) -> Result<Selector, DecodeError> {
    if bytes.len() < *i + 4 {
        return Err(DecodeError::Truncated);
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&bytes[*i..*i + 4]);
    *i += 4;
    Ok(FixedBytes(sel))
}

pub fn read_b32(bytes: &[u8], i: &mut usize) -> Result<FixedBytes<32>, DecodeError> {
    if bytes.len() < *i + WORD {
        return Err(DecodeError::Truncated);
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[*i..*i + WORD]);
    *i += WORD;
    Ok(FixedBytes(buf))
}

pub fn read_u256(bytes: &[u8], i: &mut usize) -> Result<U256, DecodeError> {
    let word = read_b32(bytes, i)?;
    Ok(U256::from_be_bytes(word.0))
}

/// Read an unsigned word that must fit in `bits` bits (`uint24`, `uint48`, ...).
pub fn read_uint(bytes: &[u8], i: &mut usize, bits: usize) -> Result<U256, DecodeError> {
    let value = read_u256(bytes, i)?;
    if bits < 256 && value.bit_len() > bits {
        return Err(DecodeError::OutOfRange { bits });
    }
    Ok(value)
}

/// Read a left-padded address word; the 12 padding bytes must be zero.
pub fn read_address(bytes: &[u8], i: &mut usize) -> Result<Address, DecodeError> {
    let word = read_b32(bytes, i)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(DecodeError::DirtyAddress);
    }
    Ok(Address::from_slice(&word[12..]))
}

/// Reject anything left over once a fixed layout has been read.
pub fn expect_end(bytes: &[u8], i: usize) -> Result<(), DecodeError> {
    if i != bytes.len() {
        return Err(DecodeError::TrailingBytes {
            expected: i,
            actual: bytes.len(),
        });
    }
    Ok(())
}
