//! Strict RLP field helpers shared by the transaction and output codecs.
//!
//! Every failure maps to [`PlasmaError::MalformedEncoding`] naming the field.

use rlp::{DecoderError, Rlp, RlpStream};

use plasma_types::{PlasmaError, Result};

pub(crate) fn rlp_error(field: &str, err: DecoderError) -> PlasmaError {
    PlasmaError::MalformedEncoding {
        reason: format!("{field}: {err}"),
    }
}

pub(crate) fn malformed(reason: impl Into<String>) -> PlasmaError {
    PlasmaError::MalformedEncoding {
        reason: reason.into(),
    }
}

/// Open `rlp` as a list with exactly `expected` items.
pub(crate) fn expect_list(rlp: &Rlp<'_>, field: &str, expected: usize) -> Result<()> {
    if !rlp.is_list() {
        return Err(malformed(format!("{field} must be an RLP list")));
    }
    let count = rlp.item_count().map_err(|e| rlp_error(field, e))?;
    if count != expected {
        return Err(malformed(format!(
            "{field} must have {expected} fields, got {count}"
        )));
    }
    Ok(())
}

/// Item `index` of a list.
pub(crate) fn item<'a>(rlp: &Rlp<'a>, index: usize, field: &str) -> Result<Rlp<'a>> {
    rlp.at(index).map_err(|e| rlp_error(field, e))
}

/// A byte-string item of exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(rlp: &Rlp<'_>, field: &str) -> Result<[u8; N]> {
    if !rlp.is_data() {
        return Err(malformed(format!("{field} must be a byte string")));
    }
    let data = rlp.data().map_err(|e| rlp_error(field, e))?;
    <[u8; N]>::try_from(data).map_err(|_| {
        malformed(format!("{field} must be {N} bytes, got {}", data.len()))
    })
}

/// A canonical big-endian unsigned integer: no leading zero bytes, zero is
/// the empty string.
pub(crate) fn decode_uint(rlp: &Rlp<'_>, field: &str) -> Result<u128> {
    if !rlp.is_data() {
        return Err(malformed(format!("{field} must be an integer")));
    }
    let data = rlp.data().map_err(|e| rlp_error(field, e))?;
    if data.first() == Some(&0) {
        return Err(malformed(format!("{field} has leading zero bytes")));
    }
    if data.len() > 16 {
        return Err(malformed(format!("{field} overflows 128 bits")));
    }
    Ok(data.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

pub(crate) fn decode_u32(rlp: &Rlp<'_>, field: &str) -> Result<u32> {
    u32::try_from(decode_uint(rlp, field)?)
        .map_err(|_| malformed(format!("{field} overflows 32 bits")))
}

pub(crate) fn decode_u64(rlp: &Rlp<'_>, field: &str) -> Result<u64> {
    u64::try_from(decode_uint(rlp, field)?)
        .map_err(|_| malformed(format!("{field} overflows 64 bits")))
}

/// Append `value` in its minimal big-endian form.
pub(crate) fn append_uint(stream: &mut RlpStream, value: u128) {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    stream.append(&bytes[skip..].to_vec());
}

pub(crate) fn append_bytes(stream: &mut RlpStream, bytes: &[u8]) {
    stream.append(&bytes.to_vec());
}
