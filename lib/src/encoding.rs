use sha2::{Digest, Sha256};
use crate::error::EncodingError;
use crate::types::H256;

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Maximum encoded size of a u64 varint.
const MAX_VARINT_LEN: usize = 10;

/// Append an unsigned little-endian base-128 varint to `buf`.
pub fn write_uvarint(buf: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        buf.push((n as u8) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

/// Encode a u64 as an unsigned varint.
pub fn encode_uvarint(n: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    write_uvarint(&mut buf, n);
    buf
}

/// Decode an unsigned varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed. Rejects varints
/// running past 10 bytes, values overflowing u64, and truncated input.
pub fn decode_uvarint(data: &[u8]) -> Result<(u64, usize), EncodingError> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(EncodingError::Overlong);
        }
        if byte < 0x80 {
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(EncodingError::Overflow);
            }
            return Ok((value | (byte as u64) << (7 * i), i + 1));
        }
        value |= ((byte & 0x7f) as u64) << (7 * i);
    }
    Err(EncodingError::Truncated)
}

/// Append a length-delimited byte string (`uvarint(len) || bytes`) to `buf`.
pub fn write_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_uvarint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// Encode a byte string with its canonical varint length prefix.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN + data.len());
    write_bytes(&mut buf, data);
    buf
}

/// Decode a length-delimited byte string from the front of `data`.
///
/// Returns the payload and the number of bytes consumed, including the
/// prefix. A declared length running past the input is an error.
pub fn decode_bytes(data: &[u8]) -> Result<(Vec<u8>, usize), EncodingError> {
    let (len, prefix) = decode_uvarint(data)?;
    let remaining = data.len() - prefix;
    if len > remaining as u64 {
        return Err(EncodingError::Length { len, remaining });
    }
    let len = len as usize;
    Ok((data[prefix..prefix + len].to_vec(), prefix + len))
}
