//! Low-level byte reading utilities

use std::io::{ErrorKind, Read};

use encoding_rs::{UTF_16BE, UTF_16LE};

use super::types::error::{MatError, Result};
use super::types::models::Endian;

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Returns how many bytes were read, so callers can tell a clean end
/// (zero bytes) from a truncated read.
pub fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Number of padding bytes that follow a payload of `len` bytes.
pub fn padding(len: usize) -> usize {
    (8 - len % 8) % 8
}

/// Decode bytes up to the first NUL as (lossy) UTF-8.
pub fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Decode UTF-16 code units in the file's byte order.
pub fn decode_utf16(bytes: &[u8], endian: Endian) -> String {
    let encoding = match endian {
        Endian::Little => UTF_16LE,
        Endian::Big => UTF_16BE,
    };
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Decode UTF-32 code points in the file's byte order.
pub fn decode_utf32(bytes: &[u8], endian: Endian) -> Result<String> {
    if bytes.len() % 4 != 0 {
        return Err(MatError::malformed(format!(
            "UTF-32 payload of {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }
    bytes
        .chunks_exact(4)
        .map(|unit| {
            let code = endian.read_u32(unit);
            char::from_u32(code)
                .ok_or_else(|| MatError::malformed(format!("Invalid code point: {:#x}", code)))
        })
        .collect()
}
