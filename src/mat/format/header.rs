//! MAT file header parsing.
//!
//! # Header Structure
//! ```text
//! [116 bytes] Descriptive text
//! [8 bytes]   Subsystem data offset (file byte order)
//! [2 bytes]   Version, 0x0100 for Level 5 (file byte order)
//! [2 bytes]   Endianness indicator: "IM" little-endian, "MI" big-endian
//! ```

use std::io::{ErrorKind, Read};

use log::{info, trace};

use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{Endian, MatHeader, HEADER_LEN};
use crate::mat::utils;

/// The only version this reader understands.
pub const LEVEL5_VERSION: u16 = 0x0100;

/// Offset values that mean "no subsystem data": unset, or padded with spaces.
const NO_SUBSYSTEM: [u64; 2] = [0, 0x2020_2020_2020_2020];

/// Parses the header from the start of a MAT file.
pub fn parse<R: Read>(file: &mut R) -> Result<MatHeader> {
    info!("Parsing MAT file header");

    let mut bytes = [0u8; HEADER_LEN as usize];
    file.read_exact(&mut bytes).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            MatError::InvalidHeader(format!("File is shorter than the {}-byte header", HEADER_LEN))
        }
        _ => MatError::Io(e),
    })?;

    let header = parse_bytes(&bytes)?;
    info!(
        "Header parsed: version={:#06x}, {}, subsystem offset={:?}",
        header.version, header.endian, header.subsystem_offset
    );
    Ok(header)
}

/// Parses an in-memory header block.
pub fn parse_bytes(bytes: &[u8; HEADER_LEN as usize]) -> Result<MatHeader> {
    let endian = Endian::from_indicator([bytes[126], bytes[127]]).ok_or_else(|| {
        MatError::InvalidHeader(format!(
            "Unknown endianness indicator: {:?}",
            String::from_utf8_lossy(&bytes[126..128])
        ))
    })?;
    trace!("Endianness indicator: {}", endian);

    let version = endian.read_u16(&bytes[124..126]);
    if version != LEVEL5_VERSION {
        return Err(MatError::UnsupportedVersion(version));
    }

    let raw_offset = endian.read_u64(&bytes[116..124]);
    let subsystem_offset = if NO_SUBSYSTEM.contains(&raw_offset) {
        None
    } else {
        Some(raw_offset)
    };

    let text = utils::c_string(&bytes[..116])
        .trim_end_matches(&[' ', '\0'][..])
        .to_string();

    Ok(MatHeader {
        text,
        subsystem_offset,
        version,
        endian,
    })
}
