//! # Subsystem Data Parsing
//!
//! The subsystem payload is a small embedded element stream:
//! ```text
//! [2 bytes] Version
//! [2 bytes] Endianness indicator ("IM" / "MI")
//! [4 bytes] Padding
//! [...]     Data elements, decoded like top-level ones
//! ```
//! When the first element is a struct whose `MCOS` field holds a
//! `FileWrapper__` object, the first cell of that object is a metadata blob
//! describing the file's objects:
//! ```text
//! [4 bytes]  Version
//! [4 bytes]  Number of strings
//! [32 bytes] Eight section offsets
//! [...]      NUL-terminated strings, up to section 0
//! [section 0 .. section 1] Class entries, 4 words each:
//!            package name index, class name index, reserved, reserved
//! ```
//! String indices are 1-based; the first class entry is reserved.

use std::io::Cursor;

use log::{debug, trace};

use crate::mat::types::array::{ArrayValue, DataElement};
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::Endian;
use crate::mat::types::subsystem::SubsystemData;

use super::element::{ElementDecoder, Level5Decoder};
use super::raw::SubsystemParser;

const PAYLOAD_HEADER_LEN: usize = 8;
const METADATA_HEADER_LEN: usize = 40;
const CLASS_ENTRY_LEN: usize = 16;

impl SubsystemParser for Level5Decoder {
    fn parse_subsystem(&self, bytes: &[u8], previous: &SubsystemData) -> Result<SubsystemData> {
        if bytes.len() < PAYLOAD_HEADER_LEN {
            return Err(MatError::malformed(format!(
                "Subsystem payload of {} bytes has no header",
                bytes.len()
            )));
        }
        let endian = Endian::from_indicator([bytes[2], bytes[3]]).ok_or_else(|| {
            MatError::malformed("Subsystem payload has an unknown endianness indicator")
        })?;
        let decoder = Level5Decoder::new(endian);

        let mut cursor = Cursor::new(&bytes[PAYLOAD_HEADER_LEN..]);
        let mut elements = Vec::new();
        loop {
            match decoder.read_element(&mut cursor, previous) {
                Ok(element) => elements.push(element),
                Err(MatError::EndOfStream) => break,
                Err(e) => return Err(e),
            }
        }
        debug!("Subsystem payload holds {} elements", elements.len());

        let (strings, class_names) = match object_metadata(&elements) {
            Some(blob) => parse_object_metadata(blob, endian)?,
            None => (Vec::new(), Vec::new()),
        };

        Ok(SubsystemData::new(elements, strings, class_names))
    }
}

/// Locates the metadata blob: `MCOS` field → `FileWrapper__` object → first cell.
fn object_metadata(elements: &[DataElement]) -> Option<&[u8]> {
    let root = elements.first()?.as_matrix()?.as_structure()?;
    let mcos = root.field_values("MCOS").ok()?.first()?;
    let wrapped = match &mcos.value {
        ArrayValue::Opaque {
            class_name, data, ..
        } if class_name == "FileWrapper__" => data,
        _ => return None,
    };
    wrapped.as_cells()?.first()?.as_numeric()?.as_bytes()
}

/// Returns the string table and the class names it defines.
fn parse_object_metadata(blob: &[u8], endian: Endian) -> Result<(Vec<String>, Vec<String>)> {
    if blob.len() < METADATA_HEADER_LEN {
        return Err(MatError::malformed(format!(
            "Object metadata of {} bytes is shorter than its header",
            blob.len()
        )));
    }
    let num_strings = endian.read_u32(&blob[4..8]) as usize;
    let offsets: Vec<usize> = blob[8..METADATA_HEADER_LEN]
        .chunks_exact(4)
        .map(|word| endian.read_u32(word) as usize)
        .collect();
    trace!("Object metadata: {} strings, sections at {:?}", num_strings, offsets);

    let string_region = blob
        .get(METADATA_HEADER_LEN..offsets[0])
        .ok_or_else(|| MatError::malformed("Object metadata string table out of range"))?;
    let strings: Vec<String> = string_region
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .take(num_strings)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    if strings.len() != num_strings {
        return Err(MatError::malformed(format!(
            "Object metadata declares {} strings, found {}",
            num_strings,
            strings.len()
        )));
    }

    let class_region = blob
        .get(offsets[0]..offsets[1])
        .ok_or_else(|| MatError::malformed("Object metadata class table out of range"))?;
    let mut class_names = Vec::new();
    for entry in class_region.chunks_exact(CLASS_ENTRY_LEN).skip(1) {
        let package = endian.read_u32(&entry[0..4]);
        let class = lookup(&strings, endian.read_u32(&entry[4..8]))?;
        let name = if package == 0 {
            class.to_string()
        } else {
            format!("{}.{}", lookup(&strings, package)?, class)
        };
        class_names.push(name);
    }
    debug!("Object metadata defines classes {:?}", class_names);

    Ok((strings, class_names))
}

fn lookup(strings: &[String], index: u32) -> Result<&str> {
    (index as usize)
        .checked_sub(1)
        .and_then(|i| strings.get(i))
        .map(String::as_str)
        .ok_or_else(|| MatError::malformed(format!("String index {} out of range", index)))
}
