//! In-memory builders for Level 5 MAT fixtures.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use mat_reader::Endian;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_DOUBLE: u32 = 9;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;

pub const MX_CELL: u8 = 1;
pub const MX_STRUCT: u8 = 2;
pub const MX_CHAR: u8 = 4;
pub const MX_SPARSE: u8 = 5;
pub const MX_DOUBLE: u8 = 6;
pub const MX_UINT8: u8 = 9;
pub const MX_OPAQUE: u8 = 17;

pub const FLAG_COMPLEX: u8 = 0x08;
pub const FLAG_GLOBAL: u8 = 0x04;
pub const FLAG_LOGICAL: u8 = 0x02;

pub const FIELD_NAME_LEN: usize = 32;

pub fn put_u16(out: &mut Vec<u8>, e: Endian, v: u16) {
    match e {
        Endian::Little => out.extend_from_slice(&v.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

pub fn put_u32(out: &mut Vec<u8>, e: Endian, v: u32) {
    match e {
        Endian::Little => out.extend_from_slice(&v.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

pub fn put_u64(out: &mut Vec<u8>, e: Endian, v: u64) {
    match e {
        Endian::Little => out.extend_from_slice(&v.to_le_bytes()),
        Endian::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

pub fn i32_bytes(e: Endian, values: &[i32]) -> Vec<u8> {
    let mut out = Vec::new();
    for &v in values {
        put_u32(&mut out, e, v as u32);
    }
    out
}

pub fn u16_bytes(e: Endian, values: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    for &v in values {
        put_u16(&mut out, e, v);
    }
    out
}

pub fn f64_bytes(e: Endian, values: &[f64]) -> Vec<u8> {
    let mut out = Vec::new();
    for &v in values {
        put_u64(&mut out, e, v.to_bits());
    }
    out
}

/// A 128-byte header.
pub fn header(e: Endian, text: &str, subsystem_offset: Option<u64>) -> Vec<u8> {
    let mut out = vec![b' '; 116];
    out[..text.len()].copy_from_slice(text.as_bytes());
    put_u64(&mut out, e, subsystem_offset.unwrap_or(0));
    put_u16(&mut out, e, 0x0100);
    out.extend_from_slice(match e {
        Endian::Little => b"IM",
        Endian::Big => b"MI",
    });
    out
}

/// A normal element: tag, payload, padding to 8 bytes.
pub fn element(e: Endian, data_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, e, data_type);
    put_u32(&mut out, e, payload.len() as u32);
    out.extend_from_slice(payload);
    out.resize(out.len() + (8 - payload.len() % 8) % 8, 0);
    out
}

/// A small element: size and type packed in one word, payload of at most 4 bytes.
pub fn small_element(e: Endian, data_type: u32, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 4);
    let mut out = Vec::new();
    put_u32(&mut out, e, ((payload.len() as u32) << 16) | data_type);
    out.extend_from_slice(payload);
    out.resize(8, 0);
    out
}

/// Wraps an encoded element in a zlib-compressed element.
pub fn compressed(e: Endian, inner: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(inner).unwrap();
    let payload = encoder.finish().unwrap();
    let mut out = Vec::new();
    put_u32(&mut out, e, MI_COMPRESSED);
    put_u32(&mut out, e, payload.len() as u32);
    out.extend_from_slice(&payload);
    out
}

/// The array flags sub-element.
pub fn flags(e: Endian, class: u8, bits: u8) -> Vec<u8> {
    let mut payload = Vec::new();
    put_u32(&mut payload, e, ((bits as u32) << 8) | class as u32);
    put_u32(&mut payload, e, 0);
    element(e, MI_UINT32, &payload)
}

/// A matrix element with flags, dimensions, name and the given body elements.
pub fn matrix(e: Endian, class: u8, bits: u8, dims: &[i32], name: &str, body: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = flags(e, class, bits);
    payload.extend(element(e, MI_INT32, &i32_bytes(e, dims)));
    payload.extend(element(e, MI_INT8, name.as_bytes()));
    for part in body {
        payload.extend_from_slice(part);
    }
    element(e, MI_MATRIX, &payload)
}

pub fn double_matrix(e: Endian, name: &str, dims: &[i32], values: &[f64]) -> Vec<u8> {
    matrix(e, MX_DOUBLE, 0, dims, name, &[element(e, MI_DOUBLE, &f64_bytes(e, values))])
}

pub fn scalar(e: Endian, value: f64) -> Vec<u8> {
    double_matrix(e, "", &[1, 1], &[value])
}

pub fn uint8_matrix(e: Endian, name: &str, bytes: &[u8]) -> Vec<u8> {
    matrix(
        e,
        MX_UINT8,
        0,
        &[1, bytes.len() as i32],
        name,
        &[element(e, MI_UINT8, bytes)],
    )
}

pub fn char_matrix(e: Endian, name: &str, text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    matrix(
        e,
        MX_CHAR,
        0,
        &[1, units.len() as i32],
        name,
        &[element(e, MI_UINT16, &u16_bytes(e, &units))],
    )
}

pub fn cell_matrix(e: Endian, name: &str, dims: &[i32], cells: &[Vec<u8>]) -> Vec<u8> {
    matrix(e, MX_CELL, 0, dims, name, cells)
}

/// Field-name length, packed names, then `values` in cell-major order.
pub fn struct_body(e: Endian, field_names: &[&str], values: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut names = Vec::new();
    for name in field_names {
        let mut padded = name.as_bytes().to_vec();
        padded.resize(FIELD_NAME_LEN, 0);
        names.extend(padded);
    }
    let mut body = vec![
        small_element(e, MI_INT32, &i32_bytes(e, &[FIELD_NAME_LEN as i32])),
        element(e, MI_INT8, &names),
    ];
    body.extend(values.iter().cloned());
    body
}

pub fn struct_matrix(
    e: Endian,
    name: &str,
    dims: &[i32],
    field_names: &[&str],
    values: &[Vec<u8>],
) -> Vec<u8> {
    matrix(e, MX_STRUCT, 0, dims, name, &struct_body(e, field_names, values))
}

/// An opaque object: flags, name, type system, class name, one nested matrix.
pub fn opaque_matrix(e: Endian, name: &str, type_system: &str, class_name: &str, data: Vec<u8>) -> Vec<u8> {
    let mut payload = flags(e, MX_OPAQUE, 0);
    payload.extend(element(e, MI_INT8, name.as_bytes()));
    payload.extend(element(e, MI_INT8, type_system.as_bytes()));
    payload.extend(element(e, MI_INT8, class_name.as_bytes()));
    payload.extend(data);
    element(e, MI_MATRIX, &payload)
}

/// Object metadata with the strings `Widget`, `Gadget`, `shapes` and the
/// classes `Widget` and `shapes.Gadget`.
pub fn object_metadata(e: Endian) -> Vec<u8> {
    let mut strings = b"Widget\0Gadget\0shapes\0".to_vec();
    strings.resize(24, 0);
    let classes_start = 40 + strings.len() as u32;
    let classes_end = classes_start + 48;

    let mut blob = Vec::new();
    put_u32(&mut blob, e, 2);
    put_u32(&mut blob, e, 3);
    put_u32(&mut blob, e, classes_start);
    for _ in 0..7 {
        put_u32(&mut blob, e, classes_end);
    }
    blob.extend(strings);
    for entry in [[0u32, 0, 0, 0], [0, 1, 0, 0], [3, 2, 0, 0]] {
        for word in entry {
            put_u32(&mut blob, e, word);
        }
    }
    blob
}

/// A subsystem payload: mini header, then a struct whose `MCOS` field wraps
/// the object metadata in a `FileWrapper__` object.
pub fn subsystem_payload(e: Endian) -> Vec<u8> {
    let metadata_cell = cell_matrix(e, "", &[1, 1], &[uint8_matrix(e, "", &object_metadata(e))]);
    let wrapper = opaque_matrix(e, "", "MCOS", "FileWrapper__", metadata_cell);
    let root = struct_matrix(e, "", &[1, 1], &["MCOS"], &[wrapper]);

    let mut payload = Vec::new();
    put_u16(&mut payload, e, 0x0100);
    payload.extend_from_slice(match e {
        Endian::Little => b"IM",
        Endian::Big => b"MI",
    });
    payload.extend_from_slice(&[0, 0, 0, 0]);
    payload.extend(root);
    payload
}

/// Concatenates a header and elements into a file image. When
/// `subsystem_index` is set, that element's offset goes into the header.
pub fn mat_file(e: Endian, elements: &[Vec<u8>], subsystem_index: Option<usize>) -> Vec<u8> {
    let mut offset = 128u64;
    let mut subsystem_offset = None;
    for (i, element) in elements.iter().enumerate() {
        if Some(i) == subsystem_index {
            subsystem_offset = Some(offset);
        }
        offset += element.len() as u64;
    }
    let mut out = header(e, "MATLAB 5.0 MAT-file, test fixture", subsystem_offset);
    for element in elements {
        out.extend_from_slice(element);
    }
    out
}

/// Offsets each element would start at when placed after the header.
pub fn element_offsets(elements: &[Vec<u8>]) -> Vec<u64> {
    let mut offsets = Vec::new();
    let mut offset = 128u64;
    for element in elements {
        offsets.push(offset);
        offset += element.len() as u64;
    }
    offsets
}
