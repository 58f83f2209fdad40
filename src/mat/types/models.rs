//! Core data structures for MAT file format components.
//!
//! This module defines the fundamental types used throughout the library:
//! - File header and byte order
//! - Element data types and array classes
//! - Array flags and dimensions

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{MatError, Result};

/// Size in bytes of the Level 5 file header.
pub const HEADER_LEN: u64 = 128;

/// Byte order of a MAT file, taken from the header's two-byte indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Interprets the endianness indicator. `IM` marks a little-endian
    /// writer, `MI` a big-endian one.
    pub fn from_indicator(indicator: [u8; 2]) -> Option<Self> {
        match &indicator {
            b"IM" => Some(Self::Little),
            b"MI" => Some(Self::Big),
            _ => None,
        }
    }

    pub fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    pub fn read_u64(self, buf: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(buf),
            Endian::Big => BigEndian::read_u64(buf),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little-endian"),
            Endian::Big => write!(f, "big-endian"),
        }
    }
}

/// Parsed 128-byte Level 5 file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatHeader {
    /// Descriptive text, trailing spaces and NULs removed.
    pub text: String,
    /// Absolute offset of the subsystem data element, if the file has one.
    pub subsystem_offset: Option<u64>,
    pub version: u16,
    pub endian: Endian,
}

/// Data types that may appear in an element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Single = 7,
    Double = 9,
    Int64 = 12,
    UInt64 = 13,
    Matrix = 14,
    Compressed = 15,
    Utf8 = 16,
    Utf16 = 17,
    Utf32 = 18,
}

impl DataType {
    /// Size in bytes of one value of this type, or `None` for container types.
    pub fn value_size(self) -> Option<usize> {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Utf8 => Some(1),
            DataType::Int16 | DataType::UInt16 | DataType::Utf16 => Some(2),
            DataType::Int32 | DataType::UInt32 | DataType::Single | DataType::Utf32 => Some(4),
            DataType::Double | DataType::Int64 | DataType::UInt64 => Some(8),
            DataType::Matrix | DataType::Compressed => None,
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = MatError;
    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Int8),
            2 => Ok(Self::UInt8),
            3 => Ok(Self::Int16),
            4 => Ok(Self::UInt16),
            5 => Ok(Self::Int32),
            6 => Ok(Self::UInt32),
            7 => Ok(Self::Single),
            9 => Ok(Self::Double),
            12 => Ok(Self::Int64),
            13 => Ok(Self::UInt64),
            14 => Ok(Self::Matrix),
            15 => Ok(Self::Compressed),
            16 => Ok(Self::Utf8),
            17 => Ok(Self::Utf16),
            18 => Ok(Self::Utf32),
            _ => Err(MatError::malformed(format!("Unknown data type: {}", value))),
        }
    }
}

/// Array classes carried in the array flags sub-element of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayClass {
    Cell = 1,
    Struct = 2,
    Object = 3,
    Char = 4,
    Sparse = 5,
    Double = 6,
    Single = 7,
    Int8 = 8,
    UInt8 = 9,
    Int16 = 10,
    UInt16 = 11,
    Int32 = 12,
    UInt32 = 13,
    Int64 = 14,
    UInt64 = 15,
    Opaque = 17,
}

impl ArrayClass {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ArrayClass::Double
                | ArrayClass::Single
                | ArrayClass::Int8
                | ArrayClass::UInt8
                | ArrayClass::Int16
                | ArrayClass::UInt16
                | ArrayClass::Int32
                | ArrayClass::UInt32
                | ArrayClass::Int64
                | ArrayClass::UInt64
        )
    }
}

impl TryFrom<u8> for ArrayClass {
    type Error = MatError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Cell),
            2 => Ok(Self::Struct),
            3 => Ok(Self::Object),
            4 => Ok(Self::Char),
            5 => Ok(Self::Sparse),
            6 => Ok(Self::Double),
            7 => Ok(Self::Single),
            8 => Ok(Self::Int8),
            9 => Ok(Self::UInt8),
            10 => Ok(Self::Int16),
            11 => Ok(Self::UInt16),
            12 => Ok(Self::Int32),
            13 => Ok(Self::UInt32),
            14 => Ok(Self::Int64),
            15 => Ok(Self::UInt64),
            17 => Ok(Self::Opaque),
            _ => Err(MatError::malformed(format!("Unknown array class: {}", value))),
        }
    }
}

impl fmt::Display for ArrayClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ArrayClass::Cell => "cell",
            ArrayClass::Struct => "struct",
            ArrayClass::Object => "object",
            ArrayClass::Char => "char",
            ArrayClass::Sparse => "sparse",
            ArrayClass::Double => "double",
            ArrayClass::Single => "single",
            ArrayClass::Int8 => "int8",
            ArrayClass::UInt8 => "uint8",
            ArrayClass::Int16 => "int16",
            ArrayClass::UInt16 => "uint16",
            ArrayClass::Int32 => "int32",
            ArrayClass::UInt32 => "uint32",
            ArrayClass::Int64 => "int64",
            ArrayClass::UInt64 => "uint64",
            ArrayClass::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Array flags sub-element of a matrix.
///
/// The first word packs the class into its low byte and the flag bits into
/// the next byte:
/// - Bit 0x08: complex
/// - Bit 0x04: global
/// - Bit 0x02: logical
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayFlags {
    pub class: ArrayClass,
    pub complex: bool,
    pub global: bool,
    pub logical: bool,
    /// Maximum number of non-zero elements; only meaningful for sparse arrays.
    pub nzmax: u32,
}

impl ArrayFlags {
    const COMPLEX: u8 = 0x08;
    const GLOBAL: u8 = 0x04;
    const LOGICAL: u8 = 0x02;

    pub fn new(class: ArrayClass) -> Self {
        Self {
            class,
            complex: false,
            global: false,
            logical: false,
            nzmax: 0,
        }
    }

    /// Unpacks the two words of the array flags sub-element.
    pub fn from_words(flags_word: u32, nzmax: u32) -> Result<Self> {
        let class = ArrayClass::try_from((flags_word & 0xFF) as u8)?;
        let bits = ((flags_word >> 8) & 0xFF) as u8;
        Ok(Self {
            class,
            complex: bits & Self::COMPLEX != 0,
            global: bits & Self::GLOBAL != 0,
            logical: bits & Self::LOGICAL != 0,
            nzmax,
        })
    }
}

/// Shape of a multi-dimensional array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dimensions(Vec<usize>);

impl Dimensions {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements: the product of all sizes.
    pub fn num_elements(&self) -> usize {
        self.0.iter().product()
    }

    /// Like [`num_elements`](Self::num_elements), but `None` when the
    /// product does not fit in a `usize`.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Column-major flattening of `index` against these dimensions.
    pub fn flatten(&self, index: &[usize]) -> Result<usize> {
        flatten(&self.0, index)
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        f.write_str(&parts.join("x"))
    }
}

/// Converts a multi-dimensional coordinate into a linear offset.
///
/// The first dimension varies fastest, matching the on-disk storage order:
/// `offset = i0 + d0 * (i1 + d1 * (i2 + ...))`.
///
/// # Errors
/// `IndexOutOfBounds` if the coordinate has a different arity than `dims`
/// or any component is not below its dimension.
pub fn flatten(dims: &[usize], index: &[usize]) -> Result<usize> {
    if index.len() != dims.len() {
        return Err(MatError::IndexOutOfBounds {
            index: index.len(),
            bound: dims.len(),
        });
    }

    let mut offset = 0;
    let mut stride = 1;
    for (&i, &d) in index.iter().zip(dims) {
        if i >= d {
            return Err(MatError::IndexOutOfBounds { index: i, bound: d });
        }
        offset += i * stride;
        stride *= d;
    }
    Ok(offset)
}
