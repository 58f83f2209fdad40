//! Decoded array values.
//!
//! [`DataElement`] is what the element decoder yields for one tag+payload.
//! Matrices become [`MatArray`]s, whose content is an [`ArrayValue`] chosen
//! by the array class.

use std::fmt;

use super::error::{MatError, Result};
use super::models::{ArrayClass, ArrayFlags, DataType, Dimensions};
use super::structure::StructureArray;

/// A flat run of numbers, kept in the element's storage type.
///
/// The storage type can be narrower than the array class (writers are free
/// to store a double array as `miUINT8` when every value fits).
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Single(Vec<f32>),
    Double(Vec<f64>),
}

impl NumericData {
    pub fn len(&self) -> usize {
        match self {
            NumericData::Int8(v) => v.len(),
            NumericData::UInt8(v) => v.len(),
            NumericData::Int16(v) => v.len(),
            NumericData::UInt16(v) => v.len(),
            NumericData::Int32(v) => v.len(),
            NumericData::UInt32(v) => v.len(),
            NumericData::Int64(v) => v.len(),
            NumericData::UInt64(v) => v.len(),
            NumericData::Single(v) => v.len(),
            NumericData::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The tag data type these values were stored with.
    pub fn data_type(&self) -> DataType {
        match self {
            NumericData::Int8(_) => DataType::Int8,
            NumericData::UInt8(_) => DataType::UInt8,
            NumericData::Int16(_) => DataType::Int16,
            NumericData::UInt16(_) => DataType::UInt16,
            NumericData::Int32(_) => DataType::Int32,
            NumericData::UInt32(_) => DataType::UInt32,
            NumericData::Int64(_) => DataType::Int64,
            NumericData::UInt64(_) => DataType::UInt64,
            NumericData::Single(_) => DataType::Single,
            NumericData::Double(_) => DataType::Double,
        }
    }

    /// Widens every value to `f64`. 64-bit integers beyond 2^53 lose precision.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            NumericData::Int8(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::UInt8(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::Int16(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::UInt16(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::UInt32(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::UInt64(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::Single(v) => v.iter().map(|&x| x as f64).collect(),
            NumericData::Double(v) => v.clone(),
        }
    }

    /// Raw bytes, for `UInt8` storage only.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            NumericData::UInt8(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets integer values as non-negative indices or counts.
    pub(crate) fn to_indices(&self) -> Result<Vec<usize>> {
        match self {
            NumericData::Int8(v) => checked_indices(v),
            NumericData::UInt8(v) => checked_indices(v),
            NumericData::Int16(v) => checked_indices(v),
            NumericData::UInt16(v) => checked_indices(v),
            NumericData::Int32(v) => checked_indices(v),
            NumericData::UInt32(v) => checked_indices(v),
            NumericData::Int64(v) => checked_indices(v),
            NumericData::UInt64(v) => checked_indices(v),
            NumericData::Single(_) | NumericData::Double(_) => Err(MatError::malformed(format!(
                "Expected integer data, found {:?}",
                self.data_type()
            ))),
        }
    }
}

fn checked_indices<T>(values: &[T]) -> Result<Vec<usize>>
where
    T: Copy + fmt::Display,
    usize: TryFrom<T>,
{
    values
        .iter()
        .map(|&x| {
            usize::try_from(x)
                .map_err(|_| MatError::malformed(format!("Negative or oversized index: {}", x)))
        })
        .collect()
}

/// One decoded top-level or nested data element.
#[derive(Debug, Clone, PartialEq)]
pub enum DataElement {
    Numeric(NumericData),
    /// Text from a `miUTF8`, `miUTF16` or `miUTF32` element.
    Text(String),
    Matrix(MatArray),
}

impl DataElement {
    pub fn as_matrix(&self) -> Option<&MatArray> {
        match self {
            DataElement::Matrix(array) => Some(array),
            _ => None,
        }
    }

    pub fn into_matrix(self) -> Option<MatArray> {
        match self {
            DataElement::Matrix(array) => Some(array),
            _ => None,
        }
    }

    /// The element's payload as raw bytes, if it is a byte array.
    ///
    /// Accepts both a bare `miUINT8` element and a real `uint8` matrix,
    /// which is how subsystem data is normally stored.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DataElement::Numeric(data) => data.as_bytes(),
            DataElement::Matrix(MatArray {
                value: ArrayValue::Numeric { real, imag: None },
                ..
            }) => real.as_bytes(),
            _ => None,
        }
    }
}

/// Class-specific content of a matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Numeric {
        real: NumericData,
        imag: Option<NumericData>,
    },
    /// Characters in storage (column-major) order.
    Char(String),
    Cell(Vec<MatArray>),
    Struct(StructureArray),
    Object {
        class_name: String,
        fields: StructureArray,
    },
    Sparse {
        row_indices: Vec<usize>,
        column_starts: Vec<usize>,
        real: NumericData,
        imag: Option<NumericData>,
    },
    Opaque {
        type_system: String,
        class_name: String,
        data: Box<MatArray>,
    },
}

/// A named, typed, multi-dimensional array decoded from a matrix element.
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    /// Variable name; empty for arrays nested inside cells and structs.
    pub name: String,
    pub flags: ArrayFlags,
    pub dimensions: Dimensions,
    pub value: ArrayValue,
}

impl MatArray {
    /// An unnamed 0x0 double array, which is what an empty matrix element decodes to.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            flags: ArrayFlags::new(ArrayClass::Double),
            dimensions: Dimensions::new(vec![0, 0]),
            value: ArrayValue::Numeric {
                real: NumericData::Double(Vec::new()),
                imag: None,
            },
        }
    }

    /// An unnamed 1x1 double array.
    pub fn scalar(value: f64) -> Self {
        Self::from_doubles(vec![1, 1], vec![value])
    }

    /// An unnamed real double array with the given shape.
    pub fn from_doubles(dims: Vec<usize>, values: Vec<f64>) -> Self {
        Self {
            name: String::new(),
            flags: ArrayFlags::new(ArrayClass::Double),
            dimensions: Dimensions::new(dims),
            value: ArrayValue::Numeric {
                real: NumericData::Double(values),
                imag: None,
            },
        }
    }

    pub fn class(&self) -> ArrayClass {
        self.flags.class
    }

    pub fn is_global(&self) -> bool {
        self.flags.global
    }

    pub fn is_logical(&self) -> bool {
        self.flags.logical
    }

    pub fn is_complex(&self) -> bool {
        self.flags.complex
    }

    pub fn num_elements(&self) -> usize {
        self.dimensions.num_elements()
    }

    /// The record container of a struct or object array.
    pub fn as_structure(&self) -> Option<&StructureArray> {
        match &self.value {
            ArrayValue::Struct(fields) | ArrayValue::Object { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut StructureArray> {
        match &mut self.value {
            ArrayValue::Struct(fields) | ArrayValue::Object { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn as_cells(&self) -> Option<&[MatArray]> {
        match &self.value {
            ArrayValue::Cell(cells) => Some(cells),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            ArrayValue::Char(text) => Some(text),
            _ => None,
        }
    }

    /// Real part of a numeric array.
    pub fn as_numeric(&self) -> Option<&NumericData> {
        match &self.value {
            ArrayValue::Numeric { real, .. } => Some(real),
            _ => None,
        }
    }

    /// The single real value of a 1x1 numeric array.
    pub fn as_scalar_f64(&self) -> Option<f64> {
        match self.as_numeric() {
            Some(real) if real.len() == 1 => real.to_f64().first().copied(),
            _ => None,
        }
    }
}
