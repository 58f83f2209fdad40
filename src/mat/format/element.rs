//! # Data Element Decoding
//!
//! Turns one tag+payload from the stream into a [`DataElement`].
//!
//! ## Tag layout
//! ```text
//! normal:  [4 bytes] data type  [4 bytes] payload size  [N bytes] payload  [pad to 8]
//! small:   [2 bytes] payload size  [2 bytes] data type  [4 bytes] payload (size <= 4)
//! ```
//! A tag is small when the upper 16 bits of its first word are non-zero.
//! `miCOMPRESSED` payloads are not padded.
//!
//! ## Matrix layout
//! A `miMATRIX` payload is itself a run of elements: array flags,
//! dimensions, name, then class-specific content. Opaque objects have no
//! dimensions element; their name is followed by a type-system name, a
//! class name and one nested matrix.

use std::io::{Cursor, Read, Seek};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use indexmap::IndexMap;
use log::{debug, trace};

use crate::mat::codec::compression;
use crate::mat::types::array::{ArrayValue, DataElement, MatArray, NumericData};
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{ArrayClass, ArrayFlags, DataType, Dimensions, Endian};
use crate::mat::types::structure::StructureArray;
use crate::mat::types::subsystem::SubsystemData;
use crate::mat::utils;

/// Decodes one top-level element from a stream.
///
/// Implementations must report a stream that ends exactly on an element
/// boundary as [`MatError::EndOfStream`], and every other failure as some
/// other error.
pub trait ElementDecoder {
    fn read_element<R: Read + Seek>(
        &self,
        reader: &mut R,
        subsystem: &SubsystemData,
    ) -> Result<DataElement>;
}

impl<T: ElementDecoder> ElementDecoder for &T {
    fn read_element<R: Read + Seek>(
        &self,
        reader: &mut R,
        subsystem: &SubsystemData,
    ) -> Result<DataElement> {
        (**self).read_element(reader, subsystem)
    }
}

/// The Level 5 element decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level5Decoder {
    endian: Endian,
}

impl Level5Decoder {
    pub fn new(endian: Endian) -> Self {
        Self { endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Decodes a payload whose tag has already been read.
    pub fn decode_payload(
        &self,
        data_type: DataType,
        payload: &[u8],
        subsystem: &SubsystemData,
    ) -> Result<DataElement> {
        match data_type {
            DataType::Matrix => Ok(DataElement::Matrix(self.decode_matrix(payload, subsystem)?)),
            DataType::Compressed => {
                let inflated = compression::inflate(payload)?;
                debug!(
                    "Compressed element: {} bytes inflated to {}",
                    payload.len(),
                    inflated.len()
                );
                let mut cursor = Cursor::new(inflated.as_slice());
                match self.read_element(&mut cursor, subsystem) {
                    Err(MatError::EndOfStream) => {
                        Err(MatError::malformed("Compressed element inflated to nothing"))
                    }
                    other => other,
                }
            }
            DataType::Utf8 => Ok(DataElement::Text(String::from_utf8_lossy(payload).into_owned())),
            DataType::Utf16 => Ok(DataElement::Text(utils::decode_utf16(payload, self.endian))),
            DataType::Utf32 => Ok(DataElement::Text(utils::decode_utf32(payload, self.endian)?)),
            _ => Ok(DataElement::Numeric(self.decode_numeric(data_type, payload)?)),
        }
    }

    fn decode_numeric(&self, data_type: DataType, payload: &[u8]) -> Result<NumericData> {
        match self.endian {
            Endian::Little => numeric_from_bytes::<LittleEndian>(data_type, payload),
            Endian::Big => numeric_from_bytes::<BigEndian>(data_type, payload),
        }
    }

    /// Decodes the payload of a `miMATRIX` element. An empty payload is an
    /// empty array.
    fn decode_matrix(&self, payload: &[u8], subsystem: &SubsystemData) -> Result<MatArray> {
        if payload.is_empty() {
            return Ok(MatArray::empty());
        }

        let mut parts = SubElements::new(payload, self.endian);

        let (_, flags_bytes) = parts.expect("array flags")?;
        if flags_bytes.len() < 8 {
            return Err(MatError::malformed(format!(
                "Array flags element too short: {} bytes",
                flags_bytes.len()
            )));
        }
        let flags = ArrayFlags::from_words(
            self.endian.read_u32(&flags_bytes[0..4]),
            self.endian.read_u32(&flags_bytes[4..8]),
        )?;

        if flags.class == ArrayClass::Opaque {
            return self.decode_opaque(flags, &mut parts, subsystem);
        }

        let (dims_type, dims_bytes) = parts.expect("dimensions")?;
        let dimensions = Dimensions::new(self.decode_numeric(dims_type, dims_bytes)?.to_indices()?);
        let num_cells = dimensions.checked_num_elements().ok_or_else(|| {
            MatError::malformed(format!("Dimension product overflows: {}", dimensions))
        })?;
        let name = self.expect_text(&mut parts, "array name")?;
        trace!("Matrix '{}': class={}, dims={}", name, flags.class, dimensions);

        let value = match flags.class {
            class if class.is_numeric() => {
                let real = self.expect_numeric(&mut parts, "real part")?;
                let imag = if flags.complex {
                    Some(self.expect_numeric(&mut parts, "imaginary part")?)
                } else {
                    None
                };
                ArrayValue::Numeric { real, imag }
            }
            ArrayClass::Char => {
                let text = match parts.next()? {
                    Some((data_type, bytes)) => self.char_text(data_type, bytes)?,
                    None => String::new(),
                };
                ArrayValue::Char(text)
            }
            ArrayClass::Cell => {
                parts.check_nested(num_cells, "cell")?;
                let cells = (0..num_cells)
                    .map(|_| self.expect_matrix(&mut parts, subsystem))
                    .collect::<Result<Vec<_>>>()?;
                ArrayValue::Cell(cells)
            }
            ArrayClass::Struct => {
                ArrayValue::Struct(self.decode_fields(&mut parts, &dimensions, num_cells, subsystem)?)
            }
            ArrayClass::Object => {
                let class_name = self.expect_text(&mut parts, "object class name")?;
                let fields = self.decode_fields(&mut parts, &dimensions, num_cells, subsystem)?;
                ArrayValue::Object { class_name, fields }
            }
            ArrayClass::Sparse => {
                let (ir_type, ir_bytes) = parts.expect("sparse row indices")?;
                let row_indices = self.decode_numeric(ir_type, ir_bytes)?.to_indices()?;
                let (jc_type, jc_bytes) = parts.expect("sparse column starts")?;
                let column_starts = self.decode_numeric(jc_type, jc_bytes)?.to_indices()?;
                let real = self.expect_numeric(&mut parts, "sparse real part")?;
                let imag = if flags.complex {
                    Some(self.expect_numeric(&mut parts, "sparse imaginary part")?)
                } else {
                    None
                };
                ArrayValue::Sparse {
                    row_indices,
                    column_starts,
                    real,
                    imag,
                }
            }
            other => {
                return Err(MatError::malformed(format!(
                    "Array class {} not expected here",
                    other
                )))
            }
        };

        Ok(MatArray {
            name,
            flags,
            dimensions,
            value,
        })
    }

    fn decode_opaque(
        &self,
        flags: ArrayFlags,
        parts: &mut SubElements<'_>,
        subsystem: &SubsystemData,
    ) -> Result<MatArray> {
        let name = self.expect_text(parts, "opaque name")?;
        let type_system = self.expect_text(parts, "opaque type system")?;
        let class_name = self.expect_text(parts, "opaque class name")?;
        if subsystem.is_empty() {
            debug!(
                "Opaque '{}' ({}::{}) decoded before subsystem data",
                name, type_system, class_name
            );
        }
        let data = self.expect_matrix(parts, subsystem)?;
        Ok(MatArray {
            name,
            flags,
            dimensions: Dimensions::new(vec![1, 1]),
            value: ArrayValue::Opaque {
                type_system,
                class_name,
                data: Box::new(data),
            },
        })
    }

    /// Field-name length, packed field names, then one matrix per
    /// (cell, field) pair with the field index varying fastest.
    fn decode_fields(
        &self,
        parts: &mut SubElements<'_>,
        dimensions: &Dimensions,
        num_cells: usize,
        subsystem: &SubsystemData,
    ) -> Result<StructureArray> {
        let (len_type, len_bytes) = parts.expect("field name length")?;
        let name_len = self
            .decode_numeric(len_type, len_bytes)?
            .to_indices()?
            .first()
            .copied()
            .ok_or_else(|| MatError::malformed("Empty field name length element"))?;

        let (_, names_bytes) = parts.expect("field names")?;
        let names: Vec<String> = if name_len == 0 {
            if !names_bytes.is_empty() {
                return Err(MatError::malformed("Field names present with zero name length"));
            }
            Vec::new()
        } else {
            if names_bytes.len() % name_len != 0 {
                return Err(MatError::malformed(format!(
                    "Field names block of {} bytes is not a multiple of {}",
                    names_bytes.len(),
                    name_len
                )));
            }
            names_bytes.chunks(name_len).map(utils::c_string).collect()
        };

        let num_values = num_cells.checked_mul(names.len()).ok_or_else(|| {
            MatError::malformed(format!("Struct value count overflows: {}", dimensions))
        })?;
        parts.check_nested(num_values, "struct")?;

        let mut fields: IndexMap<String, Vec<MatArray>> = names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(num_cells)))
            .collect();
        if fields.len() != names.len() {
            return Err(MatError::malformed(format!("Duplicate field names: {:?}", names)));
        }

        if !fields.is_empty() {
            for _ in 0..num_cells {
                for values in fields.values_mut() {
                    values.push(self.expect_matrix(parts, subsystem)?);
                }
            }
        }

        StructureArray::new(dimensions.clone(), fields)
    }

    fn expect_matrix(&self, parts: &mut SubElements<'_>, subsystem: &SubsystemData) -> Result<MatArray> {
        match parts.expect("nested matrix")? {
            (DataType::Matrix, bytes) => self.decode_matrix(bytes, subsystem),
            (DataType::Compressed, bytes) => self
                .decode_payload(DataType::Compressed, bytes, subsystem)?
                .into_matrix()
                .ok_or_else(|| MatError::malformed("Compressed nested element is not a matrix")),
            (other, _) => Err(MatError::malformed(format!(
                "Expected nested matrix, found {:?}",
                other
            ))),
        }
    }

    fn expect_numeric(&self, parts: &mut SubElements<'_>, what: &str) -> Result<NumericData> {
        let (data_type, bytes) = parts.expect(what)?;
        self.decode_numeric(data_type, bytes)
    }

    fn expect_text(&self, parts: &mut SubElements<'_>, what: &str) -> Result<String> {
        let (_, bytes) = parts.expect(what)?;
        Ok(utils::c_string(bytes))
    }

    fn char_text(&self, data_type: DataType, bytes: &[u8]) -> Result<String> {
        match data_type {
            DataType::Int8 | DataType::UInt8 | DataType::Utf8 => {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            DataType::UInt16 | DataType::Int16 | DataType::Utf16 => {
                Ok(utils::decode_utf16(bytes, self.endian))
            }
            DataType::UInt32 | DataType::Int32 | DataType::Utf32 => {
                utils::decode_utf32(bytes, self.endian)
            }
            other => Err(MatError::malformed(format!(
                "Unsupported character data type: {:?}",
                other
            ))),
        }
    }
}

impl ElementDecoder for Level5Decoder {
    fn read_element<R: Read + Seek>(
        &self,
        reader: &mut R,
        subsystem: &SubsystemData,
    ) -> Result<DataElement> {
        let mut tag = [0u8; 8];
        let filled = utils::read_fully(reader, &mut tag)?;
        if filled == 0 {
            return Err(MatError::EndOfStream);
        }
        if filled < tag.len() {
            return Err(MatError::malformed(format!(
                "Truncated element tag: {} of 8 bytes",
                filled
            )));
        }

        let first = self.endian.read_u32(&tag[0..4]);
        if first >> 16 != 0 {
            let data_type = DataType::try_from(first & 0xFFFF)?;
            let size = (first >> 16) as usize;
            if size > 4 {
                return Err(MatError::malformed(format!(
                    "Small element declares {} bytes",
                    size
                )));
            }
            trace!("Small element: type={:?}, size={}", data_type, size);
            return self.decode_payload(data_type, &tag[4..4 + size], subsystem);
        }

        let data_type = DataType::try_from(first)?;
        let size = self.endian.read_u32(&tag[4..8]) as usize;
        trace!("Element: type={:?}, size={}", data_type, size);

        // The declared size is untrusted; only allocate what the stream delivers.
        let mut payload = Vec::new();
        reader.by_ref().take(size as u64).read_to_end(&mut payload)?;
        if payload.len() < size {
            return Err(MatError::malformed(format!(
                "Truncated {:?} payload: expected {} bytes, found {}",
                data_type,
                size,
                payload.len()
            )));
        }

        if data_type != DataType::Compressed {
            let mut pad = [0u8; 8];
            let pad_len = utils::padding(size);
            if utils::read_fully(reader, &mut pad[..pad_len])? < pad_len {
                return Err(MatError::malformed("Truncated element padding"));
            }
        }

        self.decode_payload(data_type, &payload, subsystem)
    }
}

/// Walks the sub-elements packed inside a matrix payload.
struct SubElements<'a> {
    data: &'a [u8],
    endian: Endian,
}

impl<'a> SubElements<'a> {
    fn new(data: &'a [u8], endian: Endian) -> Self {
        Self { data, endian }
    }

    /// Next `(data type, payload)` pair, or `None` when the payload is used up.
    fn next(&mut self) -> Result<Option<(DataType, &'a [u8])>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        if self.data.len() < 8 {
            return Err(MatError::malformed(format!(
                "Truncated sub-element tag: {} bytes left",
                self.data.len()
            )));
        }

        let first = self.endian.read_u32(&self.data[0..4]);
        if first >> 16 != 0 {
            let data_type = DataType::try_from(first & 0xFFFF)?;
            let size = (first >> 16) as usize;
            if size > 4 {
                return Err(MatError::malformed(format!(
                    "Small sub-element declares {} bytes",
                    size
                )));
            }
            let payload = &self.data[4..4 + size];
            self.data = &self.data[8..];
            return Ok(Some((data_type, payload)));
        }

        let data_type = DataType::try_from(first)?;
        let size = self.endian.read_u32(&self.data[4..8]) as usize;
        let end = 8 + size;
        if end > self.data.len() {
            return Err(MatError::malformed(format!(
                "Sub-element of {} bytes overruns matrix ({} bytes left)",
                size,
                self.data.len() - 8
            )));
        }
        let payload = &self.data[8..end];
        let advance = if data_type == DataType::Compressed {
            end
        } else {
            (end + utils::padding(size)).min(self.data.len())
        };
        self.data = &self.data[advance..];
        Ok(Some((data_type, payload)))
    }

    /// Every nested matrix needs at least its 8-byte tag, so `count` of them
    /// cannot fit in fewer than `count * 8` remaining bytes.
    fn check_nested(&self, count: usize, what: &str) -> Result<()> {
        if count > self.data.len() / 8 {
            return Err(MatError::malformed(format!(
                "{} declares {} nested values but only {} bytes remain",
                what,
                count,
                self.data.len()
            )));
        }
        Ok(())
    }

    fn expect(&mut self, what: &str) -> Result<(DataType, &'a [u8])> {
        self.next()?
            .ok_or_else(|| MatError::malformed(format!("Matrix ended before {}", what)))
    }
}

fn numeric_from_bytes<B: ByteOrder>(data_type: DataType, bytes: &[u8]) -> Result<NumericData> {
    let size = data_type
        .value_size()
        .filter(|_| !matches!(data_type, DataType::Utf8 | DataType::Utf16 | DataType::Utf32))
        .ok_or_else(|| MatError::malformed(format!("{:?} is not a numeric data type", data_type)))?;
    if bytes.len() % size != 0 {
        return Err(MatError::malformed(format!(
            "{} bytes is not a whole number of {:?} values",
            bytes.len(),
            data_type
        )));
    }
    let count = bytes.len() / size;

    let data = match data_type {
        DataType::Int8 => NumericData::Int8(bytes.iter().map(|&b| b as i8).collect()),
        DataType::UInt8 => NumericData::UInt8(bytes.to_vec()),
        DataType::Int16 => {
            let mut values = vec![0i16; count];
            B::read_i16_into(bytes, &mut values);
            NumericData::Int16(values)
        }
        DataType::UInt16 => {
            let mut values = vec![0u16; count];
            B::read_u16_into(bytes, &mut values);
            NumericData::UInt16(values)
        }
        DataType::Int32 => {
            let mut values = vec![0i32; count];
            B::read_i32_into(bytes, &mut values);
            NumericData::Int32(values)
        }
        DataType::UInt32 => {
            let mut values = vec![0u32; count];
            B::read_u32_into(bytes, &mut values);
            NumericData::UInt32(values)
        }
        DataType::Int64 => {
            let mut values = vec![0i64; count];
            B::read_i64_into(bytes, &mut values);
            NumericData::Int64(values)
        }
        DataType::UInt64 => {
            let mut values = vec![0u64; count];
            B::read_u64_into(bytes, &mut values);
            NumericData::UInt64(values)
        }
        DataType::Single => {
            let mut values = vec![0f32; count];
            B::read_f32_into(bytes, &mut values);
            NumericData::Single(values)
        }
        DataType::Double => {
            let mut values = vec![0f64; count];
            B::read_f64_into(bytes, &mut values);
            NumericData::Double(values)
        }
        other => {
            return Err(MatError::malformed(format!(
                "{:?} is not a numeric data type",
                other
            )))
        }
    };
    Ok(data)
}
