//! # Raw Element Read Loop
//!
//! Walks the element sequence that follows the file header, collecting
//! every decoded element together with the byte offset it started at.
//!
//! One element is special. The header names the absolute offset of the
//! subsystem data, which is encoded like any other byte array and can only
//! be told apart by where it sits. The element found at that offset is
//! parsed into [`SubsystemData`] and is not returned as a variable. Elements
//! decoded after it see the parsed value; elements before it see whatever
//! the pass held at the time (normally nothing).

use std::io::{Read, Seek};

use log::{debug, info, trace};

use crate::mat::types::array::DataElement;
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::Endian;
use crate::mat::types::subsystem::SubsystemData;

use super::element::{ElementDecoder, Level5Decoder};

/// One emitted element and the absolute offset of its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub offset: u64,
    pub element: DataElement,
}

/// Parses the payload of the subsystem data element.
pub trait SubsystemParser {
    /// `previous` is the subsystem data known so far in the pass, since the
    /// payload may itself refer to it.
    fn parse_subsystem(&self, bytes: &[u8], previous: &SubsystemData) -> Result<SubsystemData>;
}

impl<T: SubsystemParser> SubsystemParser for &T {
    fn parse_subsystem(&self, bytes: &[u8], previous: &SubsystemData) -> Result<SubsystemData> {
        (**self).parse_subsystem(bytes, previous)
    }
}

/// Sequential reader over a file's top-level elements.
#[derive(Debug, Clone)]
pub struct RawElementReader<D, P> {
    decoder: D,
    parser: P,
}

impl RawElementReader<Level5Decoder, Level5Decoder> {
    /// A reader using the Level 5 decoder for both elements and subsystem data.
    pub fn level5(endian: Endian) -> Self {
        let decoder = Level5Decoder::new(endian);
        Self::new(decoder, decoder)
    }
}

impl<D: ElementDecoder, P: SubsystemParser> RawElementReader<D, P> {
    pub fn new(decoder: D, parser: P) -> Self {
        Self { decoder, parser }
    }

    /// Reads elements until the stream ends.
    ///
    /// `subsystem_offset` is the absolute offset from the file header, or
    /// `None` when the file has no subsystem data.
    ///
    /// # Errors
    /// Any decode failure other than a clean end of stream aborts the pass;
    /// elements read before the failure are discarded with it. An element
    /// at `subsystem_offset` that is not a byte array is malformed.
    pub fn read_all<R: Read + Seek>(
        &self,
        reader: &mut R,
        subsystem_offset: Option<u64>,
    ) -> Result<(Vec<RawVariable>, SubsystemData)> {
        let mut variables = Vec::new();
        let mut subsystem = SubsystemData::default();

        loop {
            let position = reader.stream_position()?;
            let element = match self.decoder.read_element(reader, &subsystem) {
                Ok(element) => element,
                Err(MatError::EndOfStream) => break,
                Err(e) => return Err(e),
            };

            if Some(position) == subsystem_offset {
                let bytes = element.as_bytes().ok_or_else(|| {
                    MatError::malformed(format!(
                        "Element at subsystem offset {} is not a byte array",
                        position
                    ))
                })?;
                debug!("Parsing subsystem data at offset {} ({} bytes)", position, bytes.len());
                subsystem = self.parser.parse_subsystem(bytes, &subsystem)?;
            } else {
                trace!("Element at offset {}", position);
                variables.push(RawVariable {
                    offset: position,
                    element,
                });
            }
        }

        info!(
            "Read {} raw elements (subsystem data {})",
            variables.len(),
            if subsystem.is_empty() { "absent" } else { "present" }
        );
        Ok((variables, subsystem))
    }
}
