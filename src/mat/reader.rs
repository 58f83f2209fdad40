use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, info};

use super::format;
use super::format::raw::{RawElementReader, RawVariable};
use super::types::array::{DataElement, MatArray};
use super::types::error::Result;
use super::types::models::MatHeader;
use super::types::subsystem::SubsystemData;

/// A named top-level array.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub array: MatArray,
    pub is_global: bool,
}

/// A fully read Level 5 MAT file.
#[derive(Debug, Clone)]
pub struct MatFile {
    header: MatHeader,
    variables: Vec<Variable>,
    subsystem: SubsystemData,
}

impl MatFile {
    /// Read a MAT file from the given path.
    ///
    /// # Errors
    /// Returns an error if:
    /// - File cannot be opened
    /// - The header is invalid or not Level 5
    /// - Any element is malformed or truncated
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening MAT file: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a MAT file from a stream positioned at its first header byte.
    ///
    /// Element offsets are taken from the stream's own position, so the
    /// header must start at position 0 for the subsystem offset to match.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let header = format::header::parse(&mut reader)?;

        let raw_reader = RawElementReader::level5(header.endian);
        let (raw_variables, subsystem) = raw_reader.read_all(&mut reader, header.subsystem_offset)?;
        let variables = assemble_variables(raw_variables);

        info!(
            "MAT file read: {} variables, {} object classes",
            variables.len(),
            subsystem.class_names().len()
        );

        Ok(Self {
            header,
            variables,
            subsystem,
        })
    }

    pub fn header(&self) -> &MatHeader {
        &self.header
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// First variable with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn subsystem(&self) -> &SubsystemData {
        &self.subsystem
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn into_variables(self) -> Vec<Variable> {
        self.variables
    }
}

/// Keeps the matrices, which carry a name and flags; anything else at the
/// top level is skipped.
fn assemble_variables(raw_variables: Vec<RawVariable>) -> Vec<Variable> {
    raw_variables
        .into_iter()
        .filter_map(|raw| match raw.element {
            DataElement::Matrix(array) => Some(Variable {
                name: array.name.clone(),
                is_global: array.is_global(),
                array,
            }),
            DataElement::Numeric(data) => {
                debug!("Skipping bare {:?} element at offset {}", data.data_type(), raw.offset);
                None
            }
            DataElement::Text(_) => {
                debug!("Skipping bare text element at offset {}", raw.offset);
                None
            }
        })
        .collect()
}
