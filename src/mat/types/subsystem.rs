//! Decoded subsystem data.

use super::array::DataElement;

/// Shared auxiliary data stored in a file's subsystem region.
///
/// A read pass starts with an empty value. When the element at the header's
/// subsystem offset is reached it is parsed into a new value, which every
/// later element decode sees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubsystemData {
    elements: Vec<DataElement>,
    strings: Vec<String>,
    class_names: Vec<String>,
}

impl SubsystemData {
    pub fn new(elements: Vec<DataElement>, strings: Vec<String>, class_names: Vec<String>) -> Self {
        Self {
            elements,
            strings,
            class_names,
        }
    }

    /// True for the placeholder a read pass starts with.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements decoded from the subsystem payload, in order.
    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    /// The object metadata string table, if the payload carried one.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Class names of the objects described by the metadata, in class-id order.
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}
