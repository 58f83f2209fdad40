//! Structure arrays: multi-dimensional arrays of records.
//!
//! Storage is column-oriented. Each field owns one sequence of values,
//! all sequences have one entry per cell, and cells are addressed by the
//! column-major flattened index of their coordinate.
//!
//! ```
//! use indexmap::IndexMap;
//! use mat_reader::{MatArray, StructureArray};
//!
//! let mut fields = IndexMap::new();
//! fields.insert("a".to_string(), vec![MatArray::scalar(1.0), MatArray::scalar(2.0)]);
//! let array = StructureArray::new(vec![2, 1], fields)?;
//!
//! let cell = array.get_cell(&[1, 0])?;
//! assert_eq!(cell["a"].as_scalar_f64(), Some(2.0));
//! # Ok::<(), mat_reader::MatError>(())
//! ```

use std::ops::Index;

use indexmap::IndexMap;

use super::array::MatArray;
use super::error::{MatError, Result};
use super::models::Dimensions;

/// A multi-dimensional array whose cells are records of named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureArray {
    dimensions: Dimensions,
    fields: IndexMap<String, Vec<MatArray>>,
}

impl StructureArray {
    /// Builds a structure array from per-field value sequences.
    ///
    /// # Errors
    /// `InvalidStructure` if any sequence length differs from the product
    /// of `dimensions`.
    pub fn new(
        dimensions: impl Into<Dimensions>,
        fields: IndexMap<String, Vec<MatArray>>,
    ) -> Result<Self> {
        let dimensions = dimensions.into();
        let expected = dimensions.num_elements();
        if let Some((field, values)) = fields.iter().find(|(_, values)| values.len() != expected) {
            return Err(MatError::InvalidStructure {
                field: field.clone(),
                expected,
                found: values.len(),
            });
        }
        Ok(Self { dimensions, fields })
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Number of cells.
    pub fn num_elements(&self) -> usize {
        self.dimensions.num_elements()
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the value of `field` in the cell at `index`.
    pub fn get_field_value(&self, field: &str, index: &[usize]) -> Result<&MatArray> {
        let values = self
            .fields
            .get(field)
            .ok_or_else(|| MatError::FieldNotFound(field.to_string()))?;
        let flat = self.dimensions.flatten(index)?;
        values.get(flat).ok_or(MatError::IndexOutOfBounds {
            index: flat,
            bound: values.len(),
        })
    }

    /// Replaces the value of `field` in the cell at `index`.
    ///
    /// Neither the field set nor any sequence length changes.
    pub fn set_field_value(&mut self, field: &str, index: &[usize], value: MatArray) -> Result<()> {
        let flat = self.dimensions.flatten(index)?;
        let values = self
            .fields
            .get_mut(field)
            .ok_or_else(|| MatError::FieldNotFound(field.to_string()))?;
        let bound = values.len();
        let slot = values
            .get_mut(flat)
            .ok_or(MatError::IndexOutOfBounds { index: flat, bound })?;
        *slot = value;
        Ok(())
    }

    /// A read-only view of the record at `index`.
    ///
    /// Field lookups on the view are resolved against this array when they
    /// happen; nothing is copied here.
    pub fn get_cell(&self, index: &[usize]) -> Result<StructureElement<'_>> {
        let flat = self.dimensions.flatten(index)?;
        Ok(StructureElement {
            parent: self,
            index: flat,
        })
    }

    /// Whole-record replacement is not offered; use
    /// [`set_field_value`](Self::set_field_value) once per field.
    pub fn set_cell(&mut self, _index: &[usize], _record: IndexMap<String, MatArray>) -> Result<()> {
        Err(MatError::UnsupportedOperation(
            "cannot set a whole structure cell; use set_field_value per field",
        ))
    }

    /// Bulk access to every record at once is not offered; iterate
    /// [`cells`](Self::cells) or use [`get_cell`](Self::get_cell).
    pub fn data(&self) -> Result<Vec<IndexMap<String, MatArray>>> {
        Err(MatError::UnsupportedOperation(
            "bulk record access is not supported; use get_cell",
        ))
    }

    /// Views of every cell, in flattened order.
    pub fn cells(&self) -> impl Iterator<Item = StructureElement<'_>> + '_ {
        (0..self.num_elements()).map(move |index| StructureElement { parent: self, index })
    }

    /// All values of one field, in flattened cell order.
    pub fn field_values(&self, field: &str) -> Result<&[MatArray]> {
        self.fields
            .get(field)
            .map(Vec::as_slice)
            .ok_or_else(|| MatError::FieldNotFound(field.to_string()))
    }
}

/// One record of a [`StructureArray`], borrowed from its parent.
///
/// Missing-field behaviour: [`get`](Self::get) returns `FieldNotFound`,
/// [`try_get`](Self::try_get) returns `None`, and `element["name"]`
/// panics like `HashMap` indexing does.
#[derive(Debug, Clone, Copy)]
pub struct StructureElement<'a> {
    parent: &'a StructureArray,
    index: usize,
}

impl<'a> StructureElement<'a> {
    /// Flattened index of this cell in its parent.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.parent.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.fields.is_empty()
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.parent.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Result<&'a MatArray> {
        let values = self
            .parent
            .fields
            .get(field)
            .ok_or_else(|| MatError::FieldNotFound(field.to_string()))?;
        values.get(self.index).ok_or(MatError::IndexOutOfBounds {
            index: self.index,
            bound: values.len(),
        })
    }

    pub fn try_get(&self, field: &str) -> Option<&'a MatArray> {
        self.parent
            .fields
            .get(field)
            .and_then(|values| values.get(self.index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.parent.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &'a MatArray> + 'a {
        let index = self.index;
        self.parent.fields.values().filter_map(move |values| values.get(index))
    }

    /// `(field, value)` pairs in the parent's field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a MatArray)> + 'a {
        let index = self.index;
        self.parent
            .fields
            .iter()
            .filter_map(move |(name, values)| values.get(index).map(|value| (name.as_str(), value)))
    }
}

impl<'a> Index<&str> for StructureElement<'a> {
    type Output = MatArray;

    fn index(&self, field: &str) -> &MatArray {
        match self.get(field) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }
}
