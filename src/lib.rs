//! # mat-reader
//!
//! A reader for Level 5 MATLAB MAT files (v5, v6 and v7, including
//! zlib-compressed elements).
//!
//! **Note:** HDF5-based v7.3 files are not supported.
pub mod mat;

// Re-export the main types for convenience
pub use mat::{
    format::{
        element::{ElementDecoder, Level5Decoder},
        raw::{RawElementReader, RawVariable, SubsystemParser},
    },
    types::{
        array::{ArrayValue, DataElement, MatArray, NumericData},
        models::{flatten, ArrayClass, ArrayFlags, DataType, Dimensions, Endian, MatHeader},
        structure::{StructureArray, StructureElement},
        subsystem::SubsystemData,
    },
    MatError, MatFile, Result, Variable,
};
