//! Core MAT file reader module

pub mod codec;
pub mod format;
pub mod reader;
pub mod types;
mod utils;

pub use reader::{MatFile, Variable};
pub use types::error::{MatError, Result};
