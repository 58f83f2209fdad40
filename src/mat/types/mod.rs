//! Foundational data structures and error types.

pub mod array;
pub mod error;
pub mod models;
pub mod structure;
pub mod subsystem;
