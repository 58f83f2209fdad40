//! File format parsing layer for MAT files.
//!
//! This module provides the mid-level parsing layer that bridges between
//! raw file I/O and the high-level [`MatFile`](crate::mat::reader::MatFile).
//!
//! # Module Organization
//!
//! - [`header`]: Parses the 128-byte file header
//! - [`element`]: Decodes one tag+payload into a typed element
//! - [`raw`]: The top-level read loop with subsystem interception
//! - [`subsystem`]: Parses the subsystem data payload
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  Header         │ ← header::parse()
//! ├─────────────────┤
//! │  Element        │ ← raw::RawElementReader::read_all()
//! │  Element        │     └ element::Level5Decoder
//! │  ...            │
//! │  Subsystem data │ ← subsystem (at the header's offset)
//! └─────────────────┘
//! ```

pub mod element;
pub mod header;
pub mod raw;
pub mod subsystem;
