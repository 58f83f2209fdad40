//! Codec layer for compressed payloads.
//!
//! # Submodules
//!
//! - [`compression`][]: zlib inflation for `miCOMPRESSED` elements

pub mod compression;
