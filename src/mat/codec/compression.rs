//! Decompression of `miCOMPRESSED` elements.
//!
//! Level 5 files written with compression wrap each top-level element in a
//! zlib stream. The inflated bytes hold exactly one ordinary element.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::trace;

use crate::mat::types::error::{MatError, Result};

/// Inflates a zlib payload into `output`, replacing its contents.
pub fn inflate_into(output: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
    output.clear();
    trace!("Inflating zlib payload: {} bytes", payload.len());
    let mut decoder = ZlibDecoder::new(payload);
    decoder
        .read_to_end(output)
        .map_err(|e| MatError::DecompressionError(format!("Zlib decompression failed: {}", e)))?;
    trace!("Inflated to {} bytes", output.len());
    Ok(())
}

/// Inflates a zlib payload into a fresh buffer.
pub fn inflate(payload: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(payload.len() * 2);
    inflate_into(&mut output, payload)?;
    Ok(output)
}
