// tsv2biom: Conversion of tab-separated feature tables to the BIOM format.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Opening input tables from disk.
//!
//! Plain text and gzip compressed (.tsv.gz) inputs are both accepted. The
//! compression is detected from the first bytes of the file, not from the file
//! extension.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;

type E = Box<dyn std::error::Error>;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns true if `bytes` start with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= GZIP_MAGIC.len() && bytes[0..2] == GZIP_MAGIC
}

/// Wrap `conn` in a gzip decoder if the stream is compressed.
///
/// Peeks at the buffered bytes without consuming them, so the returned reader
/// yields the full (decompressed) contents.
pub fn decompress_if_gzip<'a, R: Read + 'a>(
    conn: R,
) -> Result<Box<dyn Read + 'a>, E> {
    let mut reader = BufReader::new(conn);
    let compressed = is_gzip(reader.fill_buf()?);

    if compressed {
        log::info!("Input is gzip compressed");
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open the file at `path` for reading.
///
/// ## Errors
///
/// Returns the underlying [std::io::Error] if `path` does not exist or cannot
/// be read.
///
pub fn open_input(
    path: &Path,
) -> Result<Box<dyn Read>, E> {
    let f = File::open(path)?;
    decompress_if_gzip(f)
}
