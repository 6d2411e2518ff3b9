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

//! Reading and writing the BIOM 2.1 format.
//!
//! BIOM 2.1 files are HDF5 files with the following layout:
//!
//! ```text
//! /                                  root attributes, see [BiomAttributes]
//! /observation/ids                   observation ids (variable length UTF-8)
//! /observation/matrix/data           non-zero values (f64), compressed by observation
//! /observation/matrix/indices        sample index of each value (i32)
//! /observation/matrix/indptr         offsets into data for each observation (i32)
//! /observation/metadata              (empty group)
//! /observation/group-metadata        (empty group)
//! /sample/ids                        sample ids (variable length UTF-8)
//! /sample/matrix/data                non-zero values (f64), compressed by sample
//! /sample/matrix/indices             observation index of each value (i32)
//! /sample/matrix/indptr              offsets into data for each sample (i32)
//! /sample/metadata                   (empty group)
//! /sample/group-metadata             (empty group)
//! ```
//!
//! The format is described at <http://biom-format.org/documentation/format_versions/biom-2.1.html>.
//!
//! Writing is handled by [write_biom](writer::write_biom) and reading by
//! [read_biom](reader::read_biom).
//!

pub mod reader;
pub mod writer;

pub const FORMAT_URL: &str = "http://biom-format.org";
pub const FORMAT_VERSION: [i64; 2] = [2, 1];
pub const DEFAULT_TABLE_ID: &str = "No Table ID";

pub const OBSERVATION: &str = "observation";
pub const SAMPLE: &str = "sample";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiomError {
    #[error("'{0}' cannot be stored as an HDF5 string")]
    InvalidString(String),

    #[error("unsupported BIOM format version {0}.{1}")]
    UnsupportedVersion(i64, i64),

    #[error("attribute '{name}' has {len} values, expected 2")]
    InvalidAttribute { name: String, len: usize },

    #[error("attribute 'shape' is ({rows}, {cols}) but the file has {n_observations} observation ids and {n_samples} sample ids")]
    ShapeMismatch { rows: i64, cols: i64, n_observations: usize, n_samples: usize },
}

/// Root attributes of a BIOM 2.1 file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BiomAttributes {
    /// Table identifier.
    pub id: String,
    /// Table type, eg. "OTU table". May be empty.
    pub table_type: String,
    pub format_url: String,
    /// Major and minor version.
    pub format_version: [i64; 2],
    /// Name of the tool that wrote the file.
    pub generated_by: String,
    /// Creation time in ISO 8601.
    pub creation_date: String,
    /// Number of observations and samples.
    pub shape: [i64; 2],
    /// Number of non-zero values.
    pub nnz: i64,
}

impl BiomAttributes {
    /// Attributes for a table with `shape` and `nnz` written now by `generated_by`.
    pub fn new(
        shape: (usize, usize),
        nnz: usize,
        generated_by: &str,
    ) -> Self {
        BiomAttributes {
            id: DEFAULT_TABLE_ID.to_string(),
            table_type: String::new(),
            format_url: FORMAT_URL.to_string(),
            format_version: FORMAT_VERSION,
            generated_by: generated_by.to_string(),
            creation_date: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            shape: [shape.0 as i64, shape.1 as i64],
            nnz: nnz as i64,
        }
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn new_attributes() {
        use super::BiomAttributes;

        let got = BiomAttributes::new((3, 2), 4, "picrust2_to_prmt");

        assert_eq!(got.id, "No Table ID");
        assert_eq!(got.table_type, "");
        assert_eq!(got.format_url, "http://biom-format.org");
        assert_eq!(got.format_version, [2, 1]);
        assert_eq!(got.generated_by, "picrust2_to_prmt");
        assert_eq!(got.shape, [3, 2]);
        assert_eq!(got.nnz, 4);
        assert!(chrono::NaiveDateTime::parse_from_str(&got.creation_date, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }
}
