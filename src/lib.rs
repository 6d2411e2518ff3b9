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

//! tsv2biom is a library and a command-line client for converting wide
//! tab-separated feature tables into the
//! [BIOM 2.1](http://biom-format.org/documentation/format_versions/biom-2.1.html)
//! format.
//!
//! The input table has one row per feature (OTU, ASV, gene family, ...) and one
//! column per sample:
//!
//! ```text
//! FeatureID	S1	S2
//! OTU1	5	0
//! OTU2	NA	3
//! ```
//!
//! Cells that are not numbers (`NA`, empty cells, text) are stored as zero.
//! The input may be gzip compressed.
//!
//! ## Usage
//!
//! ### Command line
//!
//! ```text
//! tsv2biom --input table.tsv --output table.biom
//! ```
//!
//! Prints `Wrote BIOM: table.biom` on success. Add `--verbose` to log progress
//! to stderr.
//!
//! ### Rust API
//!
//! [convert_tsv_to_biom] performs the whole conversion between two paths. The
//! steps are also available separately:
//!
//!   - [read_tsv](tsv::read_tsv): parse a table from any [Read](std::io::Read) into a [Table](table::Table).
//!   - [write_biom](biom::writer::write_biom): write a [Table](table::Table) to a BIOM file.
//!   - [read_biom](biom::reader::read_biom): read a BIOM file back into a [Table](table::Table).
//!
//! ## File format
//!
//! Output files follow the BIOM 2.1 HDF5 layout, see [biom]. The matrix is
//! stored both by observation and by sample with zeros omitted. Observation
//! and sample metadata are left empty.
//!

use std::path::Path;

use crate::table::Table;

pub mod biom;
pub mod input;
pub mod table;
pub mod tsv;

type E = Box<dyn std::error::Error>;

/// Value of the `generated-by` attribute in files written by the CLI.
pub const GENERATED_BY: &str = "picrust2_to_prmt";

/// Read a feature table from the file at `path`.
///
/// Gzip compressed files are decompressed on the fly.
pub fn read_table(
    path: &Path,
) -> Result<Table, E> {
    let conn = input::open_input(path)?;
    tsv::read_tsv(conn)
}

/// Convert the tab-separated feature table at `input` to a BIOM file at `output`.
///
/// The input is read completely before `output` is created, so nothing is
/// written if the input cannot be read or parsed.
///
/// Returns the table that was written.
///
/// ## Errors
///
/// Returns an error if `input` cannot be read or is malformed (see
/// [read_tsv](tsv::read_tsv)), or if `output` cannot be written.
///
/// ## Usage
///
/// ```rust
/// use tsv2biom::convert_tsv_to_biom;
/// use tsv2biom::biom::reader::read_biom;
/// use std::io::Write;
///
/// let dir = tempfile::tempdir().unwrap();
/// let input = dir.path().join("table.tsv");
/// let output = dir.path().join("table.biom");
///
/// let mut f = std::fs::File::create(&input).unwrap();
/// f.write_all(b"FeatureID\tS1\tS2\nOTU1\t5\t0\nOTU2\tNA\t3\n").unwrap();
///
/// convert_tsv_to_biom(&input, &output, "picrust2_to_prmt").unwrap();
///
/// let (attrs, table) = read_biom(&output).unwrap();
/// assert_eq!(attrs.generated_by, "picrust2_to_prmt");
/// assert_eq!(table.observation_ids(), &["OTU1".to_string(), "OTU2".to_string()]);
/// assert_eq!(table.sample_ids(), &["S1".to_string(), "S2".to_string()]);
/// assert_eq!(table.data(), &ndarray::array![[5.0, 0.0], [0.0, 3.0]]);
/// ```
///
pub fn convert_tsv_to_biom(
    input: &Path,
    output: &Path,
    generated_by: &str,
) -> Result<Table, E> {
    log::info!("Reading {}", input.display());
    let table = read_table(input)?;

    let (n_obs, n_samples) = table.shape();
    log::info!("Read {} features and {} samples ({} non-zero values)", n_obs, n_samples, table.nnz());

    log::info!("Writing {}", output.display());
    biom::writer::write_biom(&table, output, generated_by)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    fn write_file(
        path: &Path,
        contents: &[u8],
    ) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents).unwrap();
    }

    #[test]
    fn convert_tsv_to_biom() {
        use super::convert_tsv_to_biom;
        use crate::biom::reader::read_biom;
        use ndarray::array;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("table.tsv");
        let output = dir.path().join("table.biom");
        write_file(&input, b"FeatureID\tS1\tS2\nOTU1\t5\t0\nOTU2\tNA\t3\n");

        let written = convert_tsv_to_biom(&input, &output, "picrust2_to_prmt").unwrap();
        let (attrs, got) = read_biom(&output).unwrap();

        assert_eq!(got, written);
        assert_eq!(got.observation_ids(), vec!["OTU1".to_string(), "OTU2".to_string()]);
        assert_eq!(got.sample_ids(), vec!["S1".to_string(), "S2".to_string()]);
        assert_eq!(got.data(), &array![[5.0, 0.0], [0.0, 3.0]]);
        assert_eq!(attrs.nnz, 2);
    }

    #[test]
    fn convert_tsv_to_biom_non_numeric_cells() {
        use super::convert_tsv_to_biom;
        use crate::biom::reader::read_biom;
        use ndarray::array;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("table.tsv");
        let output = dir.path().join("table.biom");
        write_file(&input, b"FeatureID\tS1\tS2\tS3\nOTU1\tNA\t\tabc\nOTU2\t1\tnan\t2\n");

        convert_tsv_to_biom(&input, &output, "picrust2_to_prmt").unwrap();
        let (_, got) = read_biom(&output).unwrap();

        assert_eq!(got.data(), &array![[0.0, 0.0, 0.0], [1.0, 0.0, 2.0]]);
    }

    #[test]
    fn convert_tsv_to_biom_twice() {
        use super::convert_tsv_to_biom;
        use crate::biom::reader::read_biom;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("table.tsv");
        let output_1 = dir.path().join("first.biom");
        let output_2 = dir.path().join("second.biom");
        write_file(&input, b"#OTU ID\tA\tB\tC\nx\t1\t0\t2.5\ny\t0\t0\t0\nz\t7\tNA\t1\n");

        convert_tsv_to_biom(&input, &output_1, "picrust2_to_prmt").unwrap();
        convert_tsv_to_biom(&input, &output_2, "picrust2_to_prmt").unwrap();

        let (_, got_1) = read_biom(&output_1).unwrap();
        let (_, got_2) = read_biom(&output_2).unwrap();

        assert_eq!(got_1, got_2);
        assert_eq!(got_1.shape(), (3, 3));
    }

    #[test]
    fn convert_tsv_to_biom_gzip_input() {
        use super::convert_tsv_to_biom;
        use crate::biom::reader::read_biom;
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("table.tsv.gz");
        let output = dir.path().join("table.biom");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"FeatureID\tS1\nOTU1\t5\n").unwrap();
        write_file(&input, &encoder.finish().unwrap());

        convert_tsv_to_biom(&input, &output, "picrust2_to_prmt").unwrap();
        let (_, got) = read_biom(&output).unwrap();

        assert_eq!(got.get("OTU1", "S1"), Some(5.0));
    }

    #[test]
    fn convert_tsv_to_biom_missing_input() {
        use super::convert_tsv_to_biom;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.tsv");
        let output = dir.path().join("table.biom");

        let got = convert_tsv_to_biom(&input, &output, "picrust2_to_prmt");

        assert!(got.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn convert_tsv_to_biom_duplicate_feature() {
        use super::convert_tsv_to_biom;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("table.tsv");
        let output = dir.path().join("table.biom");
        write_file(&input, b"FeatureID\tS1\nOTU1\t5\nOTU1\t3\n");

        let got = convert_tsv_to_biom(&input, &output, "picrust2_to_prmt");

        assert!(got.is_err());
        assert!(!output.exists());
    }
}
