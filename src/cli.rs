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
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version)]
#[command(about = "Convert a tab-separated feature table to BIOM (HDF5)")]
pub struct Cli {
    // Feature table with feature ids in the first column and sample ids in the header
    #[arg(long = "input", required = true, help = "Input .tsv file")]
    pub input_file: PathBuf,

    // Output file path
    #[arg(long = "output", required = true, help = "Output .biom file")]
    pub out_file: PathBuf,

    // Verbosity
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn parse_required_flags() {
        use super::Cli;
        use clap::Parser;
        use std::path::PathBuf;

        let got = Cli::try_parse_from(["tsv2biom", "--input", "table.tsv", "--output", "table.biom"]).unwrap();

        assert_eq!(got.input_file, PathBuf::from("table.tsv"));
        assert_eq!(got.out_file, PathBuf::from("table.biom"));
        assert!(!got.verbose);
    }

    #[test]
    fn reject_missing_output() {
        use super::Cli;
        use clap::Parser;

        let got = Cli::try_parse_from(["tsv2biom", "--input", "table.tsv"]);

        assert!(got.is_err());
    }

    #[test]
    fn reject_short_flags() {
        use super::Cli;
        use clap::Parser;

        let got = Cli::try_parse_from(["tsv2biom", "-i", "table.tsv", "-o", "table.biom"]);

        assert!(got.is_err());
    }
}
