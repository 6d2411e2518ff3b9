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

//! Parser for wide tab-separated feature tables.
//!
//! The expected layout has a header row and one row per feature:
//!
//! ```text
//! FeatureID	S1	S2
//! OTU1	5	0
//! OTU2	NA	3
//! ```
//!
//! The first column holds the feature identifiers and its header cell is
//! ignored. The remaining header cells are the sample identifiers. All other
//! cells are abundances; cells that do not contain a finite number are read as
//! zero (see [parse_abundance]).
//!
//! Every sample gets a unique, non-empty id: an empty header cell at column
//! `i` becomes `Unnamed: i`, and repeats of a name get a `.1`, `.2`, ...
//! suffix.
//!

use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;
use csv::StringRecordsIntoIter;
use indexmap::IndexSet;
use ndarray::Array2;

use crate::table::Table;
use crate::table::TableError;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TsvError {
    #[error("input table is empty")]
    EmptyInput,

    #[error("line {line}: empty feature identifier")]
    EmptyFeatureId { line: u64 },

    #[error("line {line}: expected at most {expected} fields, saw {found}")]
    TooManyFields { line: u64, expected: usize, found: usize },
}

/// Parse an abundance value from a single cell.
///
/// Leading and trailing whitespace is ignored. Returns 0.0 if the cell is
/// empty, is not a number, or is not finite (`NaN`, `inf`).
///
/// ## Usage
///
/// ```rust
/// use tsv2biom::tsv::parse_abundance;
///
/// assert_eq!(parse_abundance("5"), 5.0);
/// assert_eq!(parse_abundance(" 2.5e1 "), 25.0);
/// assert_eq!(parse_abundance("NA"), 0.0);
/// assert_eq!(parse_abundance(""), 0.0);
/// assert_eq!(parse_abundance("inf"), 0.0);
/// ```
///
pub fn parse_abundance(
    field: &str,
) -> f64 {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Name the header columns.
///
/// Fills in empty names with `Unnamed: <column index>` and appends `.<n>` to
/// repeated names until every name is unique.
pub fn column_names(
    header: &StringRecord,
) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    header.iter().enumerate().map(|(idx, field)| {
        let mut name = if field.is_empty() { format!("Unnamed: {}", idx) } else { field.to_string() };

        let mut count = *counts.get(&name).unwrap_or(&0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{}.{}", name, count);
            count = *counts.get(&name).unwrap_or(&0);
        }
        counts.insert(name.clone(), count + 1);

        name
    }).collect()
}

fn is_blank(
    record: &StringRecord,
) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

fn next_record<R: Read>(
    records: &mut StringRecordsIntoIter<R>,
) -> Result<Option<StringRecord>, E> {
    for record in records.by_ref() {
        let record = record?;
        if !is_blank(&record) {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Read a feature table from [Read] into a [Table].
///
/// ## Errors
///
/// - [TsvError] if the input is empty, a row has more fields than the header,
///   or a row has no feature identifier.
/// - [TableError::DuplicateObservationId] if a feature identifier repeats.
/// - [csv::Error] if the input is not valid UTF-8.
///
/// Rows with fewer fields than the header are padded with zeros.
///
/// ## Usage
///
/// ```rust
/// use tsv2biom::tsv::read_tsv;
/// use std::io::Cursor;
///
/// let input = Cursor::new(b"FeatureID\tS1\tS2\nOTU1\t5\t0\nOTU2\tNA\t3\n".to_vec());
/// let table = read_tsv(input).unwrap();
///
/// assert_eq!(table.observation_ids(), &["OTU1".to_string(), "OTU2".to_string()]);
/// assert_eq!(table.sample_ids(), &["S1".to_string(), "S2".to_string()]);
/// assert_eq!(table.data(), &ndarray::array![[5.0, 0.0], [0.0, 3.0]]);
/// ```
///
pub fn read_tsv<R: Read>(
    conn: R,
) -> Result<Table, E> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(conn);
    let mut records = reader.into_records();

    // csv drops a leading UTF-8 BOM
    let header = next_record(&mut records)?.ok_or(TsvError::EmptyInput)?;

    let n_fields = header.len();
    let sample_ids: Vec<String> = column_names(&header).into_iter().skip(1).collect();
    let n_samples = sample_ids.len();

    let mut observation_ids: IndexSet<String> = IndexSet::new();
    let mut values: Vec<f64> = Vec::new();

    while let Some(record) = next_record(&mut records)? {
        let line = record.position().map_or(0, |pos| pos.line());
        if record.len() > n_fields {
            return Err(Box::new(TsvError::TooManyFields{ line, expected: n_fields, found: record.len() }));
        }

        let id = &record[0];
        if id.is_empty() {
            return Err(Box::new(TsvError::EmptyFeatureId{ line }));
        }
        if !observation_ids.insert(id.to_string()) {
            return Err(Box::new(TableError::DuplicateObservationId(id.to_string())));
        }

        values.extend((1..=n_samples).map(|idx| record.get(idx).map_or(0.0, parse_abundance)));
    }

    let data = Array2::from_shape_vec((observation_ids.len(), n_samples), values)?;
    let table = Table::new(data, observation_ids.into_iter().collect(), sample_ids)?;

    Ok(table)
}
