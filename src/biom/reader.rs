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
use std::path::Path;

use hdf5::types::VarLenUnicode;
use hdf5::Group;
use hdf5::Location;

use crate::biom::BiomAttributes;
use crate::biom::BiomError;
use crate::biom::OBSERVATION;
use crate::biom::SAMPLE;
use crate::table::CompressedMatrix;
use crate::table::Table;

type E = Box<dyn std::error::Error>;

fn read_str_attr(
    loc: &Location,
    name: &str,
) -> Result<String, E> {
    Ok(loc.attr(name)?.read_scalar::<VarLenUnicode>()?.as_str().to_string())
}

fn read_pair_attr(
    loc: &Location,
    name: &str,
) -> Result<[i64; 2], E> {
    let values = loc.attr(name)?.read_raw::<i64>()?;
    match values[..] {
        [first, second] => Ok([first, second]),
        _ => Err(Box::new(BiomError::InvalidAttribute{ name: name.to_string(), len: values.len() })),
    }
}

/// Read the root attributes of a BIOM file from `loc`.
pub fn read_attributes(
    loc: &Location,
) -> Result<BiomAttributes, E> {
    Ok(BiomAttributes {
        id: read_str_attr(loc, "id")?,
        table_type: read_str_attr(loc, "type")?,
        format_url: read_str_attr(loc, "format-url")?,
        format_version: read_pair_attr(loc, "format-version")?,
        generated_by: read_str_attr(loc, "generated-by")?,
        creation_date: read_str_attr(loc, "creation-date")?,
        shape: read_pair_attr(loc, "shape")?,
        nnz: loc.attr("nnz")?.read_scalar::<i64>()?,
    })
}

fn read_ids(
    group: &Group,
) -> Result<Vec<String>, E> {
    let ids = group.dataset("ids")?.read_raw::<VarLenUnicode>()?;
    Ok(ids.iter().map(|id| id.as_str().to_string()).collect())
}

fn read_matrix(
    group: &Group,
) -> Result<CompressedMatrix, E> {
    let matrix = group.group("matrix")?;
    Ok(CompressedMatrix {
        data: matrix.dataset("data")?.read_raw::<f64>()?,
        indices: matrix.dataset("indices")?.read_raw::<i32>()?,
        indptr: matrix.dataset("indptr")?.read_raw::<i32>()?,
    })
}

/// Read a BIOM 2.x file into memory.
///
/// Only the observation-major copy of the matrix is read; observation and
/// sample metadata are ignored.
///
/// ## Errors
///
/// - [BiomError::UnsupportedVersion] if the file is not BIOM 2.x.
/// - [BiomError::InvalidAttribute] if `format-version` or `shape` is not a pair.
/// - [BiomError::ShapeMismatch] if the `shape` attribute disagrees with the ids.
/// - [TableError](crate::table::TableError) if the matrix is malformed.
/// - [hdf5::Error] if the file cannot be opened or a group, dataset or
///   attribute is missing.
///
pub fn read_biom(
    path: &Path,
) -> Result<(BiomAttributes, Table), E> {
    let file = hdf5::File::open(path)?;

    let attrs = read_attributes(&file)?;
    if attrs.format_version[0] != 2 {
        return Err(Box::new(BiomError::UnsupportedVersion(attrs.format_version[0], attrs.format_version[1])));
    }

    let observations = file.group(OBSERVATION)?;
    let observation_ids = read_ids(&observations)?;
    let sample_ids = read_ids(&file.group(SAMPLE)?)?;

    if attrs.shape != [observation_ids.len() as i64, sample_ids.len() as i64] {
        return Err(Box::new(BiomError::ShapeMismatch{ rows: attrs.shape[0], cols: attrs.shape[1], n_observations: observation_ids.len(), n_samples: sample_ids.len() }));
    }

    let csr = read_matrix(&observations)?;
    let table = Table::from_csr(observation_ids, sample_ids, &csr)?;

    log::info!("Read {} observations and {} samples from {}", table.shape().0, table.shape().1, path.display());

    Ok((attrs, table))
}
