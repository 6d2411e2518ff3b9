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
use std::str::FromStr;

use hdf5::types::VarLenUnicode;
use hdf5::Group;
use hdf5::H5Type;
use hdf5::Location;
use ndarray::ArrayView1;

use crate::biom::BiomAttributes;
use crate::biom::BiomError;
use crate::biom::OBSERVATION;
use crate::biom::SAMPLE;
use crate::table::CompressedMatrix;
use crate::table::Table;

type E = Box<dyn std::error::Error>;

// gzip level used for all datasets
const COMPRESSION_LEVEL: u8 = 4;
const MAX_CHUNK_LEN: usize = 1 << 16;

fn to_varlen(
    value: &str,
) -> Result<VarLenUnicode, BiomError> {
    VarLenUnicode::from_str(value).map_err(|_| BiomError::InvalidString(value.to_string()))
}

fn write_str_attr(
    loc: &Location,
    name: &str,
    value: &str,
) -> Result<(), E> {
    let value = to_varlen(value)?;
    loc.new_attr::<VarLenUnicode>().create(name)?.write_scalar(&value)?;
    Ok(())
}

fn write_dataset<T: H5Type>(
    group: &Group,
    name: &str,
    values: &[T],
) -> Result<(), E> {
    let builder = group.new_dataset_builder();

    // Filters need a chunked layout and chunks can't be empty
    let builder = if values.is_empty() {
        builder
    } else {
        builder.chunk(values.len().min(MAX_CHUNK_LEN)).deflate(COMPRESSION_LEVEL)
    };

    builder.with_data(ArrayView1::from(values)).create(name)?;
    Ok(())
}

fn write_axis(
    loc: &Group,
    axis: &str,
    ids: &[String],
    matrix: &CompressedMatrix,
) -> Result<(), E> {
    let group = loc.create_group(axis)?;

    let ids = ids.iter().map(|id| to_varlen(id)).collect::<Result<Vec<VarLenUnicode>, BiomError>>()?;
    write_dataset(&group, "ids", &ids)?;

    let matrix_group = group.create_group("matrix")?;
    write_dataset(&matrix_group, "data", &matrix.data)?;
    write_dataset(&matrix_group, "indices", &matrix.indices)?;
    write_dataset(&matrix_group, "indptr", &matrix.indptr)?;

    group.create_group("metadata")?;
    group.create_group("group-metadata")?;

    Ok(())
}

/// Write the root attributes of a BIOM file to `loc`.
pub fn write_attributes(
    loc: &Location,
    attrs: &BiomAttributes,
) -> Result<(), E> {
    write_str_attr(loc, "id", &attrs.id)?;
    write_str_attr(loc, "type", &attrs.table_type)?;
    write_str_attr(loc, "format-url", &attrs.format_url)?;
    loc.new_attr_builder().with_data(ArrayView1::from(&attrs.format_version[..])).create("format-version")?;
    write_str_attr(loc, "generated-by", &attrs.generated_by)?;
    write_str_attr(loc, "creation-date", &attrs.creation_date)?;
    loc.new_attr_builder().with_data(ArrayView1::from(&attrs.shape[..])).create("shape")?;
    loc.new_attr::<i64>().create("nnz")?.write_scalar(&attrs.nnz)?;
    Ok(())
}

/// Write `table` into an open HDF5 file.
///
/// The file must not already contain BIOM groups or attributes.
pub fn write_biom_to_file(
    table: &Table,
    file: &hdf5::File,
    generated_by: &str,
) -> Result<(), E> {
    let csr = table.to_csr()?;
    let csc = table.to_csc()?;

    let attrs = BiomAttributes::new(table.shape(), csr.nnz(), generated_by);
    write_attributes(file, &attrs)?;

    write_axis(file, OBSERVATION, table.observation_ids(), &csr)?;
    write_axis(file, SAMPLE, table.sample_ids(), &csc)?;

    Ok(())
}

/// Write `table` to a new BIOM 2.1 file at `path`.
///
/// An existing file at `path` is truncated. The file is closed before this
/// returns, also when writing fails; a failed write may leave a partial file
/// behind.
///
/// ## Usage
///
/// ```rust
/// use tsv2biom::biom::writer::write_biom;
/// use tsv2biom::biom::reader::read_biom;
/// use tsv2biom::table::Table;
/// use ndarray::array;
///
/// let table = Table::new(
///     array![[5.0, 0.0], [0.0, 3.0]],
///     vec!["OTU1".to_string(), "OTU2".to_string()],
///     vec!["S1".to_string(), "S2".to_string()],
/// ).unwrap();
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("table.biom");
/// write_biom(&table, &path, "my-tool").unwrap();
///
/// let (attrs, got) = read_biom(&path).unwrap();
/// assert_eq!(attrs.generated_by, "my-tool");
/// assert_eq!(got, table);
/// ```
///
pub fn write_biom(
    table: &Table,
    path: &Path,
    generated_by: &str,
) -> Result<(), E> {
    let file = hdf5::File::create(path)?;
    write_biom_to_file(table, &file, generated_by)?;
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {
    use crate::table::Table;
    use ndarray::array;

    fn example_table() -> Table {
        Table::new(
            array![[5.0, 0.0, 1.0], [0.0, 3.0, 0.0]],
            vec!["OTU1".to_string(), "OTU2".to_string()],
            vec!["S1".to_string(), "S2".to_string(), "S3".to_string()],
        ).unwrap()
    }

    #[test]
    fn write_biom_layout() {
        use super::write_biom;
        use hdf5::types::VarLenUnicode;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.biom");

        write_biom(&example_table(), &path, "picrust2_to_prmt").unwrap();

        let file = hdf5::File::open(&path).unwrap();
        for group in ["observation", "sample"] {
            for member in ["ids", "matrix/data", "matrix/indices", "matrix/indptr"] {
                assert!(file.dataset(&format!("{}/{}", group, member)).is_ok());
            }
            for member in ["metadata", "group-metadata"] {
                assert!(file.group(&format!("{}/{}", group, member)).is_ok());
            }
        }

        let generated_by = file.attr("generated-by").unwrap().read_scalar::<VarLenUnicode>().unwrap();
        assert_eq!(generated_by.as_str(), "picrust2_to_prmt");

        let shape = file.attr("shape").unwrap().read_raw::<i64>().unwrap();
        assert_eq!(shape, vec![2, 3]);

        let nnz = file.attr("nnz").unwrap().read_scalar::<i64>().unwrap();
        assert_eq!(nnz, 3);
    }

    #[test]
    fn write_biom_sample_matrix() {
        use super::write_biom;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.biom");

        write_biom(&example_table(), &path, "picrust2_to_prmt").unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let data = file.dataset("sample/matrix/data").unwrap().read_raw::<f64>().unwrap();
        let indices = file.dataset("sample/matrix/indices").unwrap().read_raw::<i32>().unwrap();
        let indptr = file.dataset("sample/matrix/indptr").unwrap().read_raw::<i32>().unwrap();

        assert_eq!(data, vec![5.0, 3.0, 1.0]);
        assert_eq!(indices, vec![0, 1, 0]);
        assert_eq!(indptr, vec![0, 1, 2, 3]);
    }

    #[test]
    fn write_biom_empty_table() {
        use super::write_biom;
        use crate::biom::reader::read_biom;
        use ndarray::Array2;

        let table = Table::new(Array2::zeros((0, 2)), Vec::new(), vec!["S1".to_string(), "S2".to_string()]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.biom");

        write_biom(&table, &path, "picrust2_to_prmt").unwrap();
        let (attrs, got) = read_biom(&path).unwrap();

        assert_eq!(attrs.shape, [0, 2]);
        assert_eq!(attrs.nnz, 0);
        assert_eq!(got, table);
    }

    #[test]
    fn write_biom_unwritable_path() {
        use super::write_biom;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("table.biom");

        let got = write_biom(&example_table(), &path, "picrust2_to_prmt");

        assert!(got.is_err());
        assert!(!path.exists());
    }
}
