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

//! In-memory feature-by-sample abundance table.
//!
//! A [Table] holds a dense matrix with one row per observation (feature, OTU,
//! ASV) and one column per sample, along with the identifiers of both axes.
//!
//! BIOM files store the matrix in compressed sparse form twice: once
//! compressed by observation (CSR) and once by sample (CSC). Both are
//! available as [CompressedMatrix] from [Table::to_csr] and [Table::to_csc].
//!
//! ## Usage
//!
//! ```rust
//! use tsv2biom::table::Table;
//! use ndarray::array;
//!
//! let data = array![[5.0, 0.0], [0.0, 3.0]];
//! let table = Table::new(
//!     data,
//!     vec!["OTU1".to_string(), "OTU2".to_string()],
//!     vec!["S1".to_string(), "S2".to_string()],
//! ).unwrap();
//!
//! assert_eq!(table.shape(), (2, 2));
//! assert_eq!(table.nnz(), 2);
//!
//! let csr = table.to_csr().unwrap();
//! assert_eq!(csr.data, vec![5.0, 3.0]);
//! assert_eq!(csr.indices, vec![0, 1]);
//! assert_eq!(csr.indptr, vec![0, 1, 2]);
//! ```
//!

use std::collections::HashSet;

use ndarray::Array2;
use ndarray::ArrayView2;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("matrix has shape ({rows}, {cols}) but {n_observations} observation ids and {n_samples} sample ids were given")]
    ShapeMismatch { rows: usize, cols: usize, n_observations: usize, n_samples: usize },

    #[error("duplicate observation id '{0}'")]
    DuplicateObservationId(String),

    #[error("duplicate sample id '{0}'")]
    DuplicateSampleId(String),

    #[error("value at row {row}, column {col} is not a finite number")]
    NonFinite { row: usize, col: usize },

    #[error("compressed matrix index {index} is out of range for axis of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("compressed matrix has {0} entries which exceeds the 32-bit index range")]
    TooLarge(usize),
}

/// Compressed sparse representation of a matrix along one axis.
///
/// Values for the `i`th major-axis element are stored in
/// `data[indptr[i]..indptr[i + 1]]`, with their minor-axis positions in the
/// same range of `indices`. Zero cells are not stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompressedMatrix {
    pub data: Vec<f64>,
    pub indices: Vec<i32>,
    pub indptr: Vec<i32>,
}

impl CompressedMatrix {
    /// Number of stored values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Number of major-axis elements.
    pub fn n_major(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }
}

/// Feature-by-sample table with observation ids as rows and sample ids as columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    data: Array2<f64>,
    observation_ids: Vec<String>,
    sample_ids: Vec<String>,
}

fn check_unique<F: Fn(String) -> TableError>(
    ids: &[String],
    err: F,
) -> Result<(), TableError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(err(id.clone()));
        }
    }
    Ok(())
}

fn compress(
    view: ArrayView2<f64>,
) -> Result<CompressedMatrix, E> {
    let mut data: Vec<f64> = Vec::new();
    let mut indices: Vec<i32> = Vec::new();
    let mut indptr: Vec<i32> = Vec::with_capacity(view.nrows() + 1);
    indptr.push(0);

    if view.ncols() > i32::MAX as usize {
        return Err(Box::new(TableError::TooLarge(view.ncols())));
    }

    for row in view.rows() {
        row.iter().enumerate().filter(|(_, value)| **value != 0.0).for_each(|(idx, value)| {
            data.push(*value);
            indices.push(idx as i32);
        });
        let end = i32::try_from(data.len()).map_err(|_| TableError::TooLarge(data.len()))?;
        indptr.push(end);
    }

    Ok(CompressedMatrix{ data, indices, indptr })
}

impl Table {
    /// Create a table from a dense matrix and the axis identifiers.
    ///
    /// ## Errors
    ///
    /// Returns [TableError] if the matrix shape does not match the number of
    /// identifiers, if a value is `NaN` or infinite, or if either axis
    /// contains the same identifier twice.
    ///
    pub fn new(
        data: Array2<f64>,
        observation_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self, TableError> {
        let (rows, cols) = data.dim();
        if rows != observation_ids.len() || cols != sample_ids.len() {
            return Err(TableError::ShapeMismatch{ rows, cols, n_observations: observation_ids.len(), n_samples: sample_ids.len() });
        }

        if let Some(((row, col), _)) = data.indexed_iter().find(|(_, x)| !x.is_finite()) {
            return Err(TableError::NonFinite{ row, col });
        }

        check_unique(&observation_ids, TableError::DuplicateObservationId)?;
        check_unique(&sample_ids, TableError::DuplicateSampleId)?;

        Ok(Self { data, observation_ids, sample_ids })
    }

    /// Build a table from a matrix compressed by observation.
    ///
    /// Inverse of [to_csr](Table::to_csr).
    ///
    /// ## Errors
    ///
    /// Returns [TableError] if `csr` does not have one major-axis element per
    /// observation id, if an index points past the end of an axis, if a value
    /// is not finite, or if the identifiers are not unique.
    ///
    pub fn from_csr(
        observation_ids: Vec<String>,
        sample_ids: Vec<String>,
        csr: &CompressedMatrix,
    ) -> Result<Self, TableError> {
        let n_obs = observation_ids.len();
        let n_samples = sample_ids.len();
        if csr.n_major() != n_obs || csr.indices.len() != csr.data.len() {
            return Err(TableError::ShapeMismatch{ rows: csr.n_major(), cols: n_samples, n_observations: n_obs, n_samples });
        }

        let mut data: Array2<f64> = Array2::zeros((n_obs, n_samples));
        for (row, bounds) in csr.indptr.windows(2).enumerate() {
            let start = usize::try_from(bounds[0]).map_err(|_| TableError::IndexOutOfRange{ index: bounds[0] as i64, len: csr.nnz() })?;
            let end = usize::try_from(bounds[1]).map_err(|_| TableError::IndexOutOfRange{ index: bounds[1] as i64, len: csr.nnz() })?;
            if start > end || end > csr.nnz() {
                return Err(TableError::IndexOutOfRange{ index: bounds[1] as i64, len: csr.nnz() });
            }

            for pos in start..end {
                let col = csr.indices[pos];
                if col < 0 || col as usize >= n_samples {
                    return Err(TableError::IndexOutOfRange{ index: col as i64, len: n_samples });
                }
                data[[row, col as usize]] = csr.data[pos];
            }
        }

        Self::new(data, observation_ids, sample_ids)
    }

    /// Returns (number of observations, number of samples).
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Number of non-zero cells.
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|x| **x != 0.0).count()
    }

    pub fn observation_ids(&self) -> &[String] {
        &self.observation_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Dense view of the values, observations as rows.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Value for the given observation and sample ids.
    pub fn get(
        &self,
        observation_id: &str,
        sample_id: &str,
    ) -> Option<f64> {
        let row = self.observation_ids.iter().position(|x| x == observation_id)?;
        let col = self.sample_ids.iter().position(|x| x == sample_id)?;
        Some(self.data[[row, col]])
    }

    /// Compress the matrix by observation.
    pub fn to_csr(&self) -> Result<CompressedMatrix, E> {
        compress(self.data.view())
    }

    /// Compress the matrix by sample.
    pub fn to_csc(&self) -> Result<CompressedMatrix, E> {
        compress(self.data.t())
    }
}
