//! This module defines the dataset the image is reconstructed from: a matrix of spectra,
//! the shared wavenumber axis and the per-sample coordinate columns.

use crate::axis::{coordinates_from_f64, SampleCoordinate};
use crate::error::DataError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A named per-sample column that can serve as an image axis.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateColumn {
    pub name: String,
    pub values: Array1<f64>,
}

impl CoordinateColumn {
    pub fn new(name: &str, values: Array1<f64>) -> Self {
        CoordinateColumn {
            name: name.to_string(),
            values,
        }
    }
}

/// Identity of a dataset layout.
///
/// Two datasets with the same coordinate columns and the same wavenumber axis share a
/// fingerprint. Per-dataset settings (chosen axes, thresholds) are stored under it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetFingerprint(pub String);

impl std::fmt::Display for DatasetFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a hyperspectral scan.
///
/// # Fields
/// - `wavenumbers`: The spectral axis shared by all samples.
/// - `spectra`: One row per sample, one column per wavenumber. May contain NaN.
/// - `columns`: Coordinate columns, each with one entry per sample (NaN = unknown).
#[derive(Clone, Debug, PartialEq)]
pub struct HyperspectralData {
    pub wavenumbers: Array1<f64>,
    pub spectra: Array2<f64>,
    pub columns: Vec<CoordinateColumn>,
}

impl HyperspectralData {
    /// Creates a dataset after checking that all shapes agree.
    pub fn new(
        wavenumbers: Array1<f64>,
        spectra: Array2<f64>,
        columns: Vec<CoordinateColumn>,
    ) -> Result<Self, DataError> {
        if spectra.ncols() != wavenumbers.len() {
            return Err(DataError::SpectraShape {
                spectra: spectra.ncols(),
                wavenumbers: wavenumbers.len(),
            });
        }
        let n_samples = spectra.nrows();
        for column in &columns {
            if column.values.len() != n_samples {
                return Err(DataError::ColumnLength {
                    name: column.name.clone(),
                    expected: n_samples,
                    actual: column.values.len(),
                });
            }
        }
        Ok(HyperspectralData {
            wavenumbers,
            spectra,
            columns,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.spectra.nrows()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&CoordinateColumn, DataError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DataError::UnknownColumn(name.to_string()))
    }

    /// Positions of all samples along the named column.
    pub fn coordinates(&self, name: &str) -> Result<Vec<SampleCoordinate>, DataError> {
        let column = self.column(name)?;
        Ok(coordinates_from_f64(&column.values.to_vec()))
    }

    pub fn spectrum(&self, sample: usize) -> ArrayView1<'_, f64> {
        self.spectra.index_axis(Axis(0), sample)
    }

    /// Lowest and highest finite wavenumber, `None` for an empty spectral axis.
    pub fn spectral_range(&self) -> Option<(f64, f64)> {
        let finite = self.wavenumbers.iter().copied().filter(|w| w.is_finite());
        finite.fold(None, |range, w| match range {
            None => Some((w, w)),
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
        })
    }

    /// Layout fingerprint over the column names and every wavenumber.
    pub fn fingerprint(&self) -> DatasetFingerprint {
        let names = self.column_names().join(",");
        let mut hasher = Sha256::new();
        for w in &self.wavenumbers {
            hasher.update(w.to_le_bytes());
        }
        DatasetFingerprint(format!(
            "[{names}];{}@{:x}",
            self.wavenumbers.len(),
            hasher.finalize()
        ))
    }
}
