//! Loading of hyperspectral scans from `.npz` archives.
//!
//! The archive holds a 1-D `wavenumbers` array, a 2-D `spectra` array with one row per
//! sample and the sample coordinates as 1-D arrays (NaN = unknown position). `x` and
//! `y` come first when present, every other 1-D array with one entry per sample is
//! offered as an additional coordinate column.

use crate::data_container::{CoordinateColumn, HyperspectralData};
use crate::error::IoError;
use ndarray::{Array1, Array2, Ix1, OwnedRepr};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::path::Path;

const WAVENUMBERS: &str = "wavenumbers";
const SPECTRA: &str = "spectra";
const PREFERRED_COLUMNS: [&str; 2] = ["x", "y"];

fn strip_suffix(name: &str) -> &str {
    name.strip_suffix(".npy").unwrap_or(name)
}

fn archive_name<'a>(names: &'a [String], key: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|n| strip_suffix(n) == key)
        .map(|n| n.as_str())
}

/// Opens a scan stored as `.npz`.
///
/// # Arguments
/// - `file_path`: path to the archive.
///
/// # Returns
/// The dataset or an error if the file cannot be read, `wavenumbers` or `spectra` is
/// missing or the shapes do not agree.
pub fn open_from_npz(file_path: &Path) -> Result<HyperspectralData, IoError> {
    let file = File::open(file_path).map_err(|source| IoError::Open {
        path: file_path.to_path_buf(),
        source,
    })?;
    let mut npz = NpzReader::new(file)?;
    let names = npz.names()?;

    let wavenumbers_name = archive_name(&names, WAVENUMBERS)
        .ok_or_else(|| IoError::MissingArray(WAVENUMBERS.to_string()))?;
    let wavenumbers: Array1<f64> = npz.by_name(wavenumbers_name)?;
    let spectra_name = archive_name(&names, SPECTRA)
        .ok_or_else(|| IoError::MissingArray(SPECTRA.to_string()))?;
    let spectra: Array2<f64> = npz.by_name(spectra_name)?;
    let n_samples = spectra.nrows();

    let mut ordered: Vec<&str> = PREFERRED_COLUMNS
        .iter()
        .filter_map(|key| archive_name(&names, key))
        .collect();
    for name in &names {
        let key = strip_suffix(name);
        if key != WAVENUMBERS && key != SPECTRA && !PREFERRED_COLUMNS.contains(&key) {
            ordered.push(name.as_str());
        }
    }

    let mut columns = vec![];
    for name in ordered {
        match npz.by_name::<OwnedRepr<f64>, Ix1>(name) {
            Ok(values) if values.len() == n_samples => {
                columns.push(CoordinateColumn::new(strip_suffix(name), values));
            }
            Ok(values) => {
                log::warn!(
                    "ignoring '{name}': {} entries, expected {n_samples}",
                    values.len()
                );
            }
            Err(err) => {
                log::debug!("'{name}' is not a coordinate column: {err}");
            }
        }
    }

    let data = HyperspectralData::new(wavenumbers, spectra, columns)?;
    log::info!(
        "opened {:?}: {} samples, {} wavenumbers, columns {:?}",
        file_path,
        data.n_samples(),
        data.wavenumbers.len(),
        data.column_names()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::NpzWriter;

    fn write_npz(path: &Path, with_spectra: bool) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("depth", &array![5.0, 5.0, 6.0]).unwrap();
        npz.add_array("y", &array![0.0, 1.0, f64::NAN]).unwrap();
        npz.add_array("x", &array![0.0, 0.0, 1.0]).unwrap();
        npz.add_array("wavenumbers", &array![1000.0, 1001.0]).unwrap();
        npz.add_array("labels", &array![1.0, 2.0]).unwrap();
        if with_spectra {
            npz.add_array("spectra", &array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
                .unwrap();
        }
        npz.finish().unwrap();
    }

    #[test]
    fn test_open_from_npz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        write_npz(&path, true);

        let data = open_from_npz(&path).unwrap();
        assert_eq!(data.n_samples(), 3);
        assert_eq!(data.column_names(), vec!["x", "y", "depth"]);
        assert_eq!(data.coordinates("y").unwrap()[2], None);
        assert_eq!(data.wavenumbers, array![1000.0, 1001.0]);
    }

    #[test]
    fn test_open_from_npz_missing_spectra() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npz");
        write_npz(&path, false);

        let err = open_from_npz(&path).unwrap_err();
        assert!(matches!(err, IoError::MissingArray(name) if name == "spectra"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = open_from_npz(Path::new("/nonexistent/scan.npz")).unwrap_err();
        assert!(matches!(err, IoError::Open { .. }));
    }
}
