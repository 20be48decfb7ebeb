//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for the high level operations of this crate
pub type HyperspectraResult<T> = Result<T, HyperspectraError>;

/// Spatial axis of the reconstructed image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Errors raised while placing samples on the image grid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// No sample has a known position along this axis
    #[error("no valid coordinates along the {axis} axis")]
    EmptyAxis { axis: Axis },

    /// Coordinate and value series differ in length
    #[error("series length mismatch: x has {x}, y has {y}, values has {values} entries")]
    ShapeMismatch { x: usize, y: usize, values: usize },
}

/// Errors raised while building a color lookup table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorTableError {
    /// The low threshold must lie strictly below the high threshold
    #[error("Low slider should be less than High (low = {low}, high = {high})")]
    DegenerateThreshold { low: f64, high: f64 },

    /// A color parameter left its allowed interval
    #[error("{name} = {value} is outside of [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A palette needs at least one color
    #[error("color palette is empty")]
    EmptyPalette,
}

/// Errors raised while reducing spectra to a single value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrateError {
    #[error("spectra have {spectra} columns but the wavenumber axis has {wavenumbers} entries")]
    LengthMismatch { spectra: usize, wavenumbers: usize },

    #[error("sample {sample} out of range (dataset has {n_samples} samples)")]
    SampleOutOfRange { sample: usize, n_samples: usize },
}

/// Errors raised when building or querying a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("no coordinate column named '{0}'")]
    UnknownColumn(String),

    #[error("column '{name}' has {actual} entries, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("spectra have {spectra} columns but the wavenumber axis has {wavenumbers} entries")]
    SpectraShape { spectra: usize, wavenumbers: usize },
}

/// Errors raised while reading input files or writing images
#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read npz archive: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    #[error("array '{0}' is missing in the npz archive")]
    MissingArray(String),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Aggregate error of the crate
#[derive(Error, Debug)]
pub enum HyperspectraError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    ColorTable(#[from] ColorTableError),

    #[error(transparent)]
    Integrate(#[from] IntegrateError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}
