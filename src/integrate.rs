//! Reduction of spectra to a single value over a wavenumber window.
//!
//! Every pixel of the reconstructed image shows one number per sample. This module
//! computes that number from the sample's spectrum with one of four methods: the
//! integral or the peak value, each measured either from zero or from a straight
//! baseline through the window's edge points.

use crate::data_container::HyperspectralData;
use crate::error::IntegrateError;
use interp1d::Interp1d;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Enum representing the supported integration methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Trapezoidal integral measured from zero.
    #[default]
    Simple,
    /// Trapezoidal integral above the straight line through the window edges.
    Baseline,
    /// Maximum value in the window.
    PeakMax,
    /// Maximum height above the straight line through the window edges.
    PeakBaseline,
}

impl IntegrationMethod {
    pub const ALL: [IntegrationMethod; 4] = [
        IntegrationMethod::Simple,
        IntegrationMethod::Baseline,
        IntegrationMethod::PeakMax,
        IntegrationMethod::PeakBaseline,
    ];

    /// Parses the short name used on the command line.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "simple" => Some(IntegrationMethod::Simple),
            "baseline" => Some(IntegrationMethod::Baseline),
            "peak" => Some(IntegrationMethod::PeakMax),
            "peak-baseline" => Some(IntegrationMethod::PeakBaseline),
            _ => None,
        }
    }

    fn edge_baseline(&self) -> bool {
        matches!(
            self,
            IntegrationMethod::Baseline | IntegrationMethod::PeakBaseline
        )
    }

    fn is_peak(&self) -> bool {
        matches!(
            self,
            IntegrationMethod::PeakMax | IntegrationMethod::PeakBaseline
        )
    }
}

impl Display for IntegrationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationMethod::Simple => write!(f, "Integrate from 0"),
            IntegrationMethod::Baseline => write!(f, "Integrate from baseline"),
            IntegrationMethod::PeakMax => write!(f, "Peak from 0"),
            IntegrationMethod::PeakBaseline => write!(f, "Peak from baseline"),
        }
    }
}

/// Wavenumber window, always stored with `low <= high`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationWindow {
    pub low: f64,
    pub high: f64,
}

impl IntegrationWindow {
    /// Creates a window from two bounds given in any order.
    pub fn new(a: f64, b: f64) -> Self {
        IntegrationWindow {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Window reaching one unit beyond both ends of the spectral axis.
    pub fn spanning(wavenumbers: ArrayView1<f64>) -> Option<Self> {
        let lo = wavenumbers.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = wavenumbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo.is_finite() && hi.is_finite() {
            Some(IntegrationWindow::new(lo - 1.0, hi + 1.0))
        } else {
            None
        }
    }
}

/// A curve to overlay on the spectrum plot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Markings that explain how the value of one sample was computed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawInfo {
    pub baseline: Option<Curve>,
    pub curve: Option<Curve>,
    /// Area between baseline and curve (integral methods).
    pub fill: Option<(Curve, Curve)>,
    /// Segment from the baseline up to the peak (peak methods).
    pub line: Option<[(f64, f64); 2]>,
}

/// Ascending wavenumbers together with the spectrum column each one came from.
struct SortedAxis {
    x: Vec<f64>,
    order: Vec<usize>,
}

impl SortedAxis {
    fn new(wavenumbers: ArrayView1<f64>) -> Self {
        let mut order: Vec<usize> = (0..wavenumbers.len()).collect();
        order.sort_by(|a, b| wavenumbers[*a].total_cmp(&wavenumbers[*b]));
        let x = order.iter().map(|i| wavenumbers[*i]).collect();
        SortedAxis { x, order }
    }

    /// Positions `[searchsorted_left(low), searchsorted_right(high))` of the window.
    fn window(&self, window: &IntegrationWindow) -> Range<usize> {
        let start = self.x.partition_point(|v| *v < window.low);
        let end = self.x.partition_point(|v| *v <= window.high);
        start..end.max(start)
    }

    fn extract(&self, spectrum: ArrayView1<f64>, range: Range<usize>) -> (Vec<f64>, Vec<f64>) {
        let xs = self.x[range.clone()].to_vec();
        let ys = self.order[range].iter().map(|i| spectrum[*i]).collect();
        (xs, ys)
    }
}

/// Straight line through the first and last finite points of the curve.
fn edge_baseline(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let finite: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(_, y)| y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();
    match (finite.first(), finite.last()) {
        (Some(&(x0, y0)), Some(&(x1, y1))) if x1 > x0 => {
            let slope = (y1 - y0) / (x1 - x0);
            xs.iter().map(|x| y0 + slope * (x - x0)).collect()
        }
        (Some(&(_, y0)), _) => vec![y0; xs.len()],
        _ => vec![f64::NAN; xs.len()],
    }
}

fn baseline(method: IntegrationMethod, xs: &[f64], ys: &[f64]) -> Vec<f64> {
    if method.edge_baseline() {
        edge_baseline(xs, ys)
    } else {
        vec![0.0; xs.len()]
    }
}

/// Replaces NaN values by linear interpolation over the finite points.
///
/// Values before the first or after the last finite point take that point's value.
/// Returns `None` if no value is finite.
fn fill_nan(xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let (known_x, known_y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys.iter())
        .filter(|(_, y)| y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip();
    let (first_x, last_x) = (*known_x.first()?, *known_x.last()?);
    if known_x.len() == 1 || first_x == last_x {
        let v = known_y[0];
        return Some(ys.iter().map(|y| if y.is_finite() { *y } else { v }).collect());
    }
    let interpolator = Interp1d::new_unsorted(known_x, known_y).ok()?;
    Some(
        xs.iter()
            .zip(ys.iter())
            .map(|(x, y)| {
                if y.is_finite() {
                    *y
                } else {
                    interpolator.interpolate(x.clamp(first_x, last_x))
                }
            })
            .collect(),
    )
}

fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}

fn reduce(method: IntegrationMethod, xs: &[f64], ys: &[f64]) -> f64 {
    let bs = baseline(method, xs, ys);
    let above: Vec<f64> = ys.iter().zip(bs.iter()).map(|(y, b)| y - b).collect();
    if method.is_peak() {
        if above.is_empty() {
            return f64::NAN;
        }
        // NaN inside the window propagates
        above.iter().copied().fold(f64::NEG_INFINITY, |m, v| {
            if m.is_nan() || v.is_nan() {
                f64::NAN
            } else {
                m.max(v)
            }
        })
    } else if above.iter().any(|v| v.is_nan()) {
        match fill_nan(xs, &above) {
            Some(filled) => trapezoid(xs, &filled),
            None => f64::NAN,
        }
    } else {
        trapezoid(xs, &above)
    }
}

fn check_shape(data: &HyperspectralData) -> Result<(), IntegrateError> {
    if data.spectra.ncols() != data.wavenumbers.len() {
        return Err(IntegrateError::LengthMismatch {
            spectra: data.spectra.ncols(),
            wavenumbers: data.wavenumbers.len(),
        });
    }
    Ok(())
}

/// Computes one value per sample.
///
/// # Arguments
/// - `data`: The dataset holding the spectra.
/// - `method`: The reduction to apply.
/// - `window`: The wavenumber window, inclusive at both ends.
///
/// # Returns
/// An array with one entry per sample. An empty window integrates to `0` and has a
/// NaN peak.
pub fn integrate(
    data: &HyperspectralData,
    method: IntegrationMethod,
    window: IntegrationWindow,
) -> Result<Array1<f64>, IntegrateError> {
    check_shape(data)?;
    let axis = SortedAxis::new(data.wavenumbers.view());
    let range = axis.window(&window);
    Ok(data
        .spectra
        .outer_iter()
        .map(|spectrum| {
            let (xs, ys) = axis.extract(spectrum, range.clone());
            reduce(method, &xs, &ys)
        })
        .collect())
}

/// Builds the markings for one sample, mirroring what `integrate` computes for it.
pub fn draw_info(
    data: &HyperspectralData,
    sample: usize,
    method: IntegrationMethod,
    window: IntegrationWindow,
) -> Result<DrawInfo, IntegrateError> {
    check_shape(data)?;
    if sample >= data.n_samples() {
        return Err(IntegrateError::SampleOutOfRange {
            sample,
            n_samples: data.n_samples(),
        });
    }
    let axis = SortedAxis::new(data.wavenumbers.view());
    let (xs, ys) = axis.extract(data.spectrum(sample), axis.window(&window));
    let bs = baseline(method, &xs, &ys);

    let baseline_curve = Curve {
        x: xs.clone(),
        y: bs.clone(),
    };
    let curve = Curve {
        x: xs.clone(),
        y: ys.clone(),
    };

    let mut info = DrawInfo {
        baseline: Some(baseline_curve.clone()),
        curve: Some(curve.clone()),
        ..DrawInfo::default()
    };
    if method.is_peak() {
        let peak = ys
            .iter()
            .zip(bs.iter())
            .map(|(y, b)| y - b)
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        info.line = peak.map(|i| [(xs[i], bs[i]), (xs[i], ys[i])]);
    } else {
        info.fill = Some((baseline_curve, curve));
    }
    Ok(info)
}
