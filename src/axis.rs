//! Inference of regular sampling axes from scattered scan coordinates.
//!
//! Scanning instruments report the position of every sample with some rounding
//! error, and now and then a sample is missing altogether. This module recovers
//! the regular grid the scan was taken on (first and last position plus the
//! number of pixels) and maps positions back onto that grid.

/// Relative tolerance for gaps that still count as a single step.
const STEP_TOLERANCE: f64 = 1.01;

/// Gaps smaller than `range / (distinct values * NOISE_DIVISOR)` are jitter.
const NOISE_DIVISOR: f64 = 100.0;

/// Position of a sample along one axis, `None` if it is unknown.
pub type SampleCoordinate = Option<f64>;

/// A regular axis of `count` evenly spaced points from `start` to `stop` (inclusive).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisGeometry {
    pub start: f64,
    pub stop: f64,
    pub count: usize,
}

impl AxisGeometry {
    /// Distance between two neighbouring grid points, `None` for a single-pixel axis.
    pub fn step(&self) -> Option<f64> {
        if self.count > 1 {
            Some((self.stop - self.start) / (self.count - 1) as f64)
        } else {
            None
        }
    }

    /// Width covered by one pixel. A single-pixel axis is given unit width.
    pub fn pixel_span(&self) -> f64 {
        self.step().unwrap_or(1.0)
    }

    /// All grid positions, equivalent to `numpy.linspace(start, stop, count)`.
    pub fn linspace(&self) -> Vec<f64> {
        match self.step() {
            Some(step) => (0..self.count)
                .map(|i| {
                    if i == self.count - 1 {
                        self.stop
                    } else {
                        self.start + step * i as f64
                    }
                })
                .collect(),
            None => vec![self.start],
        }
    }
}

/// Converts a raw column where NaN marks a missing position into a coordinate series.
pub fn coordinates_from_f64(values: &[f64]) -> Vec<SampleCoordinate> {
    values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(*v) })
        .collect()
}

fn valid(coordinate: &SampleCoordinate) -> Option<f64> {
    coordinate.filter(|v| v.is_finite())
}

/// Finds a regular axis that matches the given coordinates.
///
/// Missing and non-finite coordinates are ignored. The minimum and maximum of the
/// remaining values are kept exactly as axis limits, only the number of points is
/// inferred. Gaps below a noise floor are ignored and gaps that are more than one
/// percent larger than the first real gap are treated as missing samples.
///
/// # Arguments
/// - `series`: one coordinate per sample.
///
/// # Returns
/// The inferred axis or `None` if no sample has a known position.
pub fn infer(series: &[SampleCoordinate]) -> Option<AxisGeometry> {
    let mut values: Vec<f64> = series.iter().filter_map(valid).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();

    let first = values[0];
    let last = values[values.len() - 1];
    if values.len() == 1 {
        return Some(AxisGeometry {
            start: first,
            stop: first,
            count: 1,
        });
    }

    // halved positions keep differences finite when `last - first` overflows
    let scale = if (last - first).is_finite() { 1.0 } else { 0.5 };
    let range = last * scale - first * scale;
    let noise_floor = range / (values.len() as f64 * NOISE_DIVISOR);
    let gaps: Vec<f64> = values
        .windows(2)
        .map(|w| w[1] * scale - w[0] * scale)
        .filter(|gap| *gap > noise_floor)
        .collect();

    // at least one gap is always >= range / (n - 1), which exceeds the noise floor
    let step = match gaps.first() {
        Some(reference) => {
            let limit = reference * STEP_TOLERANCE;
            let regular: Vec<f64> = gaps.iter().copied().filter(|gap| *gap < limit).collect();
            regular.iter().sum::<f64>() / regular.len() as f64
        }
        None => range / (values.len() - 1) as f64,
    };

    let count = (range / step).round_ties_even() as usize + 1;
    log::debug!(
        "inferred axis {first}..{last} with {count} points (step {})",
        step / scale
    );
    Some(AxisGeometry {
        start: first,
        stop: last,
        count,
    })
}

/// Maps coordinates onto the grid indices of `axis`.
///
/// The output has one entry per input coordinate; missing coordinates map to `None`.
/// Coordinates outside the axis are not clamped and may produce negative indices or
/// indices `>= axis.count`.
pub fn index(series: &[SampleCoordinate], axis: &AxisGeometry) -> Vec<Option<i64>> {
    series
        .iter()
        .map(|coordinate| valid(coordinate).map(|v| index_of(v, axis)))
        .collect()
}

/// Grid index of a single position.
pub fn index_of(value: f64, axis: &AxisGeometry) -> i64 {
    if axis.count <= 1 {
        return 0;
    }
    let scale = if (axis.stop - axis.start).is_finite() { 1.0 } else { 0.5 };
    let span = axis.stop * scale - axis.start * scale;
    let scaled = (value * scale - axis.start * scale) * (axis.count - 1) as f64 / span;
    scaled.round_ties_even() as i64
}
