//! Display range of a reconstructed image.

use ndarray::{s, Array2, ArrayView2};

/// Images with more cells than this are sub-sampled before computing statistics.
const MAX_LEVEL_CELLS: usize = 1 << 16;

/// Range used when the image has no contrast at all.
pub const FALLBACK_RANGE: DisplayRange = DisplayRange {
    low: 0.0,
    high: 255.0,
};

/// Value interval mapped onto the color scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRange {
    pub low: f64,
    pub high: f64,
}

fn subsample(image: ArrayView2<'_, f64>) -> ArrayView2<'_, f64> {
    let mut view = image;
    while view.len() > MAX_LEVEL_CELLS {
        view = view.slice_move(s![..;2, ..;2]);
    }
    view
}

/// Computes the display range of an image, ignoring cells without a finite value.
///
/// Large images are thinned out by taking every second row and column until they have
/// at most 65536 cells. An image without contrast, or without any finite value, gets
/// the range `(0, 255)`.
pub fn levels(image: &Array2<f64>) -> DisplayRange {
    let view = subsample(image.view());
    let (low, high) = view
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !low.is_finite() || low == high {
        return FALLBACK_RANGE;
    }
    DisplayRange { low, high }
}
