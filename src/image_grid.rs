//! Scattering of per-sample values onto a dense image.

use crate::axis::{index, infer, AxisGeometry, SampleCoordinate};
use crate::error::{Axis, GridError};
use ndarray::Array2;

/// The reconstructed image together with the axes it was placed on.
///
/// # Fields
/// - `image`: shape `(y_axis.count, x_axis.count)`, NaN where no sample was observed.
/// - `x_axis`, `y_axis`: the inferred axes.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedImage {
    pub image: Array2<f64>,
    pub x_axis: AxisGeometry,
    pub y_axis: AxisGeometry,
}

/// Rectangle covered by the image in data coordinates.
///
/// Pixel centres sit exactly on the axis positions, so the rectangle extends half a
/// pixel beyond the first and last position on each side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

fn check_lengths(x: usize, y: usize, values: usize) -> Result<(), GridError> {
    if x != y || x != values {
        return Err(GridError::ShapeMismatch { x, y, values });
    }
    Ok(())
}

/// Infers both axes and places every sample in its pixel.
///
/// # Arguments
/// - `x`, `y`: Sample positions, one entry per sample.
/// - `values`: The value to show for every sample.
///
/// # Returns
/// The image and its axes, or an error if the series differ in length or one of the
/// axes has no known position at all.
pub fn compose(
    x: &[SampleCoordinate],
    y: &[SampleCoordinate],
    values: &[f64],
) -> Result<ComposedImage, GridError> {
    check_lengths(x.len(), y.len(), values.len())?;
    let x_axis = infer(x).ok_or(GridError::EmptyAxis { axis: Axis::X })?;
    let y_axis = infer(y).ok_or(GridError::EmptyAxis { axis: Axis::Y })?;
    compose_on_axes(x, y, values, &x_axis, &y_axis)
}

/// Places every sample on already known axes.
///
/// Samples with an unknown position are skipped. Samples that land outside the grid
/// are dropped with a warning. When several samples fall into the same pixel the one
/// that comes last wins.
pub fn compose_on_axes(
    x: &[SampleCoordinate],
    y: &[SampleCoordinate],
    values: &[f64],
    x_axis: &AxisGeometry,
    y_axis: &AxisGeometry,
) -> Result<ComposedImage, GridError> {
    check_lengths(x.len(), y.len(), values.len())?;
    let mut image = Array2::from_elem((y_axis.count, x_axis.count), f64::NAN);
    let x_index = index(x, x_axis);
    let y_index = index(y, y_axis);

    let mut dropped = 0usize;
    for ((xi, yi), value) in x_index.iter().zip(y_index.iter()).zip(values.iter()) {
        let (Some(xi), Some(yi)) = (xi, yi) else {
            continue;
        };
        let cell = usize::try_from(*yi)
            .ok()
            .zip(usize::try_from(*xi).ok())
            .and_then(|(row, col)| image.get_mut((row, col)));
        match cell {
            Some(cell) => *cell = *value,
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        log::warn!("{dropped} samples lie outside of the image grid and were dropped");
    }

    Ok(ComposedImage {
        image,
        x_axis: *x_axis,
        y_axis: *y_axis,
    })
}

/// Rectangle that aligns pixel centres with the axis positions.
pub fn pixel_rect(x_axis: &AxisGeometry, y_axis: &AxisGeometry) -> PixelRect {
    let shift_x = x_axis.pixel_span() / 2.0;
    let shift_y = y_axis.pixel_span() / 2.0;
    PixelRect {
        left: x_axis.start - shift_x,
        bottom: y_axis.start - shift_y,
        width: (x_axis.stop - x_axis.start) + 2.0 * shift_x,
        height: (y_axis.stop - y_axis.start) + 2.0 * shift_y,
    }
}
