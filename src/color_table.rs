//! Color lookup tables for false-color rendering.
//!
//! A table has 256 entries. The palette colors are spread evenly between the low and
//! the high threshold; entries below the low threshold take the first color, entries
//! above the high threshold take the last one. The gamma parameter bends the tone
//! curve before the colors are interpolated.

use crate::error::ColorTableError;
use serde::{Deserialize, Serialize};

pub const TABLE_SIZE: usize = 256;

/// Blue to yellow.
pub const DEFAULT_PALETTE: [[u8; 3]; 2] = [[0, 0, 255], [255, 255, 0]];

pub const MAX_GAMMA: f64 = 20.0;

/// User adjustable parameters of the color scale.
///
/// # Fields
/// - `threshold_low`, `threshold_high`: anchor points of the palette within `[0, 1]`.
/// - `gamma`: tone curve control within `[0, 20]`, `0` is linear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorParameters {
    pub threshold_low: f64,
    pub threshold_high: f64,
    pub gamma: f64,
}

impl Default for ColorParameters {
    fn default() -> Self {
        ColorParameters {
            threshold_low: 0.0,
            threshold_high: 1.0,
            gamma: 0.0,
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ColorTableError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ColorTableError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

impl ColorParameters {
    pub fn validate(&self) -> Result<(), ColorTableError> {
        check_range("threshold_low", self.threshold_low, 0.0, 1.0)?;
        check_range("threshold_high", self.threshold_high, 0.0, 1.0)?;
        check_range("gamma", self.gamma, 0.0, MAX_GAMMA)?;
        if self.threshold_low >= self.threshold_high {
            return Err(ColorTableError::DegenerateThreshold {
                low: self.threshold_low,
                high: self.threshold_high,
            });
        }
        Ok(())
    }

    /// Exponent of the tone curve `t -> t^e`.
    fn exponent(&self) -> f64 {
        (-self.gamma / 10.0).exp2()
    }
}

/// A 256-entry RGB lookup table.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    entries: Vec<[u8; 3]>,
}

impl Default for ColorTable {
    fn default() -> Self {
        // the default parameters are always valid
        let params = ColorParameters::default();
        ColorTable {
            entries: build(&DEFAULT_PALETTE, &params),
        }
    }
}

/// Linear interpolation of the palette at `position` (0..=255), clamped at both ends.
fn interpolate(colors: &[[u8; 3]], anchors: &[f64], position: f64) -> [u8; 3] {
    let last = colors.len() - 1;
    if position <= anchors[0] {
        return colors[0];
    }
    if position >= anchors[last] {
        return colors[last];
    }
    let segment = anchors.partition_point(|a| *a <= position).clamp(1, last);
    let (a0, a1) = (anchors[segment - 1], anchors[segment]);
    let frac = (position - a0) / (a1 - a0);
    let (c0, c1) = (colors[segment - 1], colors[segment]);
    let mut rgb = [0u8; 3];
    for (channel, out) in rgb.iter_mut().enumerate() {
        let v = c0[channel] as f64 + (c1[channel] as f64 - c0[channel] as f64) * frac;
        *out = v.round().clamp(0.0, 255.0) as u8;
    }
    rgb
}

fn build(colors: &[[u8; 3]], params: &ColorParameters) -> Vec<[u8; 3]> {
    let low = params.threshold_low * 255.0;
    let high = params.threshold_high * 255.0;
    let anchors: Vec<f64> = if colors.len() == 1 {
        vec![low]
    } else {
        (0..colors.len())
            .map(|i| low + (high - low) * i as f64 / (colors.len() - 1) as f64)
            .collect()
    };
    let exponent = params.exponent();
    (0..TABLE_SIZE)
        .map(|i| {
            let t = i as f64 / (TABLE_SIZE - 1) as f64;
            interpolate(colors, &anchors, t.powf(exponent) * 255.0)
        })
        .collect()
}

impl ColorTable {
    /// Builds a table from a palette and the color parameters.
    ///
    /// # Errors
    /// `DegenerateThreshold` if the low threshold is not below the high one,
    /// `OutOfRange` if a parameter leaves its interval and `EmptyPalette` without colors.
    pub fn new(colors: &[[u8; 3]], params: &ColorParameters) -> Result<Self, ColorTableError> {
        if colors.is_empty() {
            return Err(ColorTableError::EmptyPalette);
        }
        params.validate()?;
        Ok(ColorTable {
            entries: build(colors, params),
        })
    }

    pub fn with_default_palette(params: &ColorParameters) -> Result<Self, ColorTableError> {
        ColorTable::new(&DEFAULT_PALETTE, params)
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> [u8; 3] {
        self.entries[index.min(TABLE_SIZE - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(low: f64, high: f64, gamma: f64) -> ColorParameters {
        ColorParameters {
            threshold_low: low,
            threshold_high: high,
            gamma,
        }
    }

    #[test]
    fn test_default_table() {
        let table = ColorTable::default();
        assert_eq!(table.entries().len(), TABLE_SIZE);
        assert_eq!(table.get(0), [0, 0, 255]);
        assert_eq!(table.get(255), [255, 255, 0]);
        assert_eq!(table.get(128), [128, 128, 127]);
        assert_eq!(table, ColorTable::with_default_palette(&ColorParameters::default()).unwrap());
    }

    #[test]
    fn test_thresholds_saturate_outside() {
        let table = ColorTable::with_default_palette(&params(0.25, 0.75, 0.0)).unwrap();
        assert_eq!(table.get(10), [0, 0, 255]);
        assert_eq!(table.get(60), [0, 0, 255]);
        assert_eq!(table.get(200), [255, 255, 0]);
        let middle = table.get(128);
        assert!(middle[0] > 100 && middle[0] < 155);
    }

    #[test]
    fn test_gamma_brightens_low_values() {
        let linear = ColorTable::with_default_palette(&params(0.0, 1.0, 0.0)).unwrap();
        let bent = ColorTable::with_default_palette(&params(0.0, 1.0, 10.0)).unwrap();
        assert_eq!(linear.get(64)[0], 64);
        assert!(bent.get(64)[0] > 120);
        assert_eq!(bent.get(0), linear.get(0));
        assert_eq!(bent.get(255), linear.get(255));
    }

    #[test]
    fn test_degenerate_threshold() {
        assert_eq!(
            ColorTable::with_default_palette(&params(0.5, 0.5, 0.0)),
            Err(ColorTableError::DegenerateThreshold { low: 0.5, high: 0.5 })
        );
        assert!(matches!(
            params(0.8, 0.2, 0.0).validate(),
            Err(ColorTableError::DegenerateThreshold { .. })
        ));
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            params(-0.1, 0.5, 0.0).validate(),
            Err(ColorTableError::OutOfRange { name: "threshold_low", .. })
        ));
        assert!(matches!(
            params(0.0, 1.0, 25.0).validate(),
            Err(ColorTableError::OutOfRange { name: "gamma", .. })
        ));
    }

    #[test]
    fn test_single_color_and_empty_palette() {
        let table = ColorTable::new(&[[1, 2, 3]], &ColorParameters::default()).unwrap();
        assert!(table.entries().iter().all(|c| *c == [1, 2, 3]));
        assert_eq!(
            ColorTable::new(&[], &ColorParameters::default()),
            Err(ColorTableError::EmptyPalette)
        );
    }

    #[test]
    fn test_three_color_palette() {
        let palette = [[0, 0, 0], [255, 0, 0], [255, 255, 255]];
        let table = ColorTable::new(&palette, &ColorParameters::default()).unwrap();
        assert_eq!(table.get(0), [0, 0, 0]);
        assert_eq!(table.get(255), [255, 255, 255]);
        let mid = table.get(128);
        assert_eq!(mid[0], 255);
        assert!(mid[1] < 5);
    }
}
