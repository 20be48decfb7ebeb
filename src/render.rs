//! Conversion of reconstructed images into RGBA pixels.

use crate::color_table::{ColorTable, TABLE_SIZE};
use crate::error::IoError;
use crate::levels::DisplayRange;
use image::{Rgba, RgbaImage};
use ndarray::Array2;
use std::path::Path;

/// Color of pixels where no sample was observed.
pub const NAN_COLOR: Rgba<u8> = Rgba([100, 100, 100, 255]);

/// Position of `value` in the lookup table.
pub fn table_index(value: f64, range: DisplayRange) -> usize {
    let span = range.high - range.low;
    if span <= 0.0 || !span.is_finite() {
        return 0;
    }
    let scaled = ((value - range.low) * TABLE_SIZE as f64 / span).floor();
    scaled.clamp(0.0, (TABLE_SIZE - 1) as f64) as usize
}

/// Renders the image with the given display range and color table.
///
/// Row 0 of the image holds the lowest y coordinate and ends up at the bottom of the
/// returned picture. Cells without a value are painted in [`NAN_COLOR`].
pub fn render(image: &Array2<f64>, range: DisplayRange, table: &ColorTable) -> RgbaImage {
    let (height, width) = image.dim();
    RgbaImage::from_fn(width as u32, height as u32, |col, row| {
        let value = image[[height - 1 - row as usize, col as usize]];
        if value.is_nan() {
            NAN_COLOR
        } else {
            let [r, g, b] = table.get(table_index(value, range));
            Rgba([r, g, b, 255])
        }
    })
}

/// Writes the picture as PNG.
pub fn save_png(img: &RgbaImage, file_path: &Path) -> Result<(), IoError> {
    img.save(file_path)?;
    log::info!("saved image to {file_path:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_table_index() {
        let range = DisplayRange { low: 10.0, high: 40.0 };
        assert_eq!(table_index(10.0, range), 0);
        assert_eq!(table_index(40.0, range), 255);
        assert_eq!(table_index(25.0, range), 128);
        assert_eq!(table_index(-5.0, range), 0);
        assert_eq!(table_index(1e9, range), 255);
    }

    #[test]
    fn test_render_orientation_and_nan() {
        let image = array![[10.0, f64::NAN], [20.0, 40.0]];
        let table = ColorTable::default();
        let picture = render(&image, DisplayRange { low: 10.0, high: 40.0 }, &table);
        assert_eq!(picture.dimensions(), (2, 2));
        // first image row is drawn at the bottom
        assert_eq!(*picture.get_pixel(0, 1), Rgba([0, 0, 255, 255]));
        assert_eq!(*picture.get_pixel(1, 1), NAN_COLOR);
        assert_eq!(*picture.get_pixel(1, 0), Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        let picture = render(
            &array![[1.0, 2.0]],
            DisplayRange { low: 1.0, high: 2.0 },
            &ColorTable::default(),
        );
        save_png(&picture, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, picture);
    }
}
