//! Hyperspectral image reconstruction.
//!
//! A hyperspectral scan is a list of spectra, each taken at a position given by
//! coordinate columns. This crate reduces every spectrum to one value (integral or peak
//! inside a wavenumber window), infers a regular grid from the scattered coordinates and
//! places the values on it, ready to be colored and written to disk.
//!
//! ```no_run
//! use hyperspectra::image_plot::ImagePlot;
//! use hyperspectra::io::open_from_npz;
//! use hyperspectra::render::{render, save_png};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let data = open_from_npz(Path::new("scan.npz")).unwrap();
//! let mut plot = ImagePlot::default();
//! plot.set_data(Some(Arc::new(data)));
//! if let Some(frame) = plot.show_data().unwrap() {
//!     let picture = render(&frame.composed.image, frame.levels, &frame.color_table);
//!     save_png(&picture, Path::new("image.png")).unwrap();
//! }
//! ```

pub mod axis;
pub mod color_table;
pub mod config;
pub mod data_container;
pub mod error;
pub mod image_grid;
pub mod image_plot;
pub mod integrate;
pub mod io;
pub mod levels;
pub mod render;
pub mod settings;
