//! Host independent state of the hyperspectral image view.
//!
//! `ImagePlot` ties the pieces of the crate together: it keeps the current dataset and
//! settings, integrates the spectra, places the values on the image grid and prepares
//! everything a renderer needs. Axis geometry is inferred once per dataset and axis
//! choice and reused while only the integration window, the method or the colors
//! change, so the image does not jump between redraws of the same scan.

use crate::axis::AxisGeometry;
use crate::color_table::{ColorParameters, ColorTable};
use crate::config::PlotCommand;
use crate::data_container::{DatasetFingerprint, HyperspectralData};
use crate::error::{Axis, ColorTableError, DataError, GridError, HyperspectraResult};
use crate::image_grid::{compose_on_axes, pixel_rect, ComposedImage, PixelRect};
use crate::integrate::{draw_info, integrate, DrawInfo, IntegrationMethod, IntegrationWindow};
use crate::levels::{levels, DisplayRange};
use crate::settings::{AxisChoice, ContextSettings, ImageSettings, IntegrationSettings};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Problems shown to the user instead of (or next to) the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Warning {
    /// The low threshold is not below the high one, the color table was not updated.
    ThresholdError,
    /// A color parameter is outside of its allowed range.
    ColorParameterRange,
    /// No sample has a known position along this axis, nothing can be drawn.
    EmptyAxis(Axis),
    /// The dataset has no coordinate column to use as an axis.
    NoCoordinates,
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ThresholdError => write!(f, "Low slider should be less than High"),
            Warning::ColorParameterRange => write!(f, "Color parameters are out of range"),
            Warning::EmptyAxis(axis) => write!(f, "No valid {axis} coordinates"),
            Warning::NoCoordinates => write!(f, "Data has no coordinate columns"),
        }
    }
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFrame {
    pub composed: ComposedImage,
    pub levels: DisplayRange,
    pub rect: PixelRect,
    pub color_table: ColorTable,
    /// Markings of the selected sample, if any.
    pub markings: Option<DrawInfo>,
}

#[derive(Clone, Debug)]
struct AxisCache {
    generation: u64,
    axes: AxisChoice,
    geometry: Result<(AxisGeometry, AxisGeometry), GridError>,
}

pub struct ImagePlot {
    data: Option<Arc<HyperspectralData>>,
    fingerprint: Option<DatasetFingerprint>,
    generation: u64,
    settings: ImageSettings,
    integration: IntegrationSettings,
    context: ContextSettings,
    selected_sample: Option<usize>,
    axis_cache: Option<AxisCache>,
    #[cfg(test)]
    axis_inferences: u64,
    color_table: ColorTable,
    warnings: BTreeSet<Warning>,
}

impl Default for ImagePlot {
    fn default() -> Self {
        ImagePlot::new(ColorParameters::default(), IntegrationSettings::default())
    }
}

impl ImagePlot {
    pub fn new(color: ColorParameters, integration: IntegrationSettings) -> Self {
        let mut plot = ImagePlot {
            data: None,
            fingerprint: None,
            generation: 0,
            settings: ImageSettings {
                axes: AxisChoice::default(),
                color,
            },
            integration,
            context: ContextSettings::default(),
            selected_sample: None,
            axis_cache: None,
            #[cfg(test)]
            axis_inferences: 0,
            color_table: ColorTable::default(),
            warnings: BTreeSet::new(),
        };
        plot.update_color_schema();
        plot
    }

    /// Uses previously remembered axis choices when datasets are opened.
    pub fn restore_context(&mut self, context: &ContextSettings) {
        self.context = context.clone();
    }

    pub fn context_settings(&self) -> &ContextSettings {
        &self.context
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    pub fn integration(&self) -> &IntegrationSettings {
        &self.integration
    }

    pub fn data(&self) -> Option<&Arc<HyperspectralData>> {
        self.data.as_ref()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.iter().copied().collect()
    }

    /// Applies a single command, the way a host forwards user interaction.
    pub fn apply(&mut self, command: PlotCommand) -> Result<(), DataError> {
        match command {
            PlotCommand::SetData(data) => self.set_data(data),
            PlotCommand::SetAttrX(name) => self.set_attr_x(&name)?,
            PlotCommand::SetAttrY(name) => self.set_attr_y(&name)?,
            PlotCommand::SetIntegrationMethod(method) => self.set_integration_method(method),
            PlotCommand::SetLowLimit(low) => self.integration.low_limit = Some(low),
            PlotCommand::SetHighLimit(high) => self.integration.high_limit = Some(high),
            PlotCommand::SetColorParameters(color) => self.set_color_parameters(color),
            PlotCommand::SelectSample(sample) => self.select_sample(sample),
        }
        Ok(())
    }

    /// Replaces the dataset.
    ///
    /// A dataset with a new layout resets the axis choice (to a remembered one, or to
    /// the first two coordinate columns). Integration limits outside the new spectral
    /// range are reset to its ends. The axis geometry is always inferred anew.
    pub fn set_data(&mut self, data: Option<Arc<HyperspectralData>>) {
        self.axis_cache = None;
        self.selected_sample = None;
        self.generation += 1;
        let Some(data) = data else {
            self.data = None;
            return;
        };

        let fingerprint = data.fingerprint();
        let same_domain = self.fingerprint.as_ref() == Some(&fingerprint);
        self.data = Some(data.clone());
        self.fingerprint = Some(fingerprint.clone());
        if !same_domain {
            self.init_attr_values(&data, &fingerprint);
        }
        self.init_limits(&data);
    }

    fn init_attr_values(&mut self, data: &HyperspectralData, fingerprint: &DatasetFingerprint) {
        let names = data.column_names();
        let known = |attr: &Option<String>| attr.as_deref().is_some_and(|a| names.contains(&a));
        let remembered = self
            .context
            .recall(fingerprint)
            .filter(|axes| known(&axes.attr_x) && known(&axes.attr_y));
        self.settings.axes = match remembered {
            Some(axes) => axes.clone(),
            None => {
                let attr_x = names.first().map(|n| n.to_string());
                let attr_y = names.get(1).map(|n| n.to_string()).or(attr_x.clone());
                AxisChoice { attr_x, attr_y }
            }
        };
        log::debug!("axes for {fingerprint}: {:?}", self.settings.axes);
    }

    fn init_limits(&mut self, data: &HyperspectralData) {
        let Some((min, max)) = data.spectral_range() else {
            return;
        };
        let inside = |limit: Option<f64>| limit.is_some_and(|l| min <= l && l <= max);
        if !inside(self.integration.low_limit) {
            self.integration.low_limit = Some(min);
        }
        if !inside(self.integration.high_limit) {
            self.integration.high_limit = Some(max);
        }
    }

    fn remember_axes(&mut self) {
        if let Some(fingerprint) = &self.fingerprint {
            self.context
                .remember(fingerprint.clone(), self.settings.axes.clone());
        }
    }

    fn check_column(&self, name: &str) -> Result<(), DataError> {
        match &self.data {
            Some(data) => data.column(name).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn set_attr_x(&mut self, name: &str) -> Result<(), DataError> {
        self.check_column(name)?;
        self.settings.axes.attr_x = Some(name.to_string());
        self.remember_axes();
        Ok(())
    }

    pub fn set_attr_y(&mut self, name: &str) -> Result<(), DataError> {
        self.check_column(name)?;
        self.settings.axes.attr_y = Some(name.to_string());
        self.remember_axes();
        Ok(())
    }

    pub fn set_integration_method(&mut self, method: IntegrationMethod) {
        self.integration.method = method;
    }

    /// Sets both window limits, in any order.
    pub fn set_limits(&mut self, a: f64, b: f64) {
        self.integration.low_limit = Some(a);
        self.integration.high_limit = Some(b);
    }

    pub fn set_color_parameters(&mut self, color: ColorParameters) {
        self.settings.color = color;
        self.update_color_schema();
    }

    pub fn select_sample(&mut self, sample: Option<usize>) {
        self.selected_sample = sample;
    }

    /// Rebuilds the color table, or keeps the previous one and raises a warning.
    fn update_color_schema(&mut self) {
        match ColorTable::with_default_palette(&self.settings.color) {
            Ok(table) => {
                self.color_table = table;
                self.warnings.remove(&Warning::ThresholdError);
                self.warnings.remove(&Warning::ColorParameterRange);
            }
            Err(err) => {
                log::warn!("color table not updated: {err}");
                let warning = match err {
                    ColorTableError::DegenerateThreshold { .. } => Warning::ThresholdError,
                    _ => Warning::ColorParameterRange,
                };
                self.warnings.insert(warning);
            }
        }
    }

    /// The integration window currently in effect.
    pub fn window(&self) -> IntegrationWindow {
        let spanning = self
            .data
            .as_ref()
            .and_then(|d| IntegrationWindow::spanning(d.wavenumbers.view()))
            .unwrap_or(IntegrationWindow { low: 0.0, high: 0.0 });
        IntegrationWindow::new(
            self.integration.low_limit.unwrap_or(spanning.low),
            self.integration.high_limit.unwrap_or(spanning.high),
        )
    }

    /// Axis geometry for the current dataset and axis choice, inferred on first use.
    fn axes(
        &mut self,
        data: &HyperspectralData,
    ) -> HyperspectraResult<Result<(AxisGeometry, AxisGeometry), GridError>> {
        if let Some(cache) = &self.axis_cache {
            if cache.generation == self.generation && cache.axes == self.settings.axes {
                return Ok(cache.geometry.clone());
            }
        }
        let (Some(attr_x), Some(attr_y)) = (&self.settings.axes.attr_x, &self.settings.axes.attr_y)
        else {
            return Ok(Err(GridError::EmptyAxis { axis: Axis::X }));
        };
        let x = data.coordinates(attr_x)?;
        let y = data.coordinates(attr_y)?;
        let geometry = match (crate::axis::infer(&x), crate::axis::infer(&y)) {
            (Some(x_axis), Some(y_axis)) => Ok((x_axis, y_axis)),
            (None, _) => Err(GridError::EmptyAxis { axis: Axis::X }),
            (Some(_), None) => Err(GridError::EmptyAxis { axis: Axis::Y }),
        };
        #[cfg(test)]
        {
            self.axis_inferences += 1;
        }
        self.axis_cache = Some(AxisCache {
            generation: self.generation,
            axes: self.settings.axes.clone(),
            geometry: geometry.clone(),
        });
        Ok(geometry)
    }

    fn clear_axis_warnings(&mut self) {
        self.warnings.remove(&Warning::EmptyAxis(Axis::X));
        self.warnings.remove(&Warning::EmptyAxis(Axis::Y));
        self.warnings.remove(&Warning::NoCoordinates);
    }

    /// Computes the frame for the current state.
    ///
    /// # Returns
    /// `Ok(None)` if there is nothing to draw: no dataset, no coordinate columns or an
    /// axis without any known position (the latter also raises a warning).
    pub fn show_data(&mut self) -> HyperspectraResult<Option<ImageFrame>> {
        let Some(data) = self.data.clone() else {
            self.clear_axis_warnings();
            return Ok(None);
        };
        let (Some(attr_x), Some(attr_y)) = (
            self.settings.axes.attr_x.clone(),
            self.settings.axes.attr_y.clone(),
        ) else {
            log::warn!("no image: the data has no coordinate columns");
            self.clear_axis_warnings();
            self.warnings.insert(Warning::NoCoordinates);
            return Ok(None);
        };

        let (x_axis, y_axis) = match self.axes(&data)? {
            Ok(axes) => axes,
            Err(GridError::EmptyAxis { axis }) => {
                log::warn!("no image: no valid {axis} coordinates");
                self.clear_axis_warnings();
                self.warnings.insert(Warning::EmptyAxis(axis));
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        self.clear_axis_warnings();

        let window = self.window();
        let method = self.integration.method;
        let values = integrate(&data, method, window)?;
        let markings = match self.selected_sample {
            Some(sample) => Some(draw_info(&data, sample, method, window)?),
            None => None,
        };

        let x = data.coordinates(&attr_x)?;
        let y = data.coordinates(&attr_y)?;
        let composed = compose_on_axes(&x, &y, &values.to_vec(), &x_axis, &y_axis)?;
        let levels = levels(&composed.image);
        self.update_color_schema();
        let rect = pixel_rect(&x_axis, &y_axis);

        Ok(Some(ImageFrame {
            composed,
            levels,
            rect,
            color_table: self.color_table.clone(),
            markings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_container::CoordinateColumn;
    use crate::error::HyperspectraError;
    use ndarray::{array, Array1, Array2};

    /// 2 x 2 scan, each spectrum is constant at its sample index + 1.
    fn scan(x: Array1<f64>, y: Array1<f64>) -> Arc<HyperspectralData> {
        let n = x.len();
        let spectra = Array2::from_shape_fn((n, 3), |(i, _)| i as f64 + 1.0);
        Arc::new(
            HyperspectralData::new(
                array![1.0, 2.0, 3.0],
                spectra,
                vec![CoordinateColumn::new("x", x), CoordinateColumn::new("y", y)],
            )
            .unwrap(),
        )
    }

    fn square() -> Arc<HyperspectralData> {
        scan(array![0.0, 0.0, 1.0, 1.0], array![0.0, 1.0, 0.0, 1.0])
    }

    #[test]
    fn test_no_data() {
        let mut plot = ImagePlot::default();
        assert_eq!(plot.show_data().unwrap(), None);
        plot.set_data(None);
        assert_eq!(plot.show_data().unwrap(), None);
    }

    #[test]
    fn test_show_data() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        assert_eq!(plot.settings().axes.attr_x.as_deref(), Some("x"));
        assert_eq!(plot.settings().axes.attr_y.as_deref(), Some("y"));
        assert_eq!(plot.integration().low_limit, Some(1.0));
        assert_eq!(plot.integration().high_limit, Some(3.0));

        let frame = plot.show_data().unwrap().unwrap();
        // integral of a constant over [1, 3]
        assert_eq!(frame.composed.image, array![[2.0, 6.0], [4.0, 8.0]]);
        assert_eq!(frame.levels, DisplayRange { low: 2.0, high: 8.0 });
        assert_eq!(frame.rect.left, -0.5);
        assert_eq!(frame.markings, None);
        assert!(plot.warnings().is_empty());
    }

    #[test]
    fn test_axes_are_reused_until_data_or_choice_changes() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        plot.show_data().unwrap();
        plot.set_limits(2.0, 1.0);
        plot.set_integration_method(IntegrationMethod::PeakMax);
        plot.set_color_parameters(ColorParameters {
            threshold_low: 0.1,
            threshold_high: 0.9,
            gamma: 3.0,
        });
        plot.show_data().unwrap();
        assert_eq!(plot.axis_inferences, 1);

        plot.set_attr_x("y").unwrap();
        plot.set_attr_y("x").unwrap();
        plot.show_data().unwrap();
        assert_eq!(plot.axis_inferences, 2);

        plot.set_data(Some(square()));
        plot.show_data().unwrap();
        assert_eq!(plot.axis_inferences, 3);
    }

    #[test]
    fn test_same_layout_keeps_axis_choice() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        plot.set_attr_x("y").unwrap();
        plot.set_data(Some(square()));
        assert_eq!(plot.settings().axes.attr_x.as_deref(), Some("y"));
    }

    #[test]
    fn test_context_restores_axis_choice() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        plot.set_attr_x("y").unwrap();
        plot.set_attr_y("x").unwrap();
        let context = plot.context_settings().clone();

        let mut reopened = ImagePlot::default();
        reopened.restore_context(&context);
        reopened.set_data(Some(square()));
        assert_eq!(reopened.settings().axes.attr_x.as_deref(), Some("y"));
        assert_eq!(reopened.settings().axes.attr_y.as_deref(), Some("x"));
    }

    #[test]
    fn test_unknown_column() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        assert_eq!(
            plot.apply(PlotCommand::SetAttrX("z".to_string())),
            Err(DataError::UnknownColumn("z".to_string()))
        );
        assert_eq!(plot.settings().axes.attr_x.as_deref(), Some("x"));
    }

    #[test]
    fn test_threshold_warning_keeps_previous_table() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        let before = plot.show_data().unwrap().unwrap().color_table;

        plot.set_color_parameters(ColorParameters {
            threshold_low: 0.7,
            threshold_high: 0.3,
            gamma: 0.0,
        });
        assert_eq!(plot.warnings(), vec![Warning::ThresholdError]);
        let frame = plot.show_data().unwrap().unwrap();
        assert_eq!(frame.color_table, before);

        plot.set_color_parameters(ColorParameters::default());
        assert!(plot.warnings().is_empty());
    }

    #[test]
    fn test_empty_axis_gives_no_image() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(scan(
            array![f64::NAN, f64::NAN],
            array![0.0, 1.0],
        )));
        assert_eq!(plot.show_data().unwrap(), None);
        assert_eq!(plot.warnings(), vec![Warning::EmptyAxis(Axis::X)]);

        plot.set_data(Some(square()));
        assert!(plot.show_data().unwrap().is_some());
        assert!(plot.warnings().is_empty());
    }

    #[test]
    fn test_data_without_columns_replaces_axis_warning() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(scan(array![f64::NAN, f64::NAN], array![0.0, 1.0])));
        assert_eq!(plot.show_data().unwrap(), None);
        assert_eq!(plot.warnings(), vec![Warning::EmptyAxis(Axis::X)]);

        let bare = HyperspectralData::new(array![1.0, 2.0], Array2::ones((2, 2)), vec![]).unwrap();
        plot.set_data(Some(Arc::new(bare)));
        assert_eq!(plot.settings().axes, AxisChoice::default());
        assert_eq!(plot.show_data().unwrap(), None);
        assert_eq!(plot.warnings(), vec![Warning::NoCoordinates]);

        plot.set_data(Some(square()));
        assert!(plot.show_data().unwrap().is_some());
        assert!(plot.warnings().is_empty());
    }

    #[test]
    fn test_single_column_used_for_both_axes() {
        let data = Arc::new(
            HyperspectralData::new(
                array![1.0, 2.0],
                Array2::ones((3, 2)),
                vec![CoordinateColumn::new("t", array![0.0, 1.0, 2.0])],
            )
            .unwrap(),
        );
        let mut plot = ImagePlot::default();
        plot.set_data(Some(data));
        let frame = plot.show_data().unwrap().unwrap();
        assert_eq!(frame.composed.image.dim(), (3, 3));
        assert_eq!(frame.composed.image[[1, 1]], 1.0);
        assert!(frame.composed.image[[0, 1]].is_nan());
    }

    #[test]
    fn test_selected_sample_markings() {
        let mut plot = ImagePlot::default();
        plot.set_data(Some(square()));
        plot.apply(PlotCommand::SelectSample(Some(2))).unwrap();
        plot.apply(PlotCommand::SetIntegrationMethod(IntegrationMethod::PeakMax))
            .unwrap();
        let frame = plot.show_data().unwrap().unwrap();
        let markings = frame.markings.unwrap();
        assert_eq!(markings.curve.unwrap().y, vec![3.0, 3.0, 3.0]);
        assert!(markings.line.is_some());

        plot.select_sample(Some(10));
        assert!(matches!(
            plot.show_data(),
            Err(HyperspectraError::Integrate(_))
        ));
    }

    #[test]
    fn test_limits_reset_when_outside_new_range() {
        let mut plot = ImagePlot::default();
        plot.set_limits(1.5, 100.0);
        plot.set_data(Some(square()));
        assert_eq!(plot.integration().low_limit, Some(1.5));
        assert_eq!(plot.integration().high_limit, Some(3.0));
        assert_eq!(plot.window(), IntegrationWindow { low: 1.5, high: 3.0 });
    }
}
