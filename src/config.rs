use crate::color_table::ColorParameters;
use crate::data_container::HyperspectralData;
use crate::integrate::IntegrationMethod;
use std::sync::Arc;

/// Changes a host (GUI, CLI, ...) can request from an [`ImagePlot`](crate::image_plot::ImagePlot).
#[derive(Clone, Debug)]
pub enum PlotCommand {
    SetData(Option<Arc<HyperspectralData>>),
    SetAttrX(String),
    SetAttrY(String),
    SetIntegrationMethod(IntegrationMethod),
    SetLowLimit(f64),
    SetHighLimit(f64),
    SetColorParameters(ColorParameters),
    SelectSample(Option<usize>),
}
