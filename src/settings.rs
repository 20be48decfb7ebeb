//! Persistent settings.
//!
//! Color and integration parameters are global. The choice of coordinate columns is
//! remembered per dataset layout, keyed by the dataset fingerprint, so reopening a file
//! with the same columns restores the axes that were used last time.

use crate::color_table::ColorParameters;
use crate::data_container::DatasetFingerprint;
use crate::integrate::IntegrationMethod;
use home::home_dir;
use preferences::AppInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const APP_INFO: AppInfo = AppInfo {
    name: "Hyperspectra",
    author: "Linus Leo Stöckli",
};

/// Key under which [`AppSettings`] are stored.
pub const PREFS_KEY: &str = "config/hyperspectra";

/// Coordinate columns used as image axes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisChoice {
    pub attr_x: Option<String>,
    pub attr_y: Option<String>,
}

/// Everything that determines how the image is drawn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub axes: AxisChoice,
    pub color: ColorParameters,
}

/// Integration method and window limits; `None` limits follow the spectral range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub method: IntegrationMethod,
    pub low_limit: Option<f64>,
    pub high_limit: Option<f64>,
}

/// Axis choices remembered per dataset layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSettings {
    pub contexts: BTreeMap<DatasetFingerprint, AxisChoice>,
}

impl ContextSettings {
    pub fn remember(&mut self, fingerprint: DatasetFingerprint, axes: AxisChoice) {
        self.contexts.insert(fingerprint, axes);
    }

    pub fn recall(&self, fingerprint: &DatasetFingerprint) -> Option<&AxisChoice> {
        self.contexts.get(fingerprint)
    }
}

/// Settings stored between runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub output_dir: PathBuf,
    pub color: ColorParameters,
    pub integration: IntegrationSettings,
    pub context: ContextSettings,
}

impl AppSettings {
    pub fn new() -> AppSettings {
        AppSettings {
            output_dir: home_dir().unwrap_or_else(|| PathBuf::from("/")),
            color: ColorParameters::default(),
            integration: IntegrationSettings::default(),
            context: ContextSettings::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings::new()
    }
}
