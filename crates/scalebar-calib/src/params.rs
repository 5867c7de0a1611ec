use crate::filter::FilterParams;
use crate::io::ScalebarIoError;
use crate::region::{CropFraction, Position};
use crate::spacing::SpacingParams;
use scalebar_core::LineVotingParams;
use scalebar_corners::CornerDetectorConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Which part of the image holds the scale bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParams {
    pub position: Position,
    pub fraction: CropFraction,
    /// Force a square crop using the smaller of the two extents.
    pub square: bool,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            position: Position::TopRight,
            fraction: CropFraction::Uniform(0.2),
            square: false,
        }
    }
}

/// Full parameter set of one scale estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    pub crop: CropParams,
    /// Physical side length of one checkerboard cell (e.g. in mm).
    pub square_unit: f64,
    pub detector: CornerDetectorConfig,
    /// Drop corners on flat background before measuring.
    pub filter_corners: bool,
    pub filter: FilterParams,
    /// Rotate corners to axis alignment before measuring.
    pub rectify_corners: bool,
    pub line_voting: LineVotingParams,
    /// Blur and Otsu-threshold the crop before detection.
    pub binarize: bool,
    pub blur_sigma: f32,
    pub spacing: SpacingParams,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            crop: CropParams::default(),
            square_unit: 1.0,
            detector: CornerDetectorConfig::default(),
            filter_corners: false,
            filter: FilterParams::default(),
            rectify_corners: false,
            line_voting: LineVotingParams::default(),
            binarize: false,
            blur_sigma: 1.1,
            spacing: SpacingParams::default(),
        }
    }
}

impl ScaleParams {
    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScalebarIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write parameters as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScalebarIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
