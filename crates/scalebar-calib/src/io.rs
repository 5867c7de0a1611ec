//! JSON diagnostics for scale estimation runs.

use crate::params::ScaleParams;
use crate::region::{CropWindow, Position};
use crate::result::{ScaleFailure, ScaleResult};
use scalebar_core::Point;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ScalebarIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Serializable summary of a [`ScaleResult`], without pixel buffers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleReport {
    pub position: Position,
    pub square_unit: f64,
    pub window: CropWindow,
    pub scale: Option<f64>,
    pub spacing: Option<f64>,
    pub failure: Option<ScaleFailure>,
    pub detected_corners: Option<Vec<Point>>,
    pub filter_mask: Option<Vec<bool>>,
    pub rectification_angle: Option<f64>,
    pub final_corners: Option<Vec<Point>>,
}

impl ScaleReport {
    pub fn new(result: &ScaleResult, params: &ScaleParams) -> Self {
        let inter = &result.intermediate;
        Self {
            position: params.crop.position,
            square_unit: params.square_unit,
            window: inter.window,
            scale: result.scale,
            spacing: inter.spacing,
            failure: result.failure,
            detected_corners: inter.detected_corners.clone(),
            filter_mask: inter.filter_mask.clone(),
            rectification_angle: inter.rectification_angle,
            final_corners: inter.final_corners.clone(),
        }
    }

    /// Load a report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScalebarIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScalebarIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
