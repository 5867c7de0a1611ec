use crate::region::CropWindow;
use scalebar_core::{GrayImage, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected reasons for not finding a scale. These are ordinary outcomes on
/// unsuitable images, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFailure {
    /// The detector found no corner candidates in the crop.
    DetectionEmpty,
    /// Fewer than two corners remained, so no distances exist.
    InsufficientGeometry,
    /// No spacing candidate in the search range could be evaluated.
    NoLatticeFound,
}

impl fmt::Display for ScaleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScaleFailure::DetectionEmpty => "no corners detected",
            ScaleFailure::InsufficientGeometry => "fewer than two usable corners",
            ScaleFailure::NoLatticeFound => "no lattice spacing found",
        })
    }
}

/// Artifacts of every pipeline stage, filled as far as the run got.
#[derive(Clone, Debug)]
pub struct Intermediate {
    /// Crop window in source image coordinates.
    pub window: CropWindow,
    /// Grayscale crop as cut from the source.
    pub init_crop: GrayImage,
    /// Crop the detector ran on (binarised if requested).
    pub crop: GrayImage,
    /// Detector output in `(row, col)` order, `None` when nothing was found.
    pub detected_corners: Option<Vec<Point>>,
    /// Keep mask aligned with `detected_corners`.
    pub filter_mask: Option<Vec<bool>>,
    /// Applied rotation in degrees; `0` when rectification is disabled.
    pub rectification_angle: Option<f64>,
    /// Corners the distances were measured on.
    pub final_corners: Option<Vec<Point>>,
    /// Lattice spacing in pixels.
    pub spacing: Option<f64>,
}

impl Intermediate {
    pub(crate) fn new(window: CropWindow, init_crop: GrayImage, crop: GrayImage) -> Self {
        Self {
            window,
            init_crop,
            crop,
            detected_corners: None,
            filter_mask: None,
            rectification_angle: None,
            final_corners: None,
            spacing: None,
        }
    }
}

/// Outcome of one scale estimation.
#[derive(Clone, Debug)]
pub struct ScaleResult {
    /// Pixels per physical unit, or `None` when no scale could be found.
    pub scale: Option<f64>,
    /// Why `scale` is `None`.
    pub failure: Option<ScaleFailure>,
    pub intermediate: Intermediate,
}

impl ScaleResult {
    pub(crate) fn found(scale: f64, intermediate: Intermediate) -> Self {
        Self {
            scale: Some(scale),
            failure: None,
            intermediate,
        }
    }

    pub(crate) fn absent(failure: ScaleFailure, intermediate: Intermediate) -> Self {
        Self {
            scale: None,
            failure: Some(failure),
            intermediate,
        }
    }
}
