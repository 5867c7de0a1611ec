use crate::peaks::{enforce_separation, local_maxima, Separation};
use crate::response::{min_eigen_response, ResponseMap};
use crate::subpix::{refine_corners, SubPixParams};
use crate::{AxisOrder, CornerDetector};
use nalgebra::Point2;
use scalebar_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the minimum-eigenvalue "good features" detector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoodFeaturesParams {
    /// Keep at most this many corners, strongest first. `None` keeps all.
    pub max_corners: Option<usize>,
    /// Corners weaker than `quality_level * max_response` are dropped.
    pub quality_level: f32,
    /// Minimum euclidean distance between returned corners, in pixels.
    pub min_distance: f32,
    /// Side of the structure-tensor summation window.
    pub block_size: usize,
    /// Sub-pixel refinement; `None` returns integer peak positions.
    pub refine: Option<SubPixParams>,
}

impl Default for GoodFeaturesParams {
    fn default() -> Self {
        Self {
            max_corners: None,
            quality_level: 0.5,
            min_distance: 5.0,
            block_size: 3,
            refine: Some(SubPixParams::default()),
        }
    }
}

/// Strongest minimum-eigenvalue corners, refined to sub-pixel accuracy.
///
/// Reports `(x, y)` coordinates.
#[derive(Clone, Debug, Default)]
pub struct GoodFeaturesDetector {
    params: GoodFeaturesParams,
}

impl GoodFeaturesDetector {
    pub fn new(params: GoodFeaturesParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GoodFeaturesParams {
        &self.params
    }

    pub fn response(&self, img: &GrayImageView<'_>) -> ResponseMap {
        min_eigen_response(img, self.params.block_size)
    }

    /// Integer peak positions before refinement, strongest first.
    pub fn peaks(&self, img: &GrayImageView<'_>) -> Vec<Point2<f32>> {
        let resp = self.response(img);
        let max = resp.max();
        if max <= 0.0 {
            return Vec::new();
        }
        let threshold = self.params.quality_level.max(0.0) * max;
        let raw = local_maxima(&resp, 1, threshold, 0);
        enforce_separation(
            raw,
            self.params.min_distance,
            Separation::Euclidean,
            self.params.max_corners,
        )
        .into_iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect()
    }
}

impl CornerDetector for GoodFeaturesDetector {
    fn axis_order(&self) -> AxisOrder {
        AxisOrder::Xy
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = img.width, height = img.height))
    )]
    fn detect(&self, img: &GrayImageView<'_>) -> Vec<[f32; 2]> {
        let mut corners = self.peaks(img);
        if let Some(refine) = &self.params.refine {
            refine_corners(img, &mut corners, refine);
        }
        log::debug!("good features: {} corners", corners.len());
        corners.into_iter().map(|p| [p.x, p.y]).collect()
    }
}
