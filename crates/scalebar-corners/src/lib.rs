//! Corner detectors for scale-bar calibration.
//!
//! Every detector implements [`CornerDetector`]: it takes a borrowed
//! grayscale view and returns raw coordinate pairs together with the axis
//! order it reports them in. Callers normalise to `(row, col)` themselves,
//! which keeps detectors interchangeable.
//!
//! Two strategies are provided:
//! - [`GoodFeaturesDetector`]: strongest minimum-eigenvalue corners with
//!   iterative sub-pixel refinement, reported as `(x, y)`.
//! - [`ShiTomasiDetector`]: integer Shi-Tomasi response peaks, reported as
//!   `(row, col)`.

mod good_features;
mod peaks;
mod response;
mod shi_tomasi;
mod subpix;

pub use good_features::{GoodFeaturesDetector, GoodFeaturesParams};
pub use peaks::{enforce_separation, local_maxima, Peak, Separation};
pub use response::{min_eigen_response, shi_tomasi_response, ResponseMap};
pub use shi_tomasi::{ShiTomasiDetector, ShiTomasiParams};
pub use subpix::{refine_corner, refine_corners, SubPixParams};

use scalebar_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// Order of the two components in a detector's output pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `(x, y)`, i.e. `(col, row)`.
    Xy,
    /// `(row, col)`.
    RowCol,
}

impl AxisOrder {
    /// Reorder a raw pair into `(row, col)`.
    #[inline]
    pub fn to_row_col(self, pair: [f32; 2]) -> [f32; 2] {
        match self {
            AxisOrder::Xy => [pair[1], pair[0]],
            AxisOrder::RowCol => pair,
        }
    }
}

/// A corner detection strategy.
pub trait CornerDetector {
    /// Axis order of the pairs returned by [`CornerDetector::detect`].
    fn axis_order(&self) -> AxisOrder;

    /// Detect corners in `img`. An image without corners yields an empty vec.
    fn detect(&self, img: &GrayImageView<'_>) -> Vec<[f32; 2]>;
}

impl<D: CornerDetector + ?Sized> CornerDetector for Box<D> {
    fn axis_order(&self) -> AxisOrder {
        (**self).axis_order()
    }

    fn detect(&self, img: &GrayImageView<'_>) -> Vec<[f32; 2]> {
        (**self).detect(img)
    }
}

/// Serializable choice of detector and its parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CornerDetectorConfig {
    GoodFeatures(GoodFeaturesParams),
    ShiTomasi(ShiTomasiParams),
}

impl Default for CornerDetectorConfig {
    fn default() -> Self {
        Self::GoodFeatures(GoodFeaturesParams::default())
    }
}

impl CornerDetectorConfig {
    pub fn build(&self) -> Box<dyn CornerDetector + Send + Sync> {
        match self {
            Self::GoodFeatures(p) => Box::new(GoodFeaturesDetector::new(p.clone())),
            Self::ShiTomasi(p) => Box::new(ShiTomasiDetector::new(p.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GoodFeatures(_) => "good_features",
            Self::ShiTomasi(_) => "shi_tomasi",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_order_normalises_to_row_col() {
        assert_eq!(AxisOrder::Xy.to_row_col([3.0, 7.0]), [7.0, 3.0]);
        assert_eq!(AxisOrder::RowCol.to_row_col([3.0, 7.0]), [3.0, 7.0]);
    }

    #[test]
    fn config_builds_matching_detector() {
        let gf = CornerDetectorConfig::default().build();
        assert_eq!(gf.axis_order(), AxisOrder::Xy);
        let st = CornerDetectorConfig::ShiTomasi(ShiTomasiParams::default()).build();
        assert_eq!(st.axis_order(), AxisOrder::RowCol);
    }

    #[test]
    fn config_is_tagged_by_kind() {
        let cfg: CornerDetectorConfig =
            serde_json::from_str(r#"{"kind":"shi_tomasi","min_distance":3}"#).unwrap();
        match cfg {
            CornerDetectorConfig::ShiTomasi(p) => {
                assert_eq!(p.min_distance, 3);
                assert_eq!(p.sigma, 1.0);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }
}
