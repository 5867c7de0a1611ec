use crate::peaks::{enforce_separation, local_maxima, Separation};
use crate::response::{shi_tomasi_response, ResponseMap};
use crate::{AxisOrder, CornerDetector};
use scalebar_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the Shi-Tomasi peak detector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShiTomasiParams {
    /// Keep at most this many peaks, strongest first. `None` keeps all.
    pub max_corners: Option<usize>,
    /// Peak suppression radius and chessboard separation, in pixels.
    pub min_distance: usize,
    /// Standard deviation of the Gaussian structure-tensor window.
    pub sigma: f32,
    /// Peaks weaker than `threshold_rel * max_response` are dropped.
    pub threshold_rel: f32,
    /// Ignore peaks closer than `min_distance` to the image border.
    pub exclude_border: bool,
}

impl Default for ShiTomasiParams {
    fn default() -> Self {
        Self {
            max_corners: None,
            min_distance: 5,
            sigma: 1.0,
            threshold_rel: 0.1,
            exclude_border: true,
        }
    }
}

/// Integer local maxima of the Shi-Tomasi response.
///
/// Reports `(row, col)` coordinates.
#[derive(Clone, Debug, Default)]
pub struct ShiTomasiDetector {
    params: ShiTomasiParams,
}

impl ShiTomasiDetector {
    pub fn new(params: ShiTomasiParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ShiTomasiParams {
        &self.params
    }

    pub fn response(&self, img: &GrayImageView<'_>) -> ResponseMap {
        shi_tomasi_response(img, self.params.sigma)
    }
}

impl CornerDetector for ShiTomasiDetector {
    fn axis_order(&self) -> AxisOrder {
        AxisOrder::RowCol
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = img.width, height = img.height))
    )]
    fn detect(&self, img: &GrayImageView<'_>) -> Vec<[f32; 2]> {
        let resp = self.response(img);
        let max = resp.max();
        if max <= 0.0 {
            return Vec::new();
        }

        let p = &self.params;
        let threshold = p.threshold_rel.max(0.0) * max;
        let border = if p.exclude_border { p.min_distance } else { 0 };
        let raw = local_maxima(&resp, p.min_distance.max(1), threshold, border);
        let peaks = enforce_separation(
            raw,
            p.min_distance as f32,
            Separation::Chebyshev,
            p.max_corners,
        );
        log::debug!("shi-tomasi: {} peaks", peaks.len());
        peaks
            .into_iter()
            .map(|pk| [pk.y as f32, pk.x as f32])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebar_core::{checkerboard_pattern, GrayImage};

    #[test]
    fn reports_row_col_near_inner_vertices() {
        // Inner vertices at 19.5 + 10k in both axes.
        let img = checkerboard_pattern(4, 4, 10, Some(10));
        let peaks = ShiTomasiDetector::default().detect(&img.view());
        assert!(!peaks.is_empty());
        for (r, c) in [(19.5, 19.5), (19.5, 39.5), (39.5, 29.5)] {
            assert!(
                peaks
                    .iter()
                    .any(|p| (p[0] - r).abs() <= 1.5 && (p[1] - c).abs() <= 1.5),
                "no peak near ({r}, {c}) in {peaks:?}"
            );
        }
    }

    #[test]
    fn axis_order_is_row_col() {
        // A single dark block in the upper right: its lower-left corner is at
        // row ~25, col ~30, so the first coordinate must be the smaller one.
        let img = GrayImage::from_fn(60, 60, |x, y| if x >= 30 && y < 25 { 0 } else { 255 });
        let peaks = ShiTomasiDetector::default().detect(&img.view());
        assert_eq!(peaks.len(), 1, "{peaks:?}");
        assert!((peaks[0][0] - 24.5).abs() <= 1.5);
        assert!((peaks[0][1] - 29.5).abs() <= 1.5);
    }

    #[test]
    fn blank_image_yields_nothing() {
        let img = GrayImage::filled(30, 30, 0);
        assert!(ShiTomasiDetector::default().detect(&img.view()).is_empty());
    }
}
