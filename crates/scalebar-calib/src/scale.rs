//! Scale estimation pipeline: crop, detect, filter, rectify, measure.
use crate::binarize::binarize;
use crate::filter::filter_corners;
use crate::params::ScaleParams;
use crate::rectify::{rectify, RectifyError};
use crate::region::RegionError;
use crate::result::{Intermediate, ScaleFailure, ScaleResult};
use crate::spacing::optimal_distance;
use scalebar_core::{pairwise_cityblock, GrayImageView, Point};
use scalebar_corners::{AxisOrder, CornerDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors that stop an estimation. Expected "no scale" outcomes are reported
/// through [`ScaleResult::failure`] instead.
#[derive(thiserror::Error, Debug)]
pub enum ScaleError {
    #[error("square unit must be positive and finite, got {0}")]
    InvalidSquareUnit(f64),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error(transparent)]
    Rectify(#[from] RectifyError),
}

/// Convert raw detector pairs into integer `(row, col)` points.
///
/// Sub-pixel coordinates are truncated towards negative infinity; non-finite
/// pairs are dropped.
pub fn normalize_corners(raw: &[[f32; 2]], order: AxisOrder) -> Vec<Point> {
    raw.iter()
        .map(|&pair| order.to_row_col(pair))
        .filter(|[r, c]| r.is_finite() && c.is_finite())
        .map(|[r, c]| Point::new(r.floor() as i32, c.floor() as i32))
        .collect()
}

/// Stateless scale estimator bound to a parameter set and a corner detector.
pub struct ScaleEstimator {
    params: ScaleParams,
    detector: Box<dyn CornerDetector + Send + Sync>,
}

impl ScaleEstimator {
    /// Estimator using the detector described by `params.detector`.
    pub fn new(params: ScaleParams) -> Self {
        let detector = params.detector.build();
        Self { params, detector }
    }

    /// Replace the configured detector with a custom implementation.
    pub fn with_detector(mut self, detector: impl CornerDetector + Send + Sync + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    #[inline]
    pub fn params(&self) -> &ScaleParams {
        &self.params
    }

    #[inline]
    pub fn detector(&self) -> &(dyn CornerDetector + Send + Sync) {
        self.detector.as_ref()
    }

    /// Estimate pixels per unit from a full grayscale image.
    ///
    /// Returns `Err` only for invalid input or a failed rectification; a
    /// missing scale is a normal [`ScaleResult`] with `scale: None`.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, img),
            fields(width = img.width, height = img.height, position = %self.params.crop.position)
        )
    )]
    pub fn estimate(&self, img: &GrayImageView<'_>) -> Result<ScaleResult, ScaleError> {
        let p = &self.params;
        if !(p.square_unit.is_finite() && p.square_unit > 0.0) {
            return Err(ScaleError::InvalidSquareUnit(p.square_unit));
        }

        let window = p
            .crop
            .position
            .window(img.width, img.height, p.crop.fraction, p.crop.square)?;
        let init_crop = window.extract(img);
        let crop = if p.binarize {
            binarize(&init_crop.view(), p.blur_sigma)
        } else {
            init_crop.clone()
        };
        log::debug!(
            "crop {} at ({}, {}) size {}x{}",
            p.crop.position,
            window.x0,
            window.y0,
            window.width,
            window.height
        );

        let raw = if crop.view().is_empty() {
            Vec::new()
        } else {
            self.detector.detect(&crop.view())
        };
        let detected = normalize_corners(&raw, self.detector.axis_order());
        let mut inter = Intermediate::new(window, init_crop, crop);
        if detected.is_empty() {
            log::warn!("no corners detected in {} crop", p.crop.position);
            return Ok(ScaleResult::absent(ScaleFailure::DetectionEmpty, inter));
        }
        log::debug!("detected {} corners", detected.len());

        let mask = if p.filter_corners {
            filter_corners(&detected, &inter.crop.view(), &p.filter)
        } else {
            vec![true; detected.len()]
        };
        let kept: Vec<Point> = detected
            .iter()
            .zip(&mask)
            .filter_map(|(&pt, &keep)| keep.then_some(pt))
            .collect();
        inter.detected_corners = Some(detected);
        inter.filter_mask = Some(mask);

        if kept.len() < 2 {
            log::warn!("only {} corner(s) left after filtering", kept.len());
            return Ok(ScaleResult::absent(ScaleFailure::InsufficientGeometry, inter));
        }

        let (corners, angle) = if p.rectify_corners {
            let rect = rectify(&kept, &p.line_voting)?;
            (rect.points, rect.angle_deg)
        } else {
            (kept, 0.0)
        };
        log::debug!("rectification angle {angle:.2}deg");
        inter.rectification_angle = Some(angle);

        let distances = pairwise_cityblock(&corners);
        inter.final_corners = Some(corners);

        let Some(spacing) = optimal_distance(&distances, &p.spacing) else {
            log::warn!("no lattice spacing found in {} distances", distances.len());
            return Ok(ScaleResult::absent(ScaleFailure::NoLatticeFound, inter));
        };
        inter.spacing = Some(spacing);

        let scale = spacing / p.square_unit;
        log::info!("spacing {spacing:.3}px, scale {scale:.6} px/unit");
        Ok(ScaleResult::found(scale, inter))
    }
}

/// One-shot estimation with `params`, returning only the scale.
pub fn get_scale(img: &GrayImageView<'_>, params: &ScaleParams) -> Result<Option<f64>, ScaleError> {
    Ok(ScaleEstimator::new(params.clone()).estimate(img)?.scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{CropFraction, Position};
    use scalebar_core::GrayImage;

    /// Reports a fixed list of `(x, y)` corners regardless of the image.
    struct FixedCorners(Vec<[f32; 2]>);

    impl CornerDetector for FixedCorners {
        fn axis_order(&self) -> AxisOrder {
            AxisOrder::Xy
        }

        fn detect(&self, _img: &GrayImageView<'_>) -> Vec<[f32; 2]> {
            self.0.clone()
        }
    }

    fn lattice_xy(n: usize, step: f32) -> Vec<[f32; 2]> {
        let mut out = Vec::new();
        for r in 0..n {
            for c in 0..n {
                out.push([5.0 + c as f32 * step + 0.7, 3.0 + r as f32 * step + 0.2]);
            }
        }
        out
    }

    fn full_frame() -> ScaleParams {
        ScaleParams {
            crop: crate::params::CropParams {
                position: Position::TopLeft,
                fraction: CropFraction::Uniform(1.0),
                square: false,
            },
            ..ScaleParams::default()
        }
    }

    #[test]
    fn normalisation_swaps_and_truncates() {
        let pts = normalize_corners(&[[3.9, 7.2], [f32::NAN, 1.0]], AxisOrder::Xy);
        assert_eq!(pts, vec![Point::new(7, 3)]);
        let pts = normalize_corners(&[[3.9, 7.2]], AxisOrder::RowCol);
        assert_eq!(pts, vec![Point::new(3, 7)]);
    }

    #[test]
    fn scale_is_spacing_over_unit() {
        let img = GrayImage::filled(100, 100, 255);
        let params = ScaleParams {
            square_unit: 2.0,
            ..full_frame()
        };
        let est = ScaleEstimator::new(params).with_detector(FixedCorners(lattice_xy(5, 12.0)));
        let res = est.estimate(&img.view()).unwrap();
        assert_eq!(res.failure, None);
        assert_eq!(res.intermediate.spacing, Some(12.0));
        assert_eq!(res.scale, Some(6.0));
        assert_eq!(res.intermediate.rectification_angle, Some(0.0));
        assert_eq!(res.intermediate.filter_mask.as_ref().map(Vec::len), Some(25));
        assert_eq!(res.intermediate.detected_corners.as_ref().map(|c| c[0]), Some(Point::new(3, 5)));
    }

    #[test]
    fn no_corners_is_a_normal_absence() {
        let img = GrayImage::filled(50, 50, 128);
        let est = ScaleEstimator::new(full_frame()).with_detector(FixedCorners(Vec::new()));
        let res = est.estimate(&img.view()).unwrap();
        assert_eq!(res.scale, None);
        assert_eq!(res.failure, Some(ScaleFailure::DetectionEmpty));
        assert!(res.intermediate.detected_corners.is_none());
        assert_eq!(res.intermediate.crop.width, 50);
    }

    #[test]
    fn single_corner_is_insufficient_geometry() {
        let img = GrayImage::filled(50, 50, 128);
        let params = ScaleParams {
            rectify_corners: true,
            ..full_frame()
        };
        let est = ScaleEstimator::new(params).with_detector(FixedCorners(vec![[4.0, 4.0]]));
        let res = est.estimate(&img.view()).unwrap();
        assert_eq!(res.failure, Some(ScaleFailure::InsufficientGeometry));
        assert!(res.intermediate.rectification_angle.is_none());
    }

    #[test]
    fn two_corners_find_no_lattice() {
        let img = GrayImage::filled(50, 50, 128);
        let est = ScaleEstimator::new(full_frame())
            .with_detector(FixedCorners(vec![[4.0, 4.0], [14.0, 4.0]]));
        let res = est.estimate(&img.view()).unwrap();
        assert_eq!(res.failure, Some(ScaleFailure::NoLatticeFound));
        assert_eq!(res.intermediate.final_corners.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn failed_rectification_is_an_error() {
        let img = GrayImage::filled(50, 50, 128);
        let params = ScaleParams {
            rectify_corners: true,
            ..full_frame()
        };
        let est = ScaleEstimator::new(params)
            .with_detector(FixedCorners(vec![[0.0, 0.0], [500.0, 500.0]]));
        assert!(matches!(
            est.estimate(&img.view()),
            Err(ScaleError::Rectify(RectifyError::NoDominantLine { points: 2 }))
        ));
    }

    #[test]
    fn invalid_inputs_are_errors() {
        let img = GrayImage::filled(50, 50, 128);
        let bad_unit = ScaleParams {
            square_unit: 0.0,
            ..full_frame()
        };
        assert!(matches!(
            ScaleEstimator::new(bad_unit).estimate(&img.view()),
            Err(ScaleError::InvalidSquareUnit(_))
        ));

        let mut unspecified = full_frame();
        unspecified.crop.position = Position::Unspecified;
        assert!(matches!(
            get_scale(&img.view(), &unspecified),
            Err(ScaleError::Region(RegionError::UnsupportedPosition))
        ));
    }
}
