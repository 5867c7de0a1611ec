//! Checkerboard scale-bar calibration.
//!
//! Estimates how many pixels one physical unit spans from a photograph that
//! contains a checkerboard scale bar:
//!
//! 1. [`Position::crop`] cuts the region expected to hold the bar.
//! 2. A [`scalebar_corners::CornerDetector`] finds corner candidates.
//! 3. [`filter_corners`] optionally drops candidates on flat background.
//! 4. [`rectify`] optionally rotates the corners to axis alignment.
//! 5. [`optimal_distance`] recovers the lattice spacing from the pairwise
//!    City-block distances, and the scale is `spacing / square_unit`.
//!
//! [`ScaleEstimator`] runs the whole chain and keeps every intermediate
//! artifact for diagnostics.
//!
//! ## Quickstart
//!
//! ```
//! use scalebar_calib::{ScaleEstimator, ScaleParams};
//! use scalebar_core::GrayImage;
//!
//! let img = GrayImage::filled(64, 64, 255);
//! let result = ScaleEstimator::new(ScaleParams::default())
//!     .estimate(&img.view())
//!     .unwrap();
//! assert!(result.scale.is_none());
//! ```

mod binarize;
mod filter;
mod io;
mod locate;
mod params;
mod rectify;
mod region;
mod result;
mod scale;
mod spacing;

pub use binarize::{binarize, otsu_threshold, Histogram};
pub use filter::{filter_corners, window_variance, FilterParams, VarianceThreshold};
pub use io::{ScaleReport, ScalebarIoError};
pub use locate::{locate_position, position_scores, LocateParams};
pub use params::{CropParams, ScaleParams};
pub use rectify::{
    dominant_angle, fold_to_nearest_axis, rectify, rotate_points, Rectification, RectifyError,
};
pub use region::{CropFraction, CropWindow, Position, RegionError};
pub use result::{Intermediate, ScaleFailure, ScaleResult};
pub use scale::{get_scale, normalize_corners, ScaleError, ScaleEstimator};
pub use spacing::{optimal_distance, percentile, spacing_score, SpacingParams};
