//! Facade crate for the `scalebar-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, corner detection and calibration crates
//! - (feature-gated) helpers that run the whole estimation on an
//!   `image::GrayImage` or an image file
//! - the `scalebar` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use scalebar::detect;
//! use scalebar::calib::{CropFraction, ScaleParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = detect::load_gray("specimen.jpg")?;
//! let mut params = ScaleParams::default();
//! params.crop.fraction = CropFraction::Uniform(0.3);
//! params.square_unit = 1.0; // mm per checkerboard cell
//!
//! let result = detect::estimate_scale(&img, &params)?;
//! match result.scale {
//!     Some(px_per_mm) => println!("{px_per_mm:.3} px/mm"),
//!     None => println!("no scale estimated"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `scalebar::core`: points, grayscale views, line voting, synthetic boards.
//! - `scalebar::corners`: the `CornerDetector` trait and both detectors.
//! - `scalebar::calib`: crop regions, filtering, rectification, spacing search,
//!   the scale estimator and JSON config/report helpers.
//! - `scalebar::detect` (feature `image`): end-to-end helpers on images.

pub use scalebar_calib as calib;
pub use scalebar_core as core;
pub use scalebar_corners as corners;

pub use scalebar_calib::{
    CropFraction, Position, ScaleEstimator, ScaleFailure, ScaleParams, ScaleReport, ScaleResult,
};
pub use scalebar_core::Point;
pub use scalebar_corners::{CornerDetector, CornerDetectorConfig};

#[cfg(feature = "image")]
pub mod detect;
