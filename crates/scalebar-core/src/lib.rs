//! Core types and utilities for checkerboard scale-bar calibration.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete corner detector or on the `image` crate; callers
//! hand in borrowed grayscale buffers through [`GrayImageView`].

mod image;
mod line_voting;
mod logger;
mod pattern;
mod point;

pub use image::{pixel_clamped, sample_bilinear, GrayImage, GrayImageView};
pub use line_voting::{strongest_line, vote_lines, LineAccumulator, LineVotingParams, VotedLine};
pub use pattern::{checkerboard_pattern, paint_checkerboard, BoardPlacement};
pub use point::{pairwise_cityblock, Point};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
