//! Rotate a corner set so the board's grid lines follow the image axes.
use scalebar_core::{strongest_line, LineVotingParams, Point};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Rectification could not determine a direction.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("need at least two points to estimate a direction, got {count}")]
    TooFewPoints { count: usize },
    #[error("no line found in {points} points")]
    NoDominantLine { points: usize },
}

/// Rotated points together with the applied angle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rectification {
    pub points: Vec<Point>,
    /// Board rotation in degrees, in `[-45, 45]`; the points were rotated by
    /// the negative of this angle.
    pub angle_deg: f64,
}

/// Direction of the best-supported line through `points`, in degrees within
/// `(-90, 90]`.
///
/// Points are translated to their minimum coordinate first. The reported
/// value is the angle of the line's normal; for a board whose grid lines run
/// at `a` degrees it is `a + 90` folded into range.
pub fn dominant_angle(points: &[Point], params: &LineVotingParams) -> Result<f64, RectifyError> {
    if points.len() < 2 {
        return Err(RectifyError::TooFewPoints {
            count: points.len(),
        });
    }

    let min_row = points.iter().map(|p| p.row).min().unwrap_or(0);
    let min_col = points.iter().map(|p| p.col).min().unwrap_or(0);
    let xy: Vec<_> = points
        .iter()
        .map(|p| Point::new(p.row - min_row, p.col - min_col).to_xy())
        .collect();

    let line = strongest_line(&xy, params).ok_or(RectifyError::NoDominantLine {
        points: points.len(),
    })?;
    log::debug!(
        "dominant line: theta={:.1}deg rho={} votes={}",
        line.theta_deg(),
        line.rho,
        line.votes
    );

    let theta = line.theta_deg();
    Ok(if theta > 90.0 { theta - 180.0 } else { theta })
}

/// Fold an angle onto the closer image axis so that `|angle| <= 45`.
pub fn fold_to_nearest_axis(angle_deg: f64) -> f64 {
    if angle_deg.abs() >= 45.0 {
        angle_deg.signum() * (angle_deg.abs() - 90.0)
    } else {
        angle_deg
    }
}

/// Rotate `points` about the origin by `-angle_deg`, rounding to the pixel
/// grid (ties to even).
pub fn rotate_points(points: &[Point], angle_deg: f64) -> Vec<Point> {
    let (s, c) = angle_deg.to_radians().sin_cos();
    points
        .iter()
        .map(|p| {
            let (r, q) = (p.row as f64, p.col as f64);
            let row = c * r - s * q;
            let col = s * r + c * q;
            Point::new(row.round_ties_even() as i32, col.round_ties_even() as i32)
        })
        .collect()
}

/// Estimate the board direction and rotate `points` to axis alignment.
///
/// Rotation never exceeds 45 degrees either way. Fails instead of falling
/// back to zero when no direction can be estimated.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(points = points.len()))
)]
pub fn rectify(points: &[Point], params: &LineVotingParams) -> Result<Rectification, RectifyError> {
    let angle = fold_to_nearest_axis(dominant_angle(points, params)?);
    Ok(Rectification {
        points: rotate_points(points, angle),
        angle_deg: angle,
    })
}
