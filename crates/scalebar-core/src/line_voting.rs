//! Straight-line voting over a point cloud.
//!
//! Every point votes for all `(theta, rho)` cells of the lines passing
//! through it, with `rho = x cos(theta) + y sin(theta)`. Theta covers
//! `[0, π)` in fixed steps; rho is limited to `[rho_min, rho_max]`, so
//! points whose line distance falls outside the range simply do not vote.
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Accumulator resolution and acceptance threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineVotingParams {
    /// Angular resolution in degrees (2° gives 90 direction bins).
    pub theta_step_deg: f64,
    pub rho_min: f64,
    pub rho_max: f64,
    pub rho_step: f64,
    /// Minimal number of votes for a line to be reported. A single point
    /// always votes for some cell, so values below 2 are raised to 2.
    pub min_votes: usize,
}

impl Default for LineVotingParams {
    fn default() -> Self {
        Self {
            theta_step_deg: 2.0,
            rho_min: 0.0,
            rho_max: 360.0,
            rho_step: 1.0,
            min_votes: 2,
        }
    }
}

/// A line in normal form together with its support.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VotedLine {
    pub votes: usize,
    pub rho: f64,
    /// Normal direction in radians, in `[0, π)`.
    pub theta: f64,
}

impl VotedLine {
    /// Normal direction in degrees, in `[0, 180)`.
    pub fn theta_deg(&self) -> f64 {
        self.theta.to_degrees()
    }
}

/// Filled vote table, theta-major.
#[derive(Clone, Debug)]
pub struct LineAccumulator {
    pub num_theta: usize,
    pub num_rho: usize,
    pub votes: Vec<u32>,
    theta_step: f64,
    rho_min: f64,
    rho_step: f64,
}

impl LineAccumulator {
    pub fn theta_at(&self, t: usize) -> f64 {
        t as f64 * self.theta_step
    }

    pub fn rho_at(&self, r: usize) -> f64 {
        self.rho_min + r as f64 * self.rho_step
    }

    /// Cell with the most votes; on ties the smallest theta, then the
    /// smallest rho wins.
    pub fn best(&self) -> Option<VotedLine> {
        let mut best: Option<(usize, u32)> = None;
        for (idx, &v) in self.votes.iter().enumerate() {
            if v == 0 {
                continue;
            }
            if best.is_none_or(|(_, bv)| v > bv) {
                best = Some((idx, v));
            }
        }
        best.map(|(idx, v)| VotedLine {
            votes: v as usize,
            rho: self.rho_at(idx % self.num_rho),
            theta: self.theta_at(idx / self.num_rho),
        })
    }
}

/// Fill the vote table for `points` (`x` = column, `y` = row).
///
/// Returns `None` for degenerate parameters (non-positive steps or an empty
/// rho range).
pub fn vote_lines(points: &[Point2<f64>], params: &LineVotingParams) -> Option<LineAccumulator> {
    let theta_step = params.theta_step_deg.to_radians();
    if !(theta_step > 0.0 && theta_step.is_finite())
        || !(params.rho_step > 0.0 && params.rho_step.is_finite())
        || !(params.rho_max > params.rho_min)
    {
        return None;
    }

    let num_theta = ((PI / theta_step).round() as usize).max(1);
    let num_rho = ((params.rho_max - params.rho_min + 1.0) / params.rho_step).round() as usize;
    if num_rho == 0 {
        return None;
    }

    let table: Vec<(f64, f64)> = (0..num_theta)
        .map(|t| {
            let theta = t as f64 * theta_step;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut votes = vec![0u32; num_theta * num_rho];
    for p in points {
        for (t, &(c, s)) in table.iter().enumerate() {
            let r = ((p.x * c + p.y * s - params.rho_min) / params.rho_step).round();
            if r >= 0.0 && (r as usize) < num_rho {
                votes[t * num_rho + r as usize] += 1;
            }
        }
    }

    Some(LineAccumulator {
        num_theta,
        num_rho,
        votes,
        theta_step,
        rho_min: params.rho_min,
        rho_step: params.rho_step,
    })
}

/// The single best-supported line, or `None` when no cell reaches
/// `min_votes` (at least two points must share a cell).
pub fn strongest_line(points: &[Point2<f64>], params: &LineVotingParams) -> Option<VotedLine> {
    if points.is_empty() {
        return None;
    }
    let line = vote_lines(points, params)?.best()?;
    (line.votes >= params.min_votes.max(2)).then_some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lattice(rows: usize, cols: usize, step: f64) -> Vec<Point2<f64>> {
        (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Point2::new(c as f64 * step, r as f64 * step)))
            .collect()
    }

    #[test]
    fn horizontal_row_votes_for_vertical_normal() {
        let pts: Vec<Point2<f64>> = (0..12).map(|i| Point2::new(i as f64 * 7.0, 25.0)).collect();
        let line = strongest_line(&pts, &LineVotingParams::default()).expect("line");
        assert_eq!(line.votes, 12);
        assert_abs_diff_eq!(line.theta_deg(), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(line.rho, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn square_lattice_ties_resolve_to_smallest_theta() {
        let line = strongest_line(&lattice(5, 5, 10.0), &LineVotingParams::default()).expect("line");
        assert_eq!(line.votes, 5);
        assert_abs_diff_eq!(line.theta, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(line.rho, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn accumulator_has_expected_shape() {
        let acc = vote_lines(&lattice(2, 2, 3.0), &LineVotingParams::default()).expect("acc");
        assert_eq!(acc.num_theta, 90);
        assert_eq!(acc.num_rho, 361);
        let total: u32 = acc.votes.iter().sum();
        // Every point votes once per theta unless its rho falls below zero.
        assert!(total <= 4 * 90);
        assert!(total >= 90);
    }

    #[test]
    fn empty_or_under_supported_input_yields_no_line() {
        assert!(strongest_line(&[], &LineVotingParams::default()).is_none());

        let params = LineVotingParams {
            min_votes: 4,
            ..LineVotingParams::default()
        };
        let pts = vec![Point2::new(3.0, 4.0), Point2::new(40.0, 17.0), Point2::new(9.0, 88.0)];
        assert!(strongest_line(&pts, &params).is_none());
    }

    #[test]
    fn points_that_never_share_a_cell_have_no_line() {
        // (500, 500) only reaches rho in range near theta 134°, where the
        // origin votes for rho 0 and the other point for rho 12.
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(500.0, 500.0)];
        let acc = vote_lines(&pts, &LineVotingParams::default()).expect("acc");
        assert_eq!(acc.best().map(|l| l.votes), Some(1));
        assert!(strongest_line(&pts, &LineVotingParams::default()).is_none());

        let relaxed = LineVotingParams {
            min_votes: 0,
            ..LineVotingParams::default()
        };
        assert!(strongest_line(&pts, &relaxed).is_none());
    }

    #[test]
    fn two_points_define_a_line() {
        let pts = vec![Point2::new(4.0, 10.0), Point2::new(30.0, 10.0)];
        let line = strongest_line(&pts, &LineVotingParams::default()).expect("line");
        assert_eq!(line.votes, 2);
        assert_abs_diff_eq!(line.theta_deg(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        let params = LineVotingParams {
            theta_step_deg: 0.0,
            ..LineVotingParams::default()
        };
        assert!(vote_lines(&lattice(2, 2, 1.0), &params).is_none());
    }
}
