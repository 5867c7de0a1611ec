//! Lattice spacing from an unlabeled multiset of pairwise distances.
//!
//! Every candidate spacing `d` defines a grid `0, d, 2d, ...`; each distance
//! is quantised to the nearest interior grid value. The candidate with the
//! lowest quantisation error plus a BIC-style penalty on the number of grid
//! values wins, which keeps fine grids from winning by overfitting.
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Search range and resolution of the spacing optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingParams {
    /// Percentile of the distances where the search starts.
    pub lower_percentile: f64,
    /// Percentile of the distances where the search stops (exclusive).
    pub upper_percentile: f64,
    /// Lower bound on the first candidate, in pixels.
    pub min_spacing: f64,
    /// Candidate increment, in pixels.
    pub step: f64,
    /// Fewer distances than this yield no spacing.
    pub min_samples: usize,
}

impl Default for SpacingParams {
    fn default() -> Self {
        Self {
            lower_percentile: 1.0,
            upper_percentile: 20.0,
            min_spacing: 1.0,
            step: 1.0,
            min_samples: 3,
        }
    }
}

/// Percentile of ascending `sorted` values with linear interpolation between
/// the closest ranks. `q` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !q.is_finite() {
        return None;
    }
    let pos = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Number of elements in `arange(start, stop, step)`.
fn arange_len(start: f64, stop: f64, step: f64) -> usize {
    let n = ((stop - start) / step).ceil();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Penalised quantisation error of `distances` on a grid of spacing `d`.
///
/// `None` when the grid has no interior value to quantise to.
pub fn spacing_score(distances: &[f64], d: f64, max_distance: f64) -> Option<f64> {
    let len = arange_len(0.0, max_distance + d, d);
    if len <= 2 {
        return None;
    }

    let grid = |i: usize| i as f64 * d;
    let bins: Vec<f64> = (0..len - 1).map(|i| 0.5 * (grid(i) + grid(i + 1))).collect();
    let prototypes = len - 2;

    let mut sq = 0.0f64;
    for &x in distances {
        let idx = bins
            .partition_point(|&b| b <= x)
            .saturating_sub(1)
            .min(prototypes - 1);
        let r = x - grid(idx + 1);
        sq += r * r;
    }
    Some(sq.sqrt() + prototypes as f64 * (distances.len() as f64).ln())
}

/// Lattice spacing best explaining `distances`, or `None` when the data is
/// too small or no candidate in the search range could be evaluated.
///
/// The returned spacing is always finite and positive.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(n = distances.len()))
)]
pub fn optimal_distance(distances: &[f64], params: &SpacingParams) -> Option<f64> {
    let mut sorted: Vec<f64> = distances.iter().copied().filter(|d| d.is_finite()).collect();
    if sorted.is_empty() || sorted.len() < params.min_samples || !(params.step > 0.0) {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let min_d = percentile(&sorted, params.lower_percentile)?.max(params.min_spacing);
    let max_d = percentile(&sorted, params.upper_percentile)?;
    let max_distance = *sorted.last()?;
    let candidates = arange_len(min_d, max_d, params.step);
    log::debug!(
        "spacing search over [{min_d:.2}, {max_d:.2}) in {candidates} steps, {} distances",
        sorted.len()
    );

    let mut best: Option<(f64, f64)> = None;
    for k in 0..candidates {
        let d = min_d + k as f64 * params.step;
        if !(d > 0.0) {
            continue;
        }
        let Some(score) = spacing_score(&sorted, d, max_distance) else {
            continue;
        };
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((d, score));
        }
    }

    best.map(|(d, _)| d).filter(|d| d.is_finite() && *d > 0.0)
}
