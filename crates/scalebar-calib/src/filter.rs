//! Reject corner candidates that sit on flat background.
//!
//! Checkerboard corners lie on high-contrast edges, so the intensity
//! variance around them is high compared to detector noise. The cut-off is
//! derived from the candidates themselves and needs no tuning.
use scalebar_core::{GrayImageView, Point};
use serde::{Deserialize, Serialize};

/// Statistic of the window variances used as the keep threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceThreshold {
    #[default]
    Mean,
    Median,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Side of the square window around each candidate.
    pub window_size: usize,
    pub threshold: VarianceThreshold,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            window_size: 7,
            threshold: VarianceThreshold::Mean,
        }
    }
}

/// Start and end of a `len`-sized window around `center`, shifted to stay
/// inside `[0, extent)`.
fn clamp_window(center: i64, len: usize, extent: usize) -> (usize, usize) {
    let half = (len as i64 - 1) / 2;
    let max_start = extent.saturating_sub(len) as i64;
    let start = (center - half).clamp(0, max_start) as usize;
    (start, (start + len).min(extent))
}

/// Population variance of the intensities (scaled to `[0, 1]`) in the
/// window around `p`.
pub fn window_variance(img: &GrayImageView<'_>, p: Point, window_size: usize) -> f64 {
    let k = window_size.max(1);
    let (x0, x1) = clamp_window(p.col as i64, k, img.width);
    let (y0, y1) = clamp_window(p.row as i64, k, img.height);
    let n = ((x1 - x0) * (y1 - y0)) as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            let v = img.get(x, y) as f64 / 255.0;
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Keep mask aligned with `points`: `true` where the local variance reaches
/// the threshold statistic over all candidates.
///
/// Fewer than two candidates, or identical variances everywhere, keep
/// everything.
pub fn filter_corners(points: &[Point], img: &GrayImageView<'_>, params: &FilterParams) -> Vec<bool> {
    if points.len() < 2 {
        return vec![true; points.len()];
    }

    let vars: Vec<f64> = points
        .iter()
        .map(|&p| window_variance(img, p, params.window_size))
        .collect();

    let (lo, hi) = vars
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi - lo <= f64::EPSILON {
        return vec![true; points.len()];
    }

    let threshold = match params.threshold {
        VarianceThreshold::Mean => vars.iter().sum::<f64>() / vars.len() as f64,
        VarianceThreshold::Median => median(&vars),
    };
    let mask: Vec<bool> = vars.iter().map(|&v| v >= threshold).collect();
    log::debug!(
        "variance filter kept {}/{} corners (threshold {threshold:.5})",
        mask.iter().filter(|&&k| k).count(),
        mask.len()
    );
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scalebar_core::{checkerboard_pattern, GrayImage};

    #[test]
    fn window_shifts_instead_of_shrinking() {
        assert_eq!(clamp_window(0, 7, 20), (0, 7));
        assert_eq!(clamp_window(19, 7, 20), (13, 20));
        assert_eq!(clamp_window(10, 7, 20), (7, 14));
        assert_eq!(clamp_window(2, 7, 5), (0, 5));
    }

    #[test]
    fn variance_of_half_black_window() {
        // Left half dark, right half bright: a 7x7 window centred on the
        // edge sees 3 dark and 4 bright columns.
        let img = GrayImage::from_fn(20, 20, |x, _| if x < 10 { 0 } else { 255 });
        let var = window_variance(&img.view(), Point::new(10, 10), 7);
        let p = 4.0 / 7.0;
        assert_relative_eq!(var, p * (1.0 - p), epsilon = 1e-12);
        assert_eq!(window_variance(&img.view(), Point::new(10, 2), 7), 0.0);
    }

    #[test]
    fn background_candidates_are_rejected() {
        let img = checkerboard_pattern(4, 4, 10, Some(20));
        let points = [
            Point::new(30, 30),
            Point::new(40, 40),
            Point::new(30, 50),
            Point::new(3, 3),
            Point::new(75, 5),
        ];
        let mask = filter_corners(&points, &img.view(), &FilterParams::default());
        assert_eq!(mask, vec![true, true, true, false, false]);

        let median = FilterParams {
            threshold: VarianceThreshold::Median,
            ..FilterParams::default()
        };
        assert_eq!(filter_corners(&points, &img.view(), &median), mask);
    }

    #[test]
    fn degenerate_inputs_keep_everything() {
        let img = GrayImage::filled(30, 30, 100);
        assert!(filter_corners(&[], &img.view(), &FilterParams::default()).is_empty());
        assert_eq!(
            filter_corners(&[Point::new(5, 5)], &img.view(), &FilterParams::default()),
            vec![true]
        );
        let flat = [Point::new(5, 5), Point::new(20, 20), Point::new(10, 3)];
        assert_eq!(
            filter_corners(&flat, &img.view(), &FilterParams::default()),
            vec![true; 3]
        );
    }
}
