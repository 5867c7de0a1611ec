use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate in crop-local space, `(row, col)` order.
///
/// Duplicates are allowed; detectors routinely emit the same location twice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Image-plane position with `x = col` and `y = row`.
    pub fn to_xy(self) -> Point2<f64> {
        Point2::new(self.col as f64, self.row as f64)
    }

    /// City-block (L1) distance to `other`.
    pub fn cityblock(self, other: Point) -> f64 {
        let dr = (self.row as i64 - other.row as i64).abs();
        let dc = (self.col as i64 - other.col as i64).abs();
        (dr + dc) as f64
    }
}

/// All pairwise City-block distances, `n * (n - 1) / 2` values.
///
/// Ordering is `(0,1), (0,2), ..., (1,2), ...`; callers treat the result as
/// a multiset.
pub fn pairwise_cityblock(points: &[Point]) -> Vec<f64> {
    let n = points.len();
    let mut out = Vec::with_capacity(n.saturating_sub(1) * n / 2);
    for (i, &a) in points.iter().enumerate() {
        for &b in &points[i + 1..] {
            out.push(a.cityblock(b));
        }
    }
    out
}
