//! Iterative sub-pixel corner refinement.
//!
//! At a true corner every image gradient in the neighbourhood is orthogonal
//! to the vector from the corner to the gradient's location. Each iteration
//! solves the weighted least-squares form of that constraint for a new
//! corner estimate and re-centres the window there.
use nalgebra::{Matrix2, Point2, Vector2};
use scalebar_core::{sample_bilinear, GrayImageView};
use serde::{Deserialize, Serialize};

/// Sub-pixel refinement parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubPixParams {
    /// Window half size in pixels; the window is `2 * half_window + 1` wide.
    pub half_window: usize,
    pub max_iters: usize,
    /// Stop once an update moves the estimate less than this many pixels.
    pub epsilon: f32,
}

impl Default for SubPixParams {
    fn default() -> Self {
        Self {
            half_window: 5,
            max_iters: 30,
            epsilon: 1e-3,
        }
    }
}

/// Refine one corner estimate in `(x, y)` pixel coordinates.
///
/// Returns `initial` unchanged when the system is degenerate on the first
/// iteration or when the estimate drifts further than the window half size.
pub fn refine_corner(
    img: &GrayImageView<'_>,
    initial: Point2<f32>,
    params: &SubPixParams,
) -> Point2<f32> {
    if img.is_empty() || params.half_window == 0 {
        return initial;
    }

    let r = params.half_window as i32;
    let inv_r = 1.0 / r as f64;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let t = i as f64 * inv_r;
            (-t * t).exp()
        })
        .collect();

    let eps2 = (params.epsilon as f64).powi(2);
    let mut c = Vector2::new(initial.x as f64, initial.y as f64);

    for _ in 0..params.max_iters.max(1) {
        let mut g = Matrix2::<f64>::zeros();
        let mut rhs = Vector2::<f64>::zeros();

        for (jj, j) in (-r..=r).enumerate() {
            let py = (c.y + j as f64) as f32;
            for (ii, i) in (-r..=r).enumerate() {
                let px = (c.x + i as f64) as f32;
                let gx = 0.5
                    * (sample_bilinear(img, px + 1.0, py) - sample_bilinear(img, px - 1.0, py))
                        as f64;
                let gy = 0.5
                    * (sample_bilinear(img, px, py + 1.0) - sample_bilinear(img, px, py - 1.0))
                        as f64;
                let w = weights[ii] * weights[jj];

                let gxx = gx * gx * w;
                let gxy = gx * gy * w;
                let gyy = gy * gy * w;
                g[(0, 0)] += gxx;
                g[(0, 1)] += gxy;
                g[(1, 1)] += gyy;
                rhs.x += gxx * i as f64 + gxy * j as f64;
                rhs.y += gxy * i as f64 + gyy * j as f64;
            }
        }
        g[(1, 0)] = g[(0, 1)];

        let Some(inv) = g.try_inverse() else {
            break;
        };
        let step = inv * rhs;
        c += step;
        if step.norm_squared() <= eps2 {
            break;
        }
    }

    let drift = (c - Vector2::new(initial.x as f64, initial.y as f64)).abs();
    if !c.x.is_finite() || !c.y.is_finite() || drift.x > r as f64 || drift.y > r as f64 {
        return initial;
    }
    Point2::new(c.x as f32, c.y as f32)
}

/// Refine every corner in place.
pub fn refine_corners(img: &GrayImageView<'_>, corners: &mut [Point2<f32>], params: &SubPixParams) {
    for c in corners.iter_mut() {
        *c = refine_corner(img, *c, params);
    }
}
