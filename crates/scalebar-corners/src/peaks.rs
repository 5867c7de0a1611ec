//! Peak picking on dense response maps.
use crate::response::ResponseMap;

/// Local maximum of a response map, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

/// Distance used when enforcing a minimum separation between peaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Separation {
    /// Reject peaks with euclidean distance strictly below the radius.
    Euclidean,
    /// Reject peaks with chessboard distance at or below the radius.
    Chebyshev,
}

/// Pixels above `threshold` that are not exceeded anywhere in their
/// `(2 * radius + 1)^2` neighbourhood, skipping a `border` of pixels.
///
/// Plateaus yield one peak per tied pixel; [`enforce_separation`] thins them.
pub fn local_maxima(resp: &ResponseMap, radius: usize, threshold: f32, border: usize) -> Vec<Peak> {
    let (w, h) = (resp.width, resp.height);
    let mut out = Vec::new();
    if w <= 2 * border || h <= 2 * border {
        return out;
    }
    let r = radius as i64;

    for y in border..h - border {
        for x in border..w - border {
            let v = resp.at(x, y);
            if v <= threshold {
                continue;
            }
            let mut is_max = true;
            'scan: for dy in -r..=r {
                let yy = y as i64 + dy;
                if yy < 0 || yy >= h as i64 {
                    continue;
                }
                for dx in -r..=r {
                    let xx = x as i64 + dx;
                    if xx < 0 || xx >= w as i64 {
                        continue;
                    }
                    if resp.at(xx as usize, yy as usize) > v {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                out.push(Peak { x, y, response: v });
            }
        }
    }
    out
}

/// Greedy strongest-first selection keeping peaks at least `min_distance`
/// apart, optionally capped at `max_peaks`.
///
/// Ties in response keep raster order, so the result is deterministic.
pub fn enforce_separation(
    mut peaks: Vec<Peak>,
    min_distance: f32,
    metric: Separation,
    max_peaks: Option<usize>,
) -> Vec<Peak> {
    peaks.sort_by(|a, b| b.response.total_cmp(&a.response));

    let limit = max_peaks.unwrap_or(usize::MAX);
    let mut kept: Vec<Peak> = Vec::new();
    for p in peaks {
        if kept.len() >= limit {
            break;
        }
        let conflicts = kept.iter().any(|q| {
            let dx = (p.x as f32 - q.x as f32).abs();
            let dy = (p.y as f32 - q.y as f32).abs();
            match metric {
                Separation::Euclidean => dx * dx + dy * dy < min_distance * min_distance,
                Separation::Chebyshev => dx.max(dy) <= min_distance,
            }
        });
        if !conflicts {
            kept.push(p);
        }
    }
    kept
}
