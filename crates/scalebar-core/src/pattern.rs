//! Synthetic checkerboard rendering.
//!
//! The top-left cell is dark; cells alternate along both axes.
use crate::GrayImage;
use serde::{Deserialize, Serialize};

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Axis-aligned checkerboard of `cols x rows` cells of `cell` pixels,
/// surrounded by a light border of `pad` pixels (`cell / 2` when `None`).
pub fn checkerboard_pattern(cols: usize, rows: usize, cell: usize, pad: Option<usize>) -> GrayImage {
    let pad = pad.unwrap_or(cell / 2);
    let width = cols * cell + 2 * pad;
    let height = rows * cell + 2 * pad;
    GrayImage::from_fn(width, height, |x, y| {
        if cell == 0 || x < pad || y < pad || x >= pad + cols * cell || y >= pad + rows * cell {
            return LIGHT;
        }
        let c = (x - pad) / cell;
        let r = (y - pad) / cell;
        if (r + c) % 2 == 0 {
            DARK
        } else {
            LIGHT
        }
    })
}

/// Where and how to paint a board into an existing image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoardPlacement {
    pub cols: usize,
    pub rows: usize,
    /// Cell side in pixels.
    pub cell: f32,
    /// Board center in continuous image coordinates (`x`, `y`); pixel `(i, j)`
    /// covers `[i, i + 1) x [j, j + 1)`.
    pub center: [f32; 2],
    /// Rotation in degrees; positive angles turn the board's x axis towards
    /// +y (clockwise on screen, since rows grow downwards).
    pub angle_deg: f32,
}

/// Paint a (possibly rotated) board, anti-aliased with `supersample^2`
/// samples per pixel. Pixels not covered by the board keep their value.
pub fn paint_checkerboard(img: &mut GrayImage, board: &BoardPlacement, supersample: usize) {
    let n = supersample.max(1);
    let half_w = board.cols as f32 * board.cell * 0.5;
    let half_h = board.rows as f32 * board.cell * 0.5;
    if board.cell <= 0.0 || img.width == 0 || img.height == 0 {
        return;
    }

    let (s, c) = board.angle_deg.to_radians().sin_cos();
    let [cx, cy] = board.center;

    let reach = (half_w * half_w + half_h * half_h).sqrt() + 1.0;
    let x0 = (cx - reach).floor().max(0.0) as usize;
    let y0 = (cy - reach).floor().max(0.0) as usize;
    let x1 = ((cx + reach).ceil().max(0.0) as usize).min(img.width);
    let y1 = ((cy + reach).ceil().max(0.0) as usize).min(img.height);

    for y in y0..y1 {
        for x in x0..x1 {
            let background = img.get(x, y) as f32;
            let mut acc = 0.0f32;
            for sy in 0..n {
                for sx in 0..n {
                    let px = x as f32 + (sx as f32 + 0.5) / n as f32 - cx;
                    let py = y as f32 + (sy as f32 + 0.5) / n as f32 - cy;
                    // Inverse rotation into board coordinates.
                    let u = c * px + s * py + half_w;
                    let v = -s * px + c * py + half_h;
                    acc += if u >= 0.0 && v >= 0.0 && u < 2.0 * half_w && v < 2.0 * half_h {
                        let col = (u / board.cell).floor() as usize;
                        let row = (v / board.cell).floor() as usize;
                        if (row + col) % 2 == 0 {
                            DARK as f32
                        } else {
                            LIGHT as f32
                        }
                    } else {
                        background
                    };
                }
            }
            img.set(x, y, (acc / (n * n) as f32).round() as u8);
        }
    }
}
