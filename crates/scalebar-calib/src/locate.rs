//! Guess which image region holds the scale bar.
//!
//! Corners are detected once over the whole image and kept through the
//! variance filter. Every supported [`Position`] is then scored by how many
//! of these structural corners fall inside its crop window.
use crate::filter::{filter_corners, FilterParams};
use crate::region::{CropFraction, Position, RegionError};
use crate::scale::normalize_corners;
use scalebar_core::GrayImageView;
use scalebar_corners::CornerDetector;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateParams {
    /// Crop fraction of the scored windows (never squared).
    pub fraction: f64,
    pub filter: FilterParams,
}

impl Default for LocateParams {
    fn default() -> Self {
        Self {
            fraction: 0.3,
            filter: FilterParams::default(),
        }
    }
}

/// Structural corner count per supported position, in [`Position::SUPPORTED`]
/// order.
pub fn position_scores(
    img: &GrayImageView<'_>,
    detector: &dyn CornerDetector,
    params: &LocateParams,
) -> Result<Vec<(Position, usize)>, RegionError> {
    let fraction = CropFraction::Uniform(params.fraction);
    fraction.validated()?;

    let corners = if img.is_empty() {
        Vec::new()
    } else {
        normalize_corners(&detector.detect(img), detector.axis_order())
    };
    let mask = filter_corners(&corners, img, &params.filter);
    let structural: Vec<_> = corners
        .iter()
        .zip(&mask)
        .filter_map(|(&p, &keep)| keep.then_some(p))
        .collect();

    Position::SUPPORTED
        .iter()
        .map(|&pos| {
            let win = pos.window(img.width, img.height, fraction, false)?;
            let inside = structural
                .iter()
                .filter(|p| {
                    let (r, c) = (p.row as i64, p.col as i64);
                    r >= win.y0 as i64
                        && r < (win.y0 + win.height) as i64
                        && c >= win.x0 as i64
                        && c < (win.x0 + win.width) as i64
                })
                .count();
            Ok((pos, inside))
        })
        .collect()
}

/// Position with the most structural corners. Ties go to the earlier entry
/// of [`Position::SUPPORTED`]; `None` when no window contains any corner.
pub fn locate_position(
    img: &GrayImageView<'_>,
    detector: &dyn CornerDetector,
    params: &LocateParams,
) -> Result<Option<Position>, RegionError> {
    let scores = position_scores(img, detector, params)?;
    log::debug!("position scores: {scores:?}");
    let best = scores
        .into_iter()
        .fold(None::<(Position, usize)>, |best, (pos, n)| match best {
            Some((_, bn)) if bn >= n => best,
            _ => Some((pos, n)),
        });
    Ok(best.filter(|&(_, n)| n > 0).map(|(pos, _)| pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebar_core::{checkerboard_pattern, GrayImage};
    use scalebar_corners::GoodFeaturesDetector;

    fn place(img: &mut GrayImage, board: &GrayImage, x0: usize, y0: usize) {
        for y in 0..board.height {
            for x in 0..board.width {
                img.set(x0 + x, y0 + y, board.get(x, y));
            }
        }
    }

    #[test]
    fn finds_board_in_bottom_left() {
        let mut img = GrayImage::filled(200, 160, 255);
        let board = checkerboard_pattern(4, 3, 8, Some(4));
        place(&mut img, &board, 6, 118);
        let det = GoodFeaturesDetector::default();
        let pos = locate_position(&img.view(), &det, &LocateParams::default()).unwrap();
        assert_eq!(pos, Some(Position::BottomLeft));
    }

    #[test]
    fn ties_prefer_top_right() {
        // Boards in two corners with identical content.
        let mut img = GrayImage::filled(200, 200, 255);
        let board = checkerboard_pattern(3, 3, 8, Some(4));
        place(&mut img, &board, 200 - board.width - 5, 5);
        place(&mut img, &board, 5, 200 - board.height - 5);
        let det = GoodFeaturesDetector::default();
        let scores = position_scores(&img.view(), &det, &LocateParams::default()).unwrap();
        let score = |p: Position| scores.iter().find(|(q, _)| *q == p).map(|(_, n)| *n);
        assert_eq!(score(Position::TopRight), score(Position::BottomLeft));
        let pos = locate_position(&img.view(), &det, &LocateParams::default()).unwrap();
        assert_eq!(pos, Some(Position::TopRight));
    }

    #[test]
    fn blank_image_has_no_position() {
        let img = GrayImage::filled(100, 100, 40);
        let det = GoodFeaturesDetector::default();
        assert_eq!(
            locate_position(&img.view(), &det, &LocateParams::default()).unwrap(),
            None
        );
    }
}
