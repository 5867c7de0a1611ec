//! Crop windows anchored at named image regions.
use scalebar_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Invalid crop requests. Raised before any detection work happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("crop fraction along {axis} must be in (0, 1], got {value}")]
    FractionOutOfRange { axis: char, value: f64 },
    #[error("malformed crop fraction {0:?}: expected a number or a pair `x,y`")]
    MalformedFraction(String),
    #[error("unknown position {0:?}")]
    UnknownPosition(String),
    #[error("cropping an unspecified position is not supported")]
    UnsupportedPosition,
}

/// Where the scale bar sits in the image.
///
/// Corner variants crop from the corner inwards; edge variants crop a band
/// centred along the edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    TopRight,
    BottomRight,
    TopLeft,
    BottomLeft,
    Top,
    Bottom,
    Left,
    Right,
    /// No known region. Cannot be cropped.
    Unspecified,
}

impl Position {
    /// Every croppable position, in preference order for tie breaking.
    pub const SUPPORTED: [Position; 8] = [
        Position::TopRight,
        Position::BottomRight,
        Position::TopLeft,
        Position::BottomLeft,
        Position::Top,
        Position::Bottom,
        Position::Left,
        Position::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Position::TopRight => "top_right",
            Position::BottomRight => "bottom_right",
            Position::TopLeft => "top_left",
            Position::BottomLeft => "bottom_left",
            Position::Top => "top",
            Position::Bottom => "bottom",
            Position::Left => "left",
            Position::Right => "right",
            Position::Unspecified => "unspecified",
        }
    }

    /// Crop window of this position inside a `width x height` image.
    pub fn window(
        self,
        width: usize,
        height: usize,
        fraction: CropFraction,
        square: bool,
    ) -> Result<CropWindow, RegionError> {
        let (fx, fy) = fraction.validated()?;

        let mut w = (fx * width as f64).floor() as usize;
        let mut h = (fy * height as f64).floor() as usize;
        if square {
            let side = w.min(h);
            w = side;
            h = side;
        }
        let w = w.min(width);
        let h = h.min(height);

        let (cx, cy) = (width / 2, height / 2);
        let left = 0;
        let right = width - w;
        let top = 0;
        let bottom = height - h;
        let centre_cols = (cx.saturating_sub(w / 2), (cx + w / 2).min(width));
        let centre_rows = (cy.saturating_sub(h / 2), (cy + h / 2).min(height));

        let (x0, x1, y0, y1) = match self {
            Position::TopLeft => (left, w, top, h),
            Position::TopRight => (right, width, top, h),
            Position::BottomLeft => (left, w, bottom, height),
            Position::BottomRight => (right, width, bottom, height),
            Position::Top => (centre_cols.0, centre_cols.1, top, h),
            Position::Bottom => (centre_cols.0, centre_cols.1, bottom, height),
            Position::Left => (left, w, centre_rows.0, centre_rows.1),
            Position::Right => (right, width, centre_rows.0, centre_rows.1),
            Position::Unspecified => return Err(RegionError::UnsupportedPosition),
        };

        Ok(CropWindow {
            x0,
            y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    /// Copy out the crop window of this position.
    pub fn crop(
        self,
        img: &GrayImageView<'_>,
        fraction: CropFraction,
        square: bool,
    ) -> Result<GrayImage, RegionError> {
        let win = self.window(img.width, img.height, fraction, square)?;
        Ok(win.extract(img))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Position {
    type Err = RegionError;

    /// Accepts `top_right`, `top-right`, `TopRight` and `top right` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match key.as_str() {
            "topright" => Position::TopRight,
            "bottomright" => Position::BottomRight,
            "topleft" => Position::TopLeft,
            "bottomleft" => Position::BottomLeft,
            "top" => Position::Top,
            "bottom" => Position::Bottom,
            "left" => Position::Left,
            "right" => Position::Right,
            "none" | "unspecified" => Position::Unspecified,
            _ => return Err(RegionError::UnknownPosition(s.to_string())),
        })
    }
}

/// Fraction of the image extent to keep along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropFraction {
    Uniform(f64),
    PerAxis { x: f64, y: f64 },
}

impl Default for CropFraction {
    fn default() -> Self {
        CropFraction::Uniform(0.2)
    }
}

impl CropFraction {
    /// `(x, y)` fractions.
    pub fn xy(self) -> (f64, f64) {
        match self {
            CropFraction::Uniform(v) => (v, v),
            CropFraction::PerAxis { x, y } => (x, y),
        }
    }

    /// `(x, y)` fractions, both checked to lie in `(0, 1]`.
    pub fn validated(self) -> Result<(f64, f64), RegionError> {
        let (x, y) = self.xy();
        for (axis, value) in [('x', x), ('y', y)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RegionError::FractionOutOfRange { axis, value });
            }
        }
        Ok((x, y))
    }
}

impl FromStr for CropFraction {
    type Err = RegionError;

    /// `"0.2"` or `"0.2,0.3"` (x then y).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RegionError::MalformedFraction(s.to_string());
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let parse = |p: &str| p.parse::<f64>().map_err(|_| malformed());
        let fraction = match parts.as_slice() {
            [v] => CropFraction::Uniform(parse(v)?),
            [x, y] => CropFraction::PerAxis {
                x: parse(x)?,
                y: parse(y)?,
            },
            _ => return Err(malformed()),
        };
        fraction.validated()?;
        Ok(fraction)
    }
}

/// Axis-aligned window in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl CropWindow {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copy the window out of `img`. The window must lie inside `img`.
    pub fn extract(&self, img: &GrayImageView<'_>) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            img.get(self.x0 + x, self.y0 + y)
        })
    }
}
