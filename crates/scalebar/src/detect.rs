use crate::{calib, core};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Region(#[from] calib::RegionError),

    #[error(transparent)]
    Scale(#[from] calib::ScaleError),
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode an image file and convert it to 8-bit luma.
pub fn load_gray(path: impl AsRef<Path>) -> Result<image::GrayImage, DetectError> {
    Ok(image::open(path)?.to_luma8())
}

/// Run the full estimation described by `params`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn estimate_scale(
    img: &image::GrayImage,
    params: &calib::ScaleParams,
) -> Result<calib::ScaleResult, DetectError> {
    let estimator = calib::ScaleEstimator::new(params.clone());
    Ok(estimator.estimate(&gray_view(img))?)
}

/// Find the region most likely to hold the scale bar, using the detector
/// configured in `params`.
pub fn locate(
    img: &image::GrayImage,
    params: &calib::ScaleParams,
    locate: &calib::LocateParams,
) -> Result<Option<calib::Position>, DetectError> {
    let detector = params.detector.build();
    Ok(calib::locate_position(&gray_view(img), detector.as_ref(), locate)?)
}
