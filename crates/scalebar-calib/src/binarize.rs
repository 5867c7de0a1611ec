//! Global binarisation as a detector pre-processing step.
use scalebar_core::{GrayImage, GrayImageView};

/// 256-bin intensity histogram.
#[derive(Clone, Debug)]
pub struct Histogram {
    bins: [u32; 256],
    total: u64,
}

impl Histogram {
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut bins = [0u32; 256];
        for &v in samples {
            bins[v as usize] += 1;
        }
        Self {
            bins,
            total: samples.len() as u64,
        }
    }

    /// Smallest and largest occupied level, `None` when empty.
    pub fn range(&self) -> Option<(u8, u8)> {
        let lo = self.bins.iter().position(|&c| c > 0)?;
        let hi = self.bins.iter().rposition(|&c| c > 0)?;
        Some((lo as u8, hi as u8))
    }

    pub fn occupied(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0).count()
    }

    /// Level maximising the between-class variance of `<= t` against
    /// `> t`; the first maximum wins.
    ///
    /// Empty input gives 127, a single level gives that level and two levels
    /// give their midpoint.
    pub fn otsu(&self) -> u8 {
        let Some((lo, hi)) = self.range() else {
            return 127;
        };
        if lo == hi {
            return lo;
        }
        if self.occupied() == 2 {
            return ((lo as u16 + hi as u16) / 2) as u8;
        }

        let total = self.total as f64;
        let mass: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(level, &c)| level as f64 * c as f64)
            .sum();

        let (mut below, mut below_mass) = (0f64, 0f64);
        let mut best: Option<(u8, f64)> = None;
        for level in lo..hi {
            let c = self.bins[level as usize] as f64;
            below += c;
            below_mass += level as f64 * c;
            let above = total - below;
            let gap = below_mass / below - (mass - below_mass) / above;
            let spread = below * above * gap * gap;
            if best.is_none_or(|(_, s)| spread > s) {
                best = Some((level, spread));
            }
        }
        best.map_or(127, |(level, _)| level)
    }
}

/// Otsu threshold of an intensity sample. Pixels strictly above it are
/// foreground.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    Histogram::from_samples(samples).otsu()
}

/// Gaussian blur with `sigma` followed by an Otsu cut into `{0, 255}`.
pub fn binarize(img: &GrayImageView<'_>, sigma: f32) -> GrayImage {
    let Some(buf) = image::GrayImage::from_raw(
        img.width as u32,
        img.height as u32,
        img.data.to_vec(),
    )
    .filter(|_| !img.is_empty()) else {
        return GrayImage::from_fn(img.width, img.height, |x, y| img.get(x, y));
    };

    let blurred = if sigma > 0.0 {
        image::imageops::blur(&buf, sigma)
    } else {
        buf
    };
    let t = otsu_threshold(blurred.as_raw());
    log::debug!("binarize: otsu threshold {t}");

    let width = img.width;
    let data = blurred
        .as_raw()
        .iter()
        .map(|&v| if v > t { 255 } else { 0 })
        .collect();
    GrayImage {
        width,
        height: img.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_separates_two_clusters() {
        let mut samples = vec![20u8; 50];
        samples.extend(std::iter::repeat_n(25u8, 50));
        samples.extend(std::iter::repeat_n(200u8, 40));
        samples.extend(std::iter::repeat_n(210u8, 60));
        let t = otsu_threshold(&samples);
        assert!((25..200).contains(&t), "threshold {t}");
    }

    #[test]
    fn otsu_degenerate_histograms() {
        assert_eq!(otsu_threshold(&[]), 127);
        assert_eq!(otsu_threshold(&[42; 10]), 42);
        assert_eq!(otsu_threshold(&[0, 255, 0, 255]), 127);
    }

    #[test]
    fn histogram_reports_occupied_range() {
        let hist = Histogram::from_samples(&[9, 9, 40, 200]);
        assert_eq!(hist.range(), Some((9, 200)));
        assert_eq!(hist.occupied(), 3);
        assert_eq!(Histogram::from_samples(&[]).range(), None);
    }

    #[test]
    fn otsu_splits_three_levels_at_the_wider_gap() {
        // 10 | 20 200: cutting after 20 separates the bright cluster.
        let mut samples = vec![10u8; 30];
        samples.extend(std::iter::repeat_n(20u8, 30));
        samples.extend(std::iter::repeat_n(200u8, 30));
        assert_eq!(otsu_threshold(&samples), 20);
    }

    #[test]
    fn binarize_produces_two_levels() {
        let img = GrayImage::from_fn(40, 20, |x, _| if x < 20 { 60 } else { 180 });
        let out = binarize(&img.view(), 1.1);
        assert_eq!((out.width, out.height), (40, 20));
        assert!(out.data.iter().all(|&v| v == 0 || v == 255));
        assert_eq!(out.get(2, 10), 0);
        assert_eq!(out.get(37, 10), 255);
    }

    #[test]
    fn empty_image_passes_through() {
        let img = GrayImage::filled(0, 0, 0);
        let out = binarize(&img.view(), 1.1);
        assert!(out.data.is_empty());
    }
}
