//! Dense corner response maps built from the gradient structure tensor.
use scalebar_core::{pixel_clamped, GrayImageView};

/// Dense per-pixel response, row-major.
#[derive(Clone, Debug)]
pub struct ResponseMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ResponseMap {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }
}

/// How samples outside the buffer are treated by [`filter_separable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Border {
    Replicate,
    Zero,
}

/// 3x3 Sobel derivatives with replicated borders, intensities scaled by `scale`.
pub(crate) fn sobel(img: &GrayImageView<'_>, scale: f32) -> (Vec<f32>, Vec<f32>) {
    let (w, h) = (img.width, img.height);
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    let p = |x: i64, y: i64| pixel_clamped(img, x, y) as f32 * scale;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let dx = (p(x + 1, y - 1) - p(x - 1, y - 1))
                + 2.0 * (p(x + 1, y) - p(x - 1, y))
                + (p(x + 1, y + 1) - p(x - 1, y + 1));
            let dy = (p(x - 1, y + 1) - p(x - 1, y - 1))
                + 2.0 * (p(x, y + 1) - p(x, y - 1))
                + (p(x + 1, y + 1) - p(x + 1, y - 1));
            let idx = y as usize * w + x as usize;
            gx[idx] = dx;
            gy[idx] = dy;
        }
    }
    (gx, gy)
}

/// Correlate rows then columns with a symmetric odd-length `kernel`.
pub(crate) fn filter_separable(
    data: &[f32],
    width: usize,
    height: usize,
    kernel: &[f32],
    border: Border,
) -> Vec<f32> {
    let r = (kernel.len() / 2) as i64;
    let fetch = |line: &dyn Fn(usize) -> f32, len: usize, i: i64| -> f32 {
        if i >= 0 && (i as usize) < len {
            line(i as usize)
        } else {
            match border {
                Border::Replicate => line(i.clamp(0, len as i64 - 1) as usize),
                Border::Zero => 0.0,
            }
        }
    };

    let mut tmp = vec![0.0f32; width * height];
    for y in 0..height {
        let row = |x: usize| data[y * width + x];
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &wk) in kernel.iter().enumerate() {
                acc += wk * fetch(&row, width, x as i64 + k as i64 - r);
            }
            tmp[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0f32; width * height];
    for x in 0..width {
        let col = |y: usize| tmp[y * width + x];
        for y in 0..height {
            let mut acc = 0.0f32;
            for (k, &wk) in kernel.iter().enumerate() {
                acc += wk * fetch(&col, height, y as i64 + k as i64 - r);
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// Sampled Gaussian truncated at four standard deviations, normalised to 1.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (4.0 * sigma).ceil() as i32;
    let mut k: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// Smaller eigenvalue of the symmetric 2x2 tensor `[[a, b], [b, c]]`.
#[inline]
pub(crate) fn min_eigenvalue(a: f32, b: f32, c: f32) -> f32 {
    let half_trace = 0.5 * (a + c);
    let half_diff = 0.5 * (a - c);
    (half_trace - (half_diff * half_diff + b * b).sqrt()).max(0.0)
}

/// Minimum-eigenvalue response with an unweighted `block x block` window.
pub fn min_eigen_response(img: &GrayImageView<'_>, block: usize) -> ResponseMap {
    let kernel = vec![1.0f32; block.max(1) | 1];
    structure_response(img, 1.0, &kernel, Border::Replicate)
}

/// Minimum-eigenvalue response with a Gaussian window of `sigma`, computed on
/// intensities scaled to `[0, 1]`.
pub fn shi_tomasi_response(img: &GrayImageView<'_>, sigma: f32) -> ResponseMap {
    let kernel = gaussian_kernel(sigma);
    structure_response(img, 1.0 / 255.0, &kernel, Border::Zero)
}

fn structure_response(
    img: &GrayImageView<'_>,
    scale: f32,
    window: &[f32],
    border: Border,
) -> ResponseMap {
    let (w, h) = (img.width, img.height);
    if img.is_empty() {
        return ResponseMap {
            width: w,
            height: h,
            data: Vec::new(),
        };
    }

    let (gx, gy) = sobel(img, scale);
    let xx: Vec<f32> = gx.iter().map(|v| v * v).collect();
    let xy: Vec<f32> = gx.iter().zip(&gy).map(|(a, b)| a * b).collect();
    let yy: Vec<f32> = gy.iter().map(|v| v * v).collect();

    let sxx = filter_separable(&xx, w, h, window, border);
    let sxy = filter_separable(&xy, w, h, window, border);
    let syy = filter_separable(&yy, w, h, window, border);

    let data = (0..w * h)
        .map(|i| min_eigenvalue(sxx[i], sxy[i], syy[i]))
        .collect();
    ResponseMap {
        width: w,
        height: h,
        data,
    }
}
