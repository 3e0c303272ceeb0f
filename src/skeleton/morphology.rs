//! Binary morphology and smoothing used to merge arch fragments.
//!
//! Masks are boolean; pixels outside the image are background for dilation
//! and mirrored (`d c b a | a b c d | d c b a`) for the Gaussian blur.

use crate::domain::BinaryMask;

/// Dilate with a `size × size` square.
///
/// The structuring element is anchored at index `size / 2`, so a single
/// pixel at `q` grows to `q + (-size/2 ..= size - 1 - size/2)`. For odd sizes
/// this is the usual centered square; for even sizes the window is one pixel
/// longer on the negative side.
pub fn dilate_square(mask: &BinaryMask, size: usize) -> BinaryMask {
    if size <= 1 || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }

    let anchor = size / 2;
    // out[p] = any(in[p + d]) for d in -(size - 1 - anchor) ..= anchor
    let before = size - 1 - anchor;
    let after = anchor;

    let (w, h) = (mask.width(), mask.height());
    let rows = dilate_lines(mask.data(), w, h, before, after, Axis::Row);
    let both = dilate_lines(&rows, w, h, before, after, Axis::Column);

    BinaryMask::from_fn(w, h, |x, y| both[y * w + x])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// One-dimensional dilation along every row or column using prefix counts.
fn dilate_lines(
    data: &[bool],
    w: usize,
    h: usize,
    before: usize,
    after: usize,
    axis: Axis,
) -> Vec<bool> {
    let (lines, len) = match axis {
        Axis::Row => (h, w),
        Axis::Column => (w, h),
    };
    let index = |line: usize, i: usize| match axis {
        Axis::Row => line * w + i,
        Axis::Column => i * w + line,
    };

    let mut out = vec![false; data.len()];
    let mut prefix = vec![0usize; len + 1];
    for line in 0..lines {
        for i in 0..len {
            prefix[i + 1] = prefix[i] + usize::from(data[index(line, i)]);
        }
        for i in 0..len {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(len - 1);
            out[index(line, i)] = prefix[hi + 1] > prefix[lo];
        }
    }
    out
}

/// Gaussian-blur the 0/255 image of `mask` and keep every pixel whose rounded
/// blurred value is non-zero.
///
/// This closes small gaps and rounds off the jagged dilation outline. The
/// kernel radius is `⌊4σ + 0.5⌋`.
pub fn smooth_rebinarize(mask: &BinaryMask, sigma: f64) -> BinaryMask {
    if !(sigma.is_finite() && sigma > 0.0) || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }

    let kernel = gaussian_kernel(sigma);
    let (w, h) = (mask.width(), mask.height());
    let image: Vec<f64> = mask
        .data()
        .iter()
        .map(|&v| if v { 255.0 } else { 0.0 })
        .collect();

    let rows = convolve_lines(&image, w, h, &kernel, Axis::Row);
    let both = convolve_lines(&rows, w, h, &kernel, Axis::Column);

    BinaryMask::from_fn(w, h, |x, y| both[y * w + x].round() != 0.0)
}

/// Normalized 1D Gaussian of radius `⌊4σ + 0.5⌋`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// Mirror an out-of-range index back into `0..len` (edge sample repeated).
fn reflect(mut i: isize, len: isize) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - i - 1;
        } else {
            return i as usize;
        }
    }
}

fn convolve_lines(data: &[f64], w: usize, h: usize, kernel: &[f64], axis: Axis) -> Vec<f64> {
    let (lines, len) = match axis {
        Axis::Row => (h, w),
        Axis::Column => (w, h),
    };
    let index = |line: usize, i: usize| match axis {
        Axis::Row => line * w + i,
        Axis::Column => i * w + line,
    };
    let radius = (kernel.len() / 2) as isize;

    let mut out = vec![0.0; data.len()];
    for line in 0..lines {
        for i in 0..len {
            let acc: f64 = kernel
                .iter()
                .enumerate()
                .map(|(j, kv)| {
                    let src = reflect(i as isize + j as isize - radius, len as isize);
                    kv * data[index(line, src)]
                })
                .sum();
            out[index(line, i)] = acc;
        }
    }
    out
}
