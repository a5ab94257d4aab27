//! Spatial filters. Borders use nearest-edge extension.

use ndarray::{Array3, Axis};

use super::sample::{DataFormat, Sample};

/// Kernel support in multiples of sigma.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Normalized 1-D Gaussian kernel of radius `round(truncate * sigma)`.
///
/// A non-positive sigma yields the unit kernel `[1.0]`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Gaussian smoothing over the two spatial axes; channels are not mixed.
pub fn gaussian_smooth(sample: &Sample, sigma: f64, format: DataFormat) -> Sample {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return sample.clone();
    }
    let once = convolve_axis(sample, format.height_axis(), &kernel);
    convolve_axis(&once, format.width_axis(), &kernel)
}

fn convolve_axis(sample: &Sample, axis: Axis, kernel: &[f32]) -> Sample {
    let len = sample.len_of(axis);
    let mut out = Array3::<f32>::zeros(sample.raw_dim());
    if len == 0 {
        return out;
    }
    let radius = (kernel.len() / 2) as isize;
    let last = len as isize - 1;

    for (mut dst, src) in out.lanes_mut(axis).into_iter().zip(sample.lanes(axis)) {
        for i in 0..len as isize {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let j = (i + k as isize - radius).clamp(0, last) as usize;
                acc += weight * src[j];
            }
            dst[i as usize] = acc;
        }
    }
    out
}

/// Median over a `size x size` spatial window, computed per channel.
pub fn median_filter(sample: &Sample, size: usize, format: DataFormat) -> Sample {
    let (height, width, channels) = format.dims(sample);
    if size <= 1 || height == 0 || width == 0 {
        return sample.clone();
    }
    let radius = (size / 2) as isize;
    let mut out = Array3::<f32>::zeros(sample.raw_dim());
    let mut window = Vec::with_capacity(size * size);

    for channel in 0..channels {
        for row in 0..height {
            for col in 0..width {
                window.clear();
                for dy in -radius..=radius {
                    let y = (row as isize + dy).clamp(0, height as isize - 1) as usize;
                    for dx in -radius..=radius {
                        let x = (col as isize + dx).clamp(0, width as isize - 1) as usize;
                        window.push(sample[format.index(y, x, channel)]);
                    }
                }
                window.sort_by(|a, b| a.total_cmp(b));
                out[format.index(row, col, channel)] = window[window.len() / 2];
            }
        }
    }
    out
}
