//! Geometric operations on samples: flips, rotation and translation.
//!
//! All operations preserve the input shape and act on the spatial axes
//! selected by a [`DataFormat`].

use ndarray::{Array3, Axis, Slice};

use super::sample::{DataFormat, Sample};

/// Mirrors the sample along one axis.
pub fn flip(sample: &Sample, axis: Axis) -> Sample {
    sample.slice_axis(axis, Slice::new(0, None, -1)).to_owned()
}

/// Rotates the sample about its centre by `angle` radians, counter-clockwise
/// as displayed.
///
/// Uses bilinear interpolation; positions that map outside the source image
/// are filled with `0.0`. Channels are rotated independently.
pub fn rotate(sample: &Sample, angle: f64, format: DataFormat) -> Sample {
    let (height, width, channels) = format.dims(sample);
    if height == 0 || width == 0 || angle == 0.0 {
        return sample.clone();
    }

    let (sin, cos) = angle.sin_cos();
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let mut out = Array3::<f32>::zeros(sample.raw_dim());

    for row in 0..height {
        for col in 0..width {
            // Inverse map: output position back into the source image.
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            let src_x = cos * dx - sin * dy + cx;
            let src_y = sin * dx + cos * dy + cy;

            for channel in 0..channels {
                out[format.index(row, col, channel)] =
                    bilinear(sample, format, src_y, src_x, channel, height, width);
            }
        }
    }
    out
}

const EDGE_EPS: f64 = 1e-9;

fn bilinear(
    sample: &Sample,
    format: DataFormat,
    y: f64,
    x: f64,
    channel: usize,
    height: usize,
    width: usize,
) -> f32 {
    let max_y = (height - 1) as f64;
    let max_x = (width - 1) as f64;
    if y < -EDGE_EPS || x < -EDGE_EPS || y > max_y + EDGE_EPS || x > max_x + EDGE_EPS {
        return 0.0;
    }
    let y = y.clamp(0.0, max_y);
    let x = x.clamp(0.0, max_x);

    let y0 = y.floor() as usize;
    let x0 = x.floor() as usize;
    let y1 = (y0 + 1).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);
    let fy = (y - y0 as f64) as f32;
    let fx = (x - x0 as f64) as f32;

    let p00 = sample[format.index(y0, x0, channel)];
    let p01 = sample[format.index(y0, x1, channel)];
    let p10 = sample[format.index(y1, x0, channel)];
    let p11 = sample[format.index(y1, x1, channel)];

    let top = p00 + (p01 - p00) * fx;
    let bottom = p10 + (p11 - p10) * fx;
    top + (bottom - top) * fy
}

/// Translates the sample by `offset` positions along `axis`.
///
/// `out[i] = in[i - offset]`; positions that fall outside the source take the
/// nearest edge value. Fractional offsets are linearly interpolated.
pub fn shift(sample: &Sample, axis: Axis, offset: f64) -> Sample {
    let len = sample.len_of(axis);
    if len == 0 || offset == 0.0 {
        return sample.clone();
    }

    let max = (len - 1) as f64;
    let taps: Vec<(usize, usize, f32)> = (0..len)
        .map(|i| {
            let src = (i as f64 - offset).clamp(0.0, max);
            let lo = src.floor() as usize;
            let hi = (lo + 1).min(len - 1);
            (lo, hi, (src - lo as f64) as f32)
        })
        .collect();

    let mut out = Array3::<f32>::zeros(sample.raw_dim());
    for (mut dst, src) in out.lanes_mut(axis).into_iter().zip(sample.lanes(axis)) {
        for (i, &(lo, hi, frac)) in taps.iter().enumerate() {
            dst[i] = src[lo] + (src[hi] - src[lo]) * frac;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ramp(shape: (usize, usize, usize)) -> Sample {
        let mut n = 0.0;
        Array3::from_shape_fn(shape, |_| {
            n += 1.0;
            n
        })
    }

    #[test]
    fn test_flip_width_channels_last() {
        let x = ramp((2, 3, 1));
        let flipped = flip(&x, DataFormat::ChannelsLast.width_axis());
        assert_eq!(flipped[[0, 0, 0]], x[[0, 2, 0]]);
        assert_eq!(flipped[[1, 2, 0]], x[[1, 0, 0]]);
        assert_eq!(flip(&flipped, Axis(1)), x);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let x = ramp((4, 5, 3));
        assert_eq!(rotate(&x, 0.0, DataFormat::ChannelsLast), x);
    }

    #[test]
    fn test_rotate_half_turn_reverses_both_axes() {
        let x = ramp((3, 3, 1));
        let rotated = rotate(&x, PI, DataFormat::ChannelsLast);
        for row in 0..3 {
            for col in 0..3 {
                let expected = x[[2 - row, 2 - col, 0]];
                assert!((rotated[[row, col, 0]] - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_rotate_quarter_turn_fills_corners_with_zero() {
        let x = Sample::ones((2, 4, 1));
        let rotated = rotate(&x, PI / 2.0, DataFormat::ChannelsLast);
        assert_eq!(rotated.dim(), (2, 4, 1));
        assert_eq!(rotated[[0, 0, 0]], 0.0);
        assert!((rotated[[0, 1, 0]] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_channels_first_matches_channels_last() {
        let last = ramp((4, 4, 2));
        let first = last.clone().permuted_axes([2, 0, 1]).as_standard_layout().into_owned();
        let a = rotate(&last, 0.3, DataFormat::ChannelsLast);
        let b = rotate(&first, 0.3, DataFormat::ChannelsFirst);
        assert_eq!(a.permuted_axes([2, 0, 1]), b);
    }

    #[test]
    fn test_shift_integer_offset_pads_with_edge() {
        let x = ramp((1, 4, 1));
        let shifted = shift(&x, Axis(1), 1.0);
        let values: Vec<f32> = shifted.iter().copied().collect();
        assert_eq!(values, vec![1.0, 1.0, 2.0, 3.0]);

        let shifted = shift(&x, Axis(1), -2.0);
        let values: Vec<f32> = shifted.iter().copied().collect();
        assert_eq!(values, vec![3.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_shift_fractional_offset_interpolates() {
        let x = ramp((1, 3, 1));
        let shifted = shift(&x, Axis(1), 0.5);
        let values: Vec<f32> = shifted.iter().copied().collect();
        assert_eq!(values, vec![1.0, 1.5, 2.5]);
    }

    #[test]
    fn test_shift_only_touches_requested_axis() {
        let x = ramp((3, 2, 2));
        let shifted = shift(&x, Axis(0), 1.0);
        assert_eq!(shifted.slice(ndarray::s![0, .., ..]), x.slice(ndarray::s![0, .., ..]));
        assert_eq!(shifted.slice(ndarray::s![2, .., ..]), x.slice(ndarray::s![1, .., ..]));
    }
}
