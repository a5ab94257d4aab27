//! Sample representation and channel layout handling.

use anyhow::{bail, Result};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

/// A single image: a 3-D array with one channel axis and two spatial axes.
pub type Sample = Array3<f32>;

/// Which array axis holds the channel dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// `(C, H, W)`
    ChannelsFirst,
    /// `(H, W, C)`
    #[default]
    ChannelsLast,
}

impl DataFormat {
    pub fn as_str(&self) -> &str {
        match self {
            DataFormat::ChannelsFirst => "channels_first",
            DataFormat::ChannelsLast => "channels_last",
        }
    }

    pub fn channel_axis(&self) -> Axis {
        match self {
            DataFormat::ChannelsFirst => Axis(0),
            DataFormat::ChannelsLast => Axis(2),
        }
    }

    pub fn height_axis(&self) -> Axis {
        match self {
            DataFormat::ChannelsFirst => Axis(1),
            DataFormat::ChannelsLast => Axis(0),
        }
    }

    pub fn width_axis(&self) -> Axis {
        match self {
            DataFormat::ChannelsFirst => Axis(2),
            DataFormat::ChannelsLast => Axis(1),
        }
    }

    /// Returns `(height, width, channels)` regardless of layout.
    pub fn dims(&self, sample: &Sample) -> (usize, usize, usize) {
        (
            sample.len_of(self.height_axis()),
            sample.len_of(self.width_axis()),
            sample.len_of(self.channel_axis()),
        )
    }

    /// Builds an array shape from spatial size and channel count.
    pub fn shape(&self, height: usize, width: usize, channels: usize) -> (usize, usize, usize) {
        match self {
            DataFormat::ChannelsFirst => (channels, height, width),
            DataFormat::ChannelsLast => (height, width, channels),
        }
    }

    /// Maps a `(row, col, channel)` position to an array index.
    pub fn index(&self, row: usize, col: usize, channel: usize) -> [usize; 3] {
        match self {
            DataFormat::ChannelsFirst => [channel, row, col],
            DataFormat::ChannelsLast => [row, col, channel],
        }
    }
}

/// Converts a decoded image into a sample with values scaled to [0, 1].
///
/// Grey images give one channel, images with alpha four, everything else
/// three.
pub fn sample_from_image(img: &DynamicImage, format: DataFormat) -> Sample {
    let color = img.color();
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);

    let (channels, raw) = match (color.has_color(), color.has_alpha()) {
        (false, false) => (1, img.to_luma8().into_raw()),
        (_, true) => (4, img.to_rgba8().into_raw()),
        (true, false) => (3, img.to_rgb8().into_raw()),
    };

    Array3::from_shape_fn(format.shape(height, width, channels), |idx| {
        let (row, col, channel) = match format {
            DataFormat::ChannelsFirst => (idx.1, idx.2, idx.0),
            DataFormat::ChannelsLast => (idx.0, idx.1, idx.2),
        };
        raw[(row * width + col) * channels + channel] as f32 / 255.0
    })
}

/// Converts a sample back into an 8-bit image.
///
/// Values are clamped to [0, 1] before quantization. Only 1, 3 and 4 channel
/// samples have an image equivalent.
pub fn sample_to_image(sample: &Sample, format: DataFormat) -> Result<DynamicImage> {
    let (height, width, channels) = format.dims(sample);
    if !matches!(channels, 1 | 3 | 4) {
        bail!(
            "Cannot encode a sample with {} channels as an image (expected 1, 3 or 4)",
            channels
        );
    }

    let mut raw = Vec::with_capacity(height * width * channels);
    for row in 0..height {
        for col in 0..width {
            for channel in 0..channels {
                let value = sample[format.index(row, col, channel)];
                raw.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
    }

    let (w, h) = (width as u32, height as u32);
    let img = match channels {
        1 => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
        _ => RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
    };

    match img {
        Some(img) => Ok(img),
        None => bail!("Image buffer size mismatch for {}x{}x{}", width, height, channels),
    }
}
