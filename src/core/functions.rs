//! Callable standardization steps and the stock functions shipped with the
//! crate.

use anyhow::{bail, ensure, Result};
use palette::{FromColor, Lab, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::filters::median_filter;
use super::sample::{DataFormat, Sample};

type SampleFn = dyn Fn(Sample) -> Result<Sample> + Send + Sync;

/// A named `Sample -> Sample` step that may fail.
///
/// Cloning is cheap; clones share the underlying closure.
#[derive(Clone)]
pub struct SampleFunction {
    name: String,
    func: Arc<SampleFn>,
}

impl SampleFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Sample) -> Result<Sample> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, sample: Sample) -> Result<Sample> {
        (self.func)(sample)
    }
}

impl fmt::Debug for SampleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SampleFunction").field(&self.name).finish()
    }
}

/// Stock standardization functions selectable by name in settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFunction {
    Desaturate,
    RescaleIntensity,
    EqualizeHistogram,
    MedianFilter,
}

impl StockFunction {
    pub fn as_str(&self) -> &str {
        match self {
            StockFunction::Desaturate => "desaturate",
            StockFunction::RescaleIntensity => "rescale_intensity",
            StockFunction::EqualizeHistogram => "equalize_histogram",
            StockFunction::MedianFilter => "median_filter",
        }
    }

    pub fn all() -> Vec<StockFunction> {
        vec![
            StockFunction::Desaturate,
            StockFunction::RescaleIntensity,
            StockFunction::EqualizeHistogram,
            StockFunction::MedianFilter,
        ]
    }

    /// Binds the function to a channel layout.
    pub fn build(self, format: DataFormat) -> SampleFunction {
        match self {
            StockFunction::Desaturate => {
                SampleFunction::new(self.as_str(), move |x| desaturate(x, format))
            }
            StockFunction::RescaleIntensity => {
                SampleFunction::new(self.as_str(), |x| Ok(rescale_intensity(x)))
            }
            StockFunction::EqualizeHistogram => {
                SampleFunction::new(self.as_str(), |x| Ok(equalize_histogram(x)))
            }
            StockFunction::MedianFilter => {
                SampleFunction::new(self.as_str(), move |x| Ok(median_filter(&x, 3, format)))
            }
        }
    }
}

/// Removes chroma from every pixel by zeroing the a/b components in CIE Lab.
///
/// Expects RGB values in [0, 1] or [0, 255]; the range is preserved.
/// Negative values are rejected, so zero-centred samples must be shifted
/// back into range first.
pub fn desaturate(mut sample: Sample, format: DataFormat) -> Result<Sample> {
    let (height, width, channels) = format.dims(&sample);
    ensure!(
        channels == 3,
        "Desaturation needs 3 colour channels (got {})",
        channels
    );
    if let Some(&low) = sample.iter().find(|&&v| v < 0.0) {
        bail!("Desaturation needs non-negative RGB values (found {})", low);
    }

    let peak = sample.iter().copied().fold(0.0f32, f32::max);
    let scale = if peak > 1.0 { 255.0 } else { 1.0 };

    for row in 0..height {
        for col in 0..width {
            let [r, g, b] = [0, 1, 2].map(|c| sample[format.index(row, col, c)] / scale);
            let lab: Lab = Lab::from_color(Srgb::new(r, g, b));
            let neutral: Lab = Lab::new(lab.l, 0.0, 0.0);
            let grey: Srgb = Srgb::from_color(neutral);
            for (c, value) in [grey.red, grey.green, grey.blue].into_iter().enumerate() {
                sample[format.index(row, col, c)] = value * scale;
            }
        }
    }
    Ok(sample)
}

/// Linearly maps the sample's value range onto [0, 1].
///
/// A constant sample maps to all zeros.
pub fn rescale_intensity(sample: Sample) -> Sample {
    let (lo, hi) = value_range(&sample);
    let span = hi - lo;
    if span <= 0.0 {
        return sample.mapv(|_| 0.0);
    }
    sample.mapv(|v| (v - lo) / span)
}

const HISTOGRAM_BINS: usize = 256;

/// Global histogram equalization with 256 bins.
///
/// Each value is replaced by the cumulative fraction of its bin, so the output
/// lies in (0, 1].
pub fn equalize_histogram(sample: Sample) -> Sample {
    if sample.is_empty() {
        return sample;
    }
    let (lo, hi) = value_range(&sample);
    let span = hi - lo;
    let bin_of = |v: f32| -> usize {
        if span <= 0.0 {
            return 0;
        }
        (((v - lo) / span) * HISTOGRAM_BINS as f32).min((HISTOGRAM_BINS - 1) as f32) as usize
    };

    let mut cdf = [0usize; HISTOGRAM_BINS];
    for &v in sample.iter() {
        cdf[bin_of(v)] += 1;
    }
    for i in 1..HISTOGRAM_BINS {
        cdf[i] += cdf[i - 1];
    }
    let total = sample.len() as f32;
    sample.mapv(|v| cdf[bin_of(v)] as f32 / total)
}

fn value_range(sample: &Sample) -> (f32, f32) {
    sample
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
