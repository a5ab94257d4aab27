//! The image generator: a fixed configuration of standardization and
//! augmentation steps applied to one sample at a time.

use anyhow::{Context, Result};
use std::f64::consts::PI;
use tracing::{debug, trace, warn};

use super::filters::gaussian_smooth;
use super::functions::SampleFunction;
use super::geometry::{flip, rotate, shift};
use super::random::RandomSource;
use super::sample::{DataFormat, Sample};

/// Coin flips below this value enable a flip or shift step.
pub const COIN_THRESHOLD: f64 = 0.5;

/// Range, in nominal degrees, of the rotation draw.
pub const ROTATION_RANGE_DEG: f64 = 360.0;

/// Fraction of the axis length bounding a shift in either direction.
pub const SHIFT_FRACTION: f64 = 0.5;

/// Options recognised by [`ImageGenerator`]. Everything is off by default.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Reserved, has no effect.
    pub correct_distortion: bool,
    /// Reserved, has no effect.
    pub correct_uneven_illumination: bool,
    /// Reserved, has no effect.
    pub correct_vignetting: bool,
    pub desaturate: Option<SampleFunction>,
    pub equalize: Option<SampleFunction>,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
    /// Runs before every other standardization step.
    pub preprocessing_function: Option<SampleFunction>,
    pub reduce_noise: Option<SampleFunction>,
    /// Reserved, has no effect.
    pub remove_chromatic_aberration: bool,
    pub rescale_intensity: Option<SampleFunction>,
    pub rotate: bool,
    pub shift_horizontally: bool,
    pub shift_vertically: bool,
    pub smooth: bool,
    /// Layout of the samples this generator receives.
    pub data_format: DataFormat,
}

impl GeneratorOptions {
    /// Names of the reserved options that are switched on.
    pub fn reserved_enabled(&self) -> Vec<&'static str> {
        [
            ("correct_distortion", self.correct_distortion),
            ("correct_uneven_illumination", self.correct_uneven_illumination),
            ("correct_vignetting", self.correct_vignetting),
            ("remove_chromatic_aberration", self.remove_chromatic_aberration),
        ]
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Maps a rotation draw in nominal degrees to the angle handed to
/// [`rotate`], in radians.
///
/// The scale is `pi / 360`, so the full draw range covers `[-pi, pi]`.
pub fn rotation_angle(draw_deg: f64) -> f64 {
    PI / 360.0 * draw_deg
}

/// Applies a fixed set of standardization and augmentation steps to samples.
///
/// The configuration cannot change after construction. Cloning is cheap and
/// is how directory iterators get their own handle.
#[derive(Debug, Clone, Default)]
pub struct ImageGenerator {
    options: GeneratorOptions,
}

impl ImageGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        for name in options.reserved_enabled() {
            warn!("Option `{}` is reserved and currently has no effect", name);
        }
        debug!("Image generator configured: {:?}", options);
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn data_format(&self) -> DataFormat {
        self.options.data_format
    }

    /// Deterministic normalization, identical for training and inference.
    ///
    /// Runs the configured callables in the order preprocessing, desaturate,
    /// rescale intensity, equalize, reduce noise. Absent steps are skipped;
    /// the first failing step aborts the call.
    pub fn standardize(&self, sample: Sample) -> Result<Sample> {
        let steps = [
            ("preprocessing_function", &self.options.preprocessing_function),
            ("desaturate", &self.options.desaturate),
            ("rescale_intensity", &self.options.rescale_intensity),
            ("equalize", &self.options.equalize),
            ("reduce_noise", &self.options.reduce_noise),
        ];

        let mut x = sample;
        for (step, func) in steps {
            if let Some(func) = func {
                trace!("standardize: {} ({})", step, func.name());
                x = func
                    .call(x)
                    .with_context(|| format!("Standardization step `{}` ({}) failed", step, func.name()))?;
            }
        }
        Ok(x)
    }

    /// Randomized augmentation for training.
    ///
    /// Steps run in the order horizontal flip, vertical flip, rotation,
    /// horizontal shift, vertical shift, smoothing. Flips and shifts each
    /// draw a coin first and only run when it lands below 0.5; rotation and
    /// smoothing run whenever enabled. Disabled steps draw nothing.
    pub fn transform<R>(&self, sample: Sample, rng: &mut R) -> Sample
    where
        R: RandomSource + ?Sized,
    {
        let opts = &self.options;
        let format = opts.data_format;
        let mut x = sample;

        if opts.flip_horizontally && coin(rng) {
            trace!("transform: horizontal flip");
            x = flip(&x, format.width_axis());
        }

        if opts.flip_vertically && coin(rng) {
            trace!("transform: vertical flip");
            x = flip(&x, format.height_axis());
        }

        if opts.rotate {
            let draw = rng.uniform(-ROTATION_RANGE_DEG, ROTATION_RANGE_DEG);
            let angle = rotation_angle(draw);
            trace!("transform: rotate by {:.4} rad", angle);
            x = rotate(&x, angle, format);
        }

        if opts.shift_horizontally && coin(rng) {
            let axis = format.width_axis();
            let offset = shift_offset(rng, x.len_of(axis));
            trace!("transform: horizontal shift by {:.2}", offset);
            x = shift(&x, axis, offset);
        }

        if opts.shift_vertically && coin(rng) {
            let axis = format.height_axis();
            let offset = shift_offset(rng, x.len_of(axis));
            trace!("transform: vertical shift by {:.2}", offset);
            x = shift(&x, axis, offset);
        }

        if opts.smooth {
            let sigma = rng.next_unit();
            trace!("transform: gaussian smoothing, sigma {:.3}", sigma);
            x = gaussian_smooth(&x, sigma, format);
        }

        x
    }
}

fn coin<R: RandomSource + ?Sized>(rng: &mut R) -> bool {
    rng.next_unit() < COIN_THRESHOLD
}

fn shift_offset<R: RandomSource + ?Sized>(rng: &mut R, extent: usize) -> f64 {
    let bound = SHIFT_FRACTION * extent as f64;
    rng.uniform(-bound, bound)
}
