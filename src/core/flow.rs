//! Wiring a generator to a directory-backed batch iterator.
//!
//! Directory scanning, batching and the resampling algorithms belong to the
//! collaborators behind [`DirectoryIterator`] and [`Resampler`]; this module
//! only resolves the sampling method and hands everything over.

use anyhow::Result;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::generator::ImageGenerator;

/// A class-balancing policy applied by the directory iterator.
pub trait Resampler: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Seed the strategy was constructed with.
    fn random_state(&self) -> Option<u64>;
}

/// Duplicates minority-class samples at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RandomOverSampler {
    random_state: Option<u64>,
}

impl RandomOverSampler {
    pub fn new(random_state: Option<u64>) -> Self {
        Self { random_state }
    }
}

impl Resampler for RandomOverSampler {
    fn name(&self) -> &'static str {
        "RandomOverSampler"
    }

    fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// Drops majority-class samples at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RandomUnderSampler {
    random_state: Option<u64>,
}

impl RandomUnderSampler {
    pub fn new(random_state: Option<u64>) -> Self {
        Self { random_state }
    }
}

impl Resampler for RandomUnderSampler {
    fn name(&self) -> &'static str {
        "RandomUnderSampler"
    }

    fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// How the caller asks for class balancing.
#[derive(Debug, Clone)]
pub enum SamplingMethod {
    /// Resolved to a [`RandomOverSampler`] seeded with the flow seed.
    Oversample,
    /// Resolved to a [`RandomUnderSampler`] seeded with the flow seed.
    Undersample,
    /// A ready-made strategy, forwarded unchanged.
    Strategy(Arc<dyn Resampler>),
    /// Any other name, forwarded unchanged.
    Other(String),
}

impl SamplingMethod {
    /// Resolves the method into what the directory iterator receives.
    pub fn resolve(self, seed: Option<u64>) -> SamplingStrategy {
        match self {
            SamplingMethod::Oversample => {
                SamplingStrategy::Resampler(Arc::new(RandomOverSampler::new(seed)))
            }
            SamplingMethod::Undersample => {
                SamplingStrategy::Resampler(Arc::new(RandomUnderSampler::new(seed)))
            }
            SamplingMethod::Strategy(strategy) => SamplingStrategy::Resampler(strategy),
            SamplingMethod::Other(name) => SamplingStrategy::Unrecognized(name),
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "oversample" => SamplingMethod::Oversample,
            "undersample" => SamplingMethod::Undersample,
            other => SamplingMethod::Other(other.to_string()),
        })
    }
}

impl From<&str> for SamplingMethod {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

/// What the directory iterator receives in place of a sampling method.
///
/// How an iterator treats `Unrecognized` is up to the iterator.
#[derive(Debug, Clone)]
pub enum SamplingStrategy {
    Resampler(Arc<dyn Resampler>),
    Unrecognized(String),
}

impl SamplingStrategy {
    pub fn resampler(&self) -> Option<&dyn Resampler> {
        match self {
            SamplingStrategy::Resampler(strategy) => Some(strategy.as_ref()),
            SamplingStrategy::Unrecognized(_) => None,
        }
    }
}

/// Parameters of [`ImageGenerator::flow_from_directory`] besides the
/// directory itself.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub batch_size: usize,
    pub sampling_method: Option<SamplingMethod>,
    /// Seeds the resampling strategy and the iterator's shuffling.
    pub seed: Option<u64>,
    /// Target sample shape.
    pub shape: (usize, usize, usize),
    pub shuffle: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            sampling_method: None,
            seed: None,
            shape: (224, 224, 3),
            shuffle: true,
        }
    }
}

/// Everything a directory iterator is constructed from.
#[derive(Debug, Clone)]
pub struct DirectoryIteratorArgs {
    pub batch_size: usize,
    pub directory: PathBuf,
    /// Called back for `standardize` and `transform` on every sample.
    pub generator: ImageGenerator,
    pub sampling_method: Option<SamplingStrategy>,
    pub seed: Option<u64>,
    pub shape: (usize, usize, usize),
    pub shuffle: bool,
}

/// A batch iterator over a directory of samples.
pub trait DirectoryIterator: Sized {
    fn new(args: DirectoryIteratorArgs) -> Result<Self>;
}

impl ImageGenerator {
    /// Builds a directory iterator driven by this generator.
    ///
    /// Performs no I/O; whatever the iterator constructor returns is passed
    /// back to the caller.
    pub fn flow_from_directory<I>(
        &self,
        directory: impl Into<PathBuf>,
        options: FlowOptions,
    ) -> Result<I>
    where
        I: DirectoryIterator,
    {
        let FlowOptions {
            batch_size,
            sampling_method,
            seed,
            shape,
            shuffle,
        } = options;
        let sampling_method = sampling_method.map(|method| method.resolve(seed));
        let directory = directory.into();

        debug!(
            "Creating directory iterator for {:?} (batch_size={}, sampling={:?}, seed={:?}, shape={:?}, shuffle={})",
            directory, batch_size, sampling_method, seed, shape, shuffle
        );

        I::new(DirectoryIteratorArgs {
            batch_size,
            directory,
            generator: self.clone(),
            sampling_method,
            seed,
            shape,
            shuffle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Recorded(DirectoryIteratorArgs);

    impl DirectoryIterator for Recorded {
        fn new(args: DirectoryIteratorArgs) -> Result<Self> {
            Ok(Self(args))
        }
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_generator_and_iterator_args_are_send_sync() {
        assert_send_sync::<ImageGenerator>();
        assert_send_sync::<DirectoryIteratorArgs>();
        assert_send_sync::<SamplingStrategy>();
    }

    #[test]
    fn test_parse_sampling_method() {
        assert!(matches!(SamplingMethod::from("oversample"), SamplingMethod::Oversample));
        assert!(matches!(SamplingMethod::from("undersample"), SamplingMethod::Undersample));
        match SamplingMethod::from("smote") {
            SamplingMethod::Other(name) => assert_eq!(name, "smote"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_flow_defaults_forwarded() -> Result<()> {
        let generator = ImageGenerator::default();
        let Recorded(args) =
            generator.flow_from_directory::<Recorded>("data/train", FlowOptions::default())?;
        assert_eq!(args.batch_size, 32);
        assert_eq!(args.directory, PathBuf::from("data/train"));
        assert!(args.sampling_method.is_none());
        assert_eq!(args.seed, None);
        assert_eq!(args.shape, (224, 224, 3));
        assert!(args.shuffle);
        Ok(())
    }

    #[test]
    fn test_oversample_resolves_to_seeded_strategy() -> Result<()> {
        let generator = ImageGenerator::default();
        let Recorded(args) = generator.flow_from_directory::<Recorded>(
            "data",
            FlowOptions {
                sampling_method: Some(SamplingMethod::Oversample),
                seed: Some(42),
                ..Default::default()
            },
        )?;
        let strategy = args.sampling_method.expect("strategy forwarded");
        let resampler = strategy.resampler().expect("resolved to a resampler");
        assert_eq!(resampler.name(), "RandomOverSampler");
        assert_eq!(resampler.random_state(), Some(42));
        assert_eq!(args.seed, Some(42));
        Ok(())
    }

    #[test]
    fn test_undersample_without_seed() {
        let strategy = SamplingMethod::Undersample.resolve(None);
        let resampler = strategy.resampler().unwrap();
        assert_eq!(resampler.name(), "RandomUnderSampler");
        assert_eq!(resampler.random_state(), None);
    }

    #[test]
    fn test_custom_strategy_and_unknown_name_pass_through() {
        let custom: Arc<dyn Resampler> = Arc::new(RandomUnderSampler::new(Some(3)));
        match SamplingMethod::Strategy(custom.clone()).resolve(Some(99)) {
            SamplingStrategy::Resampler(strategy) => assert!(Arc::ptr_eq(&strategy, &custom)),
            other => panic!("unexpected {:?}", other),
        }

        match SamplingMethod::from("tomek").resolve(Some(1)) {
            SamplingStrategy::Unrecognized(name) => assert_eq!(name, "tomek"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_iterator_error_is_returned() {
        #[derive(Debug)]
        struct Failing;
        impl DirectoryIterator for Failing {
            fn new(args: DirectoryIteratorArgs) -> Result<Self> {
                bail!("cannot read {}", args.directory.display())
            }
        }

        let generator = ImageGenerator::default();
        let result = generator.flow_from_directory::<Failing>("missing", FlowOptions::default());
        assert!(result.unwrap_err().to_string().contains("missing"));
    }
}
