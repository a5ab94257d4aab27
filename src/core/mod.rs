pub mod filters;
pub mod flow;
pub mod functions;
pub mod generator;
pub mod geometry;
pub mod random;
pub mod sample;

pub use flow::{
    DirectoryIterator, DirectoryIteratorArgs, FlowOptions, RandomOverSampler, RandomUnderSampler,
    Resampler, SamplingMethod, SamplingStrategy,
};
pub use functions::{SampleFunction, StockFunction};
pub use generator::{rotation_angle, GeneratorOptions, ImageGenerator};
pub use random::{RandomSource, SequenceSource};
pub use sample::{sample_from_image, sample_to_image, DataFormat, Sample};
