//! On-disk configuration for the image generator.

mod generator_settings;

pub use generator_settings::GeneratorSettings;
