//! Image augmentation front-end for training pipelines.
//!
//! An [`ImageGenerator`] holds a fixed set of standardization and
//! augmentation steps, applies them to individual samples and hands itself to
//! a directory-backed batch iterator through
//! [`ImageGenerator::flow_from_directory`].

pub mod config;
pub mod core;
pub mod logging;

pub use crate::config::GeneratorSettings;
pub use crate::core::*;
