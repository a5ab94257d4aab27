//! Logging setup for the augmentation tools
//!
//! This module provides:
//! - A bracketed single-line event format
//! - Dual logging (timestamped file + stdout)

mod formatter;
mod setup;

pub use formatter::BracketedFormatter;
pub use setup::setup_logging;
