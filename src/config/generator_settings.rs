use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::{DataFormat, GeneratorOptions, StockFunction};

/// Generator configuration as stored on disk.
///
/// Callable slots name one of the stock functions; arbitrary closures can
/// only be configured in code through [`GeneratorOptions`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub correct_distortion: bool,
    pub correct_uneven_illumination: bool,
    pub correct_vignetting: bool,
    pub desaturate: Option<StockFunction>,
    pub equalize: Option<StockFunction>,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
    pub preprocessing_function: Option<StockFunction>,
    pub reduce_noise: Option<StockFunction>,
    pub remove_chromatic_aberration: bool,
    pub rescale_intensity: Option<StockFunction>,
    pub rotate: bool,
    pub shift_horizontally: bool,
    pub shift_vertically: bool,
    pub smooth: bool,
    pub data_format: DataFormat,
}

impl GeneratorSettings {
    pub const FILE_NAME: &'static str = "generator.json";

    /// Default settings location in the per-user config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "microscopy", "microscopy-augment")
            .map(|dirs| dirs.config_dir().join(Self::FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        info!("Loaded generator settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings from the default location, or return defaults if the
    /// file doesn't exist or is corrupted.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("Could not determine config directory. Using default settings.");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file at {:?}. Using default settings.", path);
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{:#}. Using default settings.", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        info!("Generator settings saved to {:?}", path);
        Ok(())
    }

    /// Resolves stock function names against the configured layout.
    pub fn to_options(&self) -> GeneratorOptions {
        let format = self.data_format;
        let bind = |stock: Option<StockFunction>| stock.map(|s| s.build(format));

        GeneratorOptions {
            correct_distortion: self.correct_distortion,
            correct_uneven_illumination: self.correct_uneven_illumination,
            correct_vignetting: self.correct_vignetting,
            desaturate: bind(self.desaturate),
            equalize: bind(self.equalize),
            flip_horizontally: self.flip_horizontally,
            flip_vertically: self.flip_vertically,
            preprocessing_function: bind(self.preprocessing_function),
            reduce_noise: bind(self.reduce_noise),
            remove_chromatic_aberration: self.remove_chromatic_aberration,
            rescale_intensity: bind(self.rescale_intensity),
            rotate: self.rotate,
            shift_horizontally: self.shift_horizontally,
            shift_vertically: self.shift_vertically,
            smooth: self.smooth,
            data_format: format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_default_disables_everything() {
        let settings = GeneratorSettings::default();
        let options = settings.to_options();
        assert!(!options.rotate && !options.smooth && !options.flip_horizontally);
        assert!(options.desaturate.is_none());
        assert_eq!(options.data_format, DataFormat::ChannelsLast);
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let json = r#"{ "rotate": true, "equalize": "equalize_histogram", "data_format": "channels_first" }"#;
        let settings: GeneratorSettings = serde_json::from_str(json)?;
        assert!(settings.rotate);
        assert!(!settings.smooth);
        assert_eq!(settings.equalize, Some(StockFunction::EqualizeHistogram));
        assert_eq!(settings.data_format, DataFormat::ChannelsFirst);

        let options = settings.to_options();
        assert_eq!(options.equalize.as_ref().map(|f| f.name()), Some("equalize_histogram"));
        Ok(())
    }

    #[test]
    fn test_unknown_stock_function_is_rejected() {
        let json = r#"{ "desaturate": "sepia" }"#;
        assert!(serde_json::from_str::<GeneratorSettings>(json).is_err());
    }

    #[test]
    fn test_settings_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(GeneratorSettings::FILE_NAME);
        let settings = GeneratorSettings {
            flip_horizontally: true,
            shift_vertically: true,
            reduce_noise: Some(StockFunction::MedianFilter),
            ..Default::default()
        };

        settings.save(&path)?;
        assert_eq!(GeneratorSettings::load(&path)?, settings);
        Ok(())
    }

    #[test]
    fn test_load_reports_malformed_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json")?;
        let err = GeneratorSettings::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
        Ok(())
    }
}
