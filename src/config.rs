use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::style::hex_color;
use crate::error::{ConvertError, Result};

/// Twips per inch, the unit WordprocessingML uses for margins and indents.
pub const TWIPS_PER_INCH: f32 = 1440.0;

/// Office theme hyperlink blue
pub const DEFAULT_HYPERLINK_COLOR: &str = "0563C1";

/// Converter configuration for html2docx
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Title used when the HTML has no `<title>`
    pub default_title: String,

    /// Page margin applied to all four sides
    pub margin_inches: f32,

    /// Left indent added per list nesting level
    pub list_indent_inches: f32,

    /// Longest bookmark name Word accepts
    pub max_bookmark_len: usize,

    /// Colour for internal and external hyperlinks: `0563C1`, `#0563C1`
    /// or `rgb(5, 99, 193)`
    pub hyperlink_color: String,

    /// Embed `<img>` elements; disabled by default
    pub embed_images: bool,
    pub image_max_width: u32,
    pub image_max_height: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            default_title: "Converted Document".to_string(),
            margin_inches: 1.0,
            list_indent_inches: 0.25,
            max_bookmark_len: 40,
            hyperlink_color: DEFAULT_HYPERLINK_COLOR.to_string(),
            embed_images: false,
            image_max_width: 500,
            image_max_height: 400,
        }
    }
}

impl ConverterConfig {
    /// Load config from the user config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        Ok(ConverterConfig::default())
    }

    /// Load config from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ConverterConfig =
            toml::from_str(&content).map_err(|e| ConvertError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the user config directory
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Some(config_path) = Self::get_config_path() else {
            return Ok(None);
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConvertError::Config(e.to_string()))?;
        fs::write(&config_path, content)?;

        Ok(Some(config_path))
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("html2docx").join("config.toml"))
    }

    /// Write the default config file, returning where it went
    pub fn init_default() -> Result<Option<PathBuf>> {
        ConverterConfig::default().save()
    }

    fn validate(&self) -> Result<()> {
        if self.max_bookmark_len == 0 {
            return Err(ConvertError::Config(
                "max_bookmark_len must be at least 1".to_string(),
            ));
        }
        if self.margin_inches < 0.0 || self.list_indent_inches < 0.0 {
            return Err(ConvertError::Config(
                "margins and indents cannot be negative".to_string(),
            ));
        }
        if hex_color(&self.hyperlink_color).is_none() {
            return Err(ConvertError::Config(format!(
                "hyperlink_color {:?} is not a six-digit hex or rgb() colour",
                self.hyperlink_color
            )));
        }
        Ok(())
    }

    /// Hyperlink colour as six uppercase hex digits, falling back to the
    /// default blue when the configured value is unusable
    pub fn hyperlink_hex(&self) -> String {
        hex_color(&self.hyperlink_color).unwrap_or_else(|| DEFAULT_HYPERLINK_COLOR.to_string())
    }

    pub fn margin_twips(&self) -> i32 {
        (self.margin_inches * TWIPS_PER_INCH).round() as i32
    }

    /// Left indent in twips for a list at `level` (1-based)
    pub fn list_indent_twips(&self, level: usize) -> i32 {
        (level as f32 * self.list_indent_inches * TWIPS_PER_INCH).round() as i32
    }
}
