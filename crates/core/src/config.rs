//! Run configuration for the cleaner and the deck generator.

use crate::types::PlaceholderKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default template deck; its first slide is the prototype.
pub const DEFAULT_TEMPLATE_PATH: &str = "pptx_template.pptx";

/// Default image that replaces every picture.
pub const DEFAULT_IMAGE_PATH: &str = "tacel-logo.png";

/// Default cleaner input.
pub const DEFAULT_CLEAN_INPUT: &str = "test_sheet.csv";

/// Default cleaner output.
pub const DEFAULT_CLEAN_OUTPUT: &str = "cleaned_file.csv";

/// Settings for one deck generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub template_path: PathBuf,
    pub image_path: PathBuf,
    /// Keep the prototype slide at the front of the output deck.
    pub keep_prototype: bool,
    /// Placeholder roles removed from every generated slide.
    pub strip_placeholders: Vec<PlaceholderKind>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            keep_prototype: false,
            strip_placeholders: vec![PlaceholderKind::Title, PlaceholderKind::Body],
        }
    }
}

impl GeneratorConfig {
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = path.into();
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = path.into();
        self
    }

    pub fn with_keep_prototype(mut self, keep: bool) -> Self {
        self.keep_prototype = keep;
        self
    }

    /// Placeholder roles removed from generated slides.
    pub fn with_strip_placeholders(mut self, kinds: Vec<PlaceholderKind>) -> Self {
        self.strip_placeholders = kinds;
        self
    }
}

/// Settings for one cleaning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Cell values treated as missing in addition to the empty string.
    pub na_values: Vec<String>,
    /// Also treat pandas' default NA tokens (`NaN`, `NULL`, `N/A`, ...) as missing.
    pub keep_default_na: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_CLEAN_INPUT),
            output_path: PathBuf::from(DEFAULT_CLEAN_OUTPUT),
            na_values: Vec::new(),
            keep_default_na: true,
        }
    }
}
