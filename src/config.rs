//! Run configuration.
//!
//! Everything here is user-editable before a run; the naming patterns are
//! plain regex strings so conventions can be adapted without touching code.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Files without a detectable page number are skipped instead of
    /// reported as errors.
    #[serde(default)]
    pub allow_missing_numbers: bool,
    /// Extension alternation for input discovery, matched case-insensitively.
    #[serde(default = "default_input_formats")]
    pub input_formats: String,
    /// Recognizes a template identifier in a file or folder name.
    #[serde(default = "default_template_pattern")]
    pub template_pattern: String,
    /// Recognizes a sub-division identifier in a file or folder name.
    #[serde(default = "default_division_pattern")]
    pub division_pattern: String,
    /// Extracts the leading page key from a file name.
    #[serde(default = "default_page_number_pattern")]
    pub page_number_pattern: String,
    /// Ordered fallback list for content-import crop behavior.
    #[serde(default = "default_crop_order")]
    pub crop_order: Vec<CropOption>,
    #[serde(default = "default_true")]
    pub transparent_background: bool,
    /// Optional pause after each file's placement, in milliseconds.
    /// Presentation only; does not affect ordering or geometry.
    #[serde(default)]
    pub placement_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_input_formats() -> String {
    "tiff?|gif|jpe?g|bmp|eps|svg|png|ai|psd|pdf".to_string()
}

fn default_template_pattern() -> String {
    "@.*?$".to_string()
}

fn default_division_pattern() -> String {
    "#.*?$".to_string()
}

fn default_page_number_pattern() -> String {
    r"^\d*".to_string()
}

fn default_crop_order() -> Vec<CropOption> {
    vec![
        CropOption::Trim,
        CropOption::Bleed,
        CropOption::Pdf,
        CropOption::Media,
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_missing_numbers: false,
            input_formats: default_input_formats(),
            template_pattern: default_template_pattern(),
            division_pattern: default_division_pattern(),
            page_number_pattern: default_page_number_pattern(),
            crop_order: default_crop_order(),
            transparent_background: true,
            placement_delay_ms: 0,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Compile the naming patterns. Fails fast on an invalid regex so a bad
    /// configuration never reaches the validation pass.
    pub fn compile(&self) -> Result<Patterns, EngineError> {
        let bad = |which: &str, e: regex::Error| EngineError::BadPattern {
            which: which.to_string(),
            source: e,
        };
        Ok(Patterns {
            page_number: Regex::new(&self.page_number_pattern)
                .map_err(|e| bad("pageNumberPattern", e))?,
            template: Regex::new(&self.template_pattern)
                .map_err(|e| bad("templatePattern", e))?,
            division: Regex::new(&self.division_pattern)
                .map_err(|e| bad("divisionPattern", e))?,
            input_filter: Regex::new(&format!(r"(?i)\.(?:{})$", self.input_formats))
                .map_err(|e| bad("inputFormats", e))?,
        })
    }
}

/// Crop fallback options for content import, tried in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropOption {
    Trim,
    Bleed,
    Pdf,
    Media,
}

/// Compiled naming patterns, built once per run.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub page_number: Regex,
    pub template: Regex,
    pub division: Regex,
    pub input_filter: Regex,
}
