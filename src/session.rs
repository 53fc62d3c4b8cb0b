//! Run context.
//!
//! One `Session` per run, passed by reference through every phase. Holds
//! the configuration, the compiled patterns, the error buckets, and the
//! bookkeeping the phases share (required page count, missing names,
//! referenced templates, layers created this run).

use std::path::{Path, PathBuf};

use crate::config::{Patterns, Settings};
use crate::errors::{EngineError, ErrorReport};

pub struct Session {
    pub settings: Settings,
    pub patterns: Patterns,
    pub source_root: PathBuf,
    /// Display name of the source root folder; the default layer name for
    /// files placed straight from the root without a template.
    pub source_root_name: String,
    /// Page count of the document before this run; restored when validation
    /// fails and the run does not proceed.
    pub initial_page_count: usize,
    /// Highest page number seen across all files, monotonically raised.
    pub required_page_count: usize,
    pub report: ErrorReport,
    pub missing_master_names: Vec<String>,
    pub missing_division_names: Vec<String>,
    /// Template names referenced by at least one file this run, in first-use
    /// order. Input to the frame-count pass.
    pub referenced_templates: Vec<String>,
    /// Layers created by this run; locked after placement completes.
    pub created_layers: Vec<String>,
}

impl Session {
    pub fn new(
        settings: Settings,
        source_root: &Path,
        initial_page_count: usize,
    ) -> Result<Self, EngineError> {
        let patterns = settings.compile()?;
        let source_root_name = source_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_root.display().to_string());
        Ok(Self {
            settings,
            patterns,
            source_root: source_root.to_path_buf(),
            source_root_name,
            initial_page_count,
            required_page_count: initial_page_count,
            report: ErrorReport::new(),
            missing_master_names: Vec::new(),
            missing_division_names: Vec::new(),
            referenced_templates: Vec::new(),
            created_layers: Vec::new(),
        })
    }

    /// Raise the required page count to cover a page key. Non-numeric keys
    /// (from a custom page-number pattern) are accepted as-is; a key that is
    /// all digits but too large to address any page reports `false` so the
    /// caller can surface it instead of quietly never raising the count.
    pub fn note_page_key(&mut self, key: &str) -> bool {
        match key.parse::<usize>() {
            Ok(number) => {
                if number > self.required_page_count {
                    self.required_page_count = number;
                }
                true
            }
            Err(_) => !key.bytes().all(|b| b.is_ascii_digit()),
        }
    }

    pub fn note_referenced_template(&mut self, name: &str) {
        if !self.referenced_templates.iter().any(|t| t == name) {
            self.referenced_templates.push(name.to_string());
        }
    }

    pub fn note_created_layer(&mut self, name: &str) {
        if !self.created_layers.iter().any(|l| l == name) {
            self.created_layers.push(name.to_string());
        }
    }
}
