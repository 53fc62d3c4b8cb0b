//! Error model.
//!
//! Two tiers: `EngineError` is fatal and aborts before the engine runs;
//! `ErrorReport` collects the four non-fatal validation categories that are
//! surfaced together before any placement occurs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No target document is open")]
    NoDocument,

    #[error("No input folder selected: {0}")]
    NoSourceFolder(String),

    #[error("No matching input files found under the source folder")]
    NoInputFiles,

    #[error("Invalid {which} pattern: {source}")]
    BadPattern {
        which: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The four validation categories. Order is fixed; the report always prints
/// them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NoPageNumber,
    MissingMaster,
    NoMasterGraphicFrame,
    MissingLayer,
}

pub const ERROR_KINDS: [ErrorKind; 4] = [
    ErrorKind::NoPageNumber,
    ErrorKind::MissingMaster,
    ErrorKind::NoMasterGraphicFrame,
    ErrorKind::MissingLayer,
];

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NoPageNumber => {
                "# Missing page numbers:\n> (Make sure all files have page numbers or turn on the setting \"allowMissingNumbers\")"
            }
            ErrorKind::MissingMaster => {
                "# Missing master pages:\n> (You have folders with these template names, but no matching master pages in the document)"
            }
            ErrorKind::NoMasterGraphicFrame => {
                "# Template (master page) is missing a graphic frame:\n> (You need at least one graphic frame per template page. If you only use 1 page of the master spread, delete the other page)"
            }
            ErrorKind::MissingLayer => {
                "# Missing division layer:\n> (You have folders with these division names, but no matching layers in the document)"
            }
        }
    }
}

/// Categorized, de-duplicated validation errors.
///
/// Each bucket keeps insertion order; pushing a message already present in
/// its bucket is a no-op and reports `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorReport {
    no_page_number: Vec<String>,
    missing_master: Vec<String>,
    no_master_graphic_frame: Vec<String>,
    missing_layer: Vec<String>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, kind: ErrorKind) -> &Vec<String> {
        match kind {
            ErrorKind::NoPageNumber => &self.no_page_number,
            ErrorKind::MissingMaster => &self.missing_master,
            ErrorKind::NoMasterGraphicFrame => &self.no_master_graphic_frame,
            ErrorKind::MissingLayer => &self.missing_layer,
        }
    }

    fn bucket_mut(&mut self, kind: ErrorKind) -> &mut Vec<String> {
        match kind {
            ErrorKind::NoPageNumber => &mut self.no_page_number,
            ErrorKind::MissingMaster => &mut self.missing_master,
            ErrorKind::NoMasterGraphicFrame => &mut self.no_master_graphic_frame,
            ErrorKind::MissingLayer => &mut self.missing_layer,
        }
    }

    /// Record a message under a category. Returns whether it was actually
    /// added (duplicates are dropped).
    pub fn push(&mut self, kind: ErrorKind, message: impl Into<String>) -> bool {
        let message = message.into();
        let bucket = self.bucket_mut(kind);
        if bucket.iter().any(|m| *m == message) {
            return false;
        }
        bucket.push(message);
        true
    }

    pub fn messages(&self, kind: ErrorKind) -> &[String] {
        self.bucket(kind)
    }

    pub fn len(&self) -> usize {
        ERROR_KINDS.iter().map(|k| self.bucket(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every recorded error is a `NoPageNumber` entry. Used for
    /// the "proceed anyway" escape hatch.
    pub fn only_missing_page_numbers(&self) -> bool {
        !self.is_empty()
            && ERROR_KINDS
                .iter()
                .filter(|k| **k != ErrorKind::NoPageNumber)
                .all(|k| self.bucket(*k).is_empty())
    }

    /// Render the whole report as the user-facing text block.
    pub fn render(&self) -> String {
        let mut out = String::from("These errors have to be resolved before you can continue!");
        for kind in ERROR_KINDS {
            let bucket = self.bucket(kind);
            if bucket.is_empty() {
                continue;
            }
            out.push_str("\n\n");
            out.push_str(kind.label());
            out.push_str("\n\n");
            for message in bucket {
                out.push_str("* ");
                out.push_str(message);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_deduplicates_within_a_bucket() {
        let mut report = ErrorReport::new();
        assert!(report.push(ErrorKind::MissingMaster, "@a-cover"));
        assert!(!report.push(ErrorKind::MissingMaster, "@a-cover"));
        assert!(report.push(ErrorKind::MissingLayer, "@a-cover"));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn render_keeps_category_order() {
        let mut report = ErrorReport::new();
        report.push(ErrorKind::MissingLayer, "#div");
        report.push(ErrorKind::NoPageNumber, "cover.pdf");
        let text = report.render();
        let pages = text.find("Missing page numbers").unwrap();
        let layers = text.find("Missing division layer").unwrap();
        assert!(pages < layers);
        assert!(text.contains("* cover.pdf"));
    }

    #[test]
    fn escape_hatch_requires_only_page_number_errors() {
        let mut report = ErrorReport::new();
        assert!(!report.only_missing_page_numbers());
        report.push(ErrorKind::NoPageNumber, "cover.pdf");
        assert!(report.only_missing_page_numbers());
        report.push(ErrorKind::MissingMaster, "@a-cover");
        assert!(!report.only_missing_page_numbers());
    }
}
