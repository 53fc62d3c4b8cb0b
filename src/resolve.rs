//! Name resolution.
//!
//! Pure functions from a file's name and its ancestor-folder chain to a
//! page key, a template name, and a division name. No document state is
//! consulted here.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Patterns;

/// An input file together with its folder chain below the source root.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name including extension.
    pub display_name: String,
    /// Parent folder names ordered leaf to root; the source root itself is
    /// excluded, so a file sitting directly in the root has an empty chain.
    pub ancestors: Vec<String>,
}

impl SourceFile {
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut ancestors = Vec::new();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == root {
                break;
            }
            match dir.file_name() {
                Some(name) => ancestors.push(name.to_string_lossy().into_owned()),
                None => break,
            }
            current = dir.parent();
        }
        Self { path, display_name, ancestors }
    }

    /// Build from raw parts; the chain is leaf→root, root excluded.
    pub fn from_parts(display_name: &str, ancestors: &[&str]) -> Self {
        Self {
            path: PathBuf::from(display_name),
            display_name: display_name.to_string(),
            ancestors: ancestors.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Display name without its extension.
    pub fn stem(&self) -> &str {
        match self.display_name.rfind('.') {
            Some(idx) => &self.display_name[..idx],
            None => &self.display_name,
        }
    }

    pub fn in_source_root(&self) -> bool {
        self.ancestors.is_empty()
    }
}

/// Per-file resolution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    /// Leading numeric token with leading zeros stripped; `None` when the
    /// name has no usable prefix (including an all-zero one).
    pub page_key: Option<String>,
    pub template_name: Option<String>,
    pub division_name: Option<String>,
}

pub struct NameResolver<'a> {
    patterns: &'a Patterns,
}

impl<'a> NameResolver<'a> {
    pub fn new(patterns: &'a Patterns) -> Self {
        Self { patterns }
    }

    /// Extract the page key from a display name.
    pub fn page_key(&self, display_name: &str) -> Option<String> {
        let token = self.patterns.page_number.find(display_name)?.as_str();
        if token.is_empty() {
            return None;
        }
        let stripped = token.trim_start_matches('0');
        if stripped.is_empty() {
            // "0" and "000" behave exactly like a missing prefix.
            None
        } else {
            Some(stripped.to_string())
        }
    }

    /// Resolve template and division names by walking from the file's own
    /// stem up through its ancestor folders, stopping at the source root.
    ///
    /// At each node the division pattern is tested first; a division match
    /// also re-attempts the template pattern on the same node, and only the
    /// template lookup continues upward when that fails. Within a node the
    /// rightmost pattern match wins.
    pub fn resolve(&self, file: &SourceFile) -> ResolvedName {
        let page_key = self.page_key(&file.display_name);

        let mut template_name = None;
        let mut division_name = None;

        let nodes = std::iter::once(file.stem())
            .chain(file.ancestors.iter().map(String::as_str));
        for node in nodes {
            if let Some(division) = last_match(&self.patterns.division, node) {
                division_name = Some(division);
                template_name = last_match(&self.patterns.template, node);
                if template_name.is_some() {
                    break;
                }
                continue;
            }
            if let Some(template) = last_match(&self.patterns.template, node) {
                template_name = Some(template);
                break;
            }
        }

        ResolvedName { page_key, template_name, division_name }
    }
}

fn last_match(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find_iter(text).last().map(|m| m.as_str().to_string())
}
