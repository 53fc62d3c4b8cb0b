//! Validation pass.
//!
//! Runs before any placement and fills the session's error buckets. The
//! only document mutations allowed here are the declared pre-conditions:
//! applying the raised page count and removing stale layers from earlier
//! runs, both of which keep repeated validation accurate.

use tracing::debug;

use crate::document::Inventory;
use crate::errors::ErrorKind;
use crate::layout::LayoutPlanner;
use crate::resolve::{NameResolver, SourceFile};
use crate::session::Session;

pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Two passes over the file list plus a frame-count pass over every
    /// referenced template. Produces a go/no-go signal through
    /// `session.report`.
    pub fn validate(
        &self,
        doc: &mut dyn Inventory,
        session: &mut Session,
        files: &[SourceFile],
    ) {
        let patterns = session.patterns.clone();
        let resolver = NameResolver::new(&patterns);

        // Pre-pass: raise the required page count so master lookups that
        // depend on page existence succeed in the main pass.
        for file in files {
            if let Some(key) = resolver.page_key(&file.display_name) {
                if !session.note_page_key(&key) && !session.settings.allow_missing_numbers {
                    // Numeric prefix too large to address any page; the file
                    // could never land anywhere.
                    session
                        .report
                        .push(ErrorKind::NoPageNumber, file.display_name.clone());
                }
            }
        }
        doc.set_page_count(session.required_page_count);
        debug!(pages = session.required_page_count, "applied required page count");

        // Main pass.
        for file in files {
            let resolved = resolver.resolve(file);

            let Some(page_key) = resolved.page_key.as_deref() else {
                if !session.settings.allow_missing_numbers {
                    session
                        .report
                        .push(ErrorKind::NoPageNumber, file.display_name.clone());
                }
                continue;
            };

            // Stale-layer cleanup: a re-run against the same inputs must not
            // accumulate duplicates of previously placed content.
            let mut layer_name = resolved.template_name.clone();
            if layer_name.is_none() && file.in_source_root() {
                layer_name = Some(session.source_root_name.clone());
            }
            if let Some(name) = layer_name.as_deref() {
                doc.remove_layer(name);
            }

            let dest_page = doc.find_page_by_key(page_key);

            if let Some(template_name) = resolved.template_name.as_deref() {
                match LayoutPlanner::resolve_master(&*doc, template_name, dest_page) {
                    Some(_) => session.note_referenced_template(template_name),
                    None => {
                        let suffix = if template_name.contains('-') {
                            ""
                        } else {
                            " (Invalid name: the template name needs a dash after its prefix, like \"A-master\")"
                        };
                        let message = format!("{template_name}{suffix}");
                        if session.report.push(ErrorKind::MissingMaster, message) {
                            session.missing_master_names.push(template_name.to_string());
                        }
                    }
                }
            }

            if let Some(division_name) = resolved.division_name.as_deref() {
                if doc.find_layer(division_name).is_none()
                    && session.report.push(ErrorKind::MissingLayer, division_name)
                {
                    session.missing_division_names.push(division_name.to_string());
                }
            }
        }

        // Frame-count pass: every referenced template page needs at least
        // one frame to duplicate.
        for template_name in session.referenced_templates.clone() {
            let Some(template) = doc.find_template(&template_name) else {
                continue;
            };
            let empty_pages: Vec<String> = template
                .pages
                .iter()
                .filter(|p| p.frames.is_empty())
                .map(|p| format!("{}({})", template_name, p.side.label()))
                .collect();
            for message in empty_pages {
                session.report.push(ErrorKind::NoMasterGraphicFrame, message);
            }
        }

        debug!(errors = session.report.len(), "validation finished");
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
