//! Placement driver.
//!
//! Orchestrates the run: validate, decide, then place file by file in input
//! order. Frames are duplicated and positioned before any content import is
//! attempted, so an import failure never disturbs sibling geometry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{ContentImporter, Inventory, PageRef};
use crate::errors::ErrorReport;
use crate::layout::{LayoutPlanner, PlannedFrame};
use crate::resolve::{NameResolver, SourceFile};
use crate::session::Session;
use crate::validate::Validator;

/// Everything needed to place one file. Built fresh per file immediately
/// before placement and discarded after use.
struct Item<'a> {
    file: &'a SourceFile,
    page: Option<PageRef>,
    division: Option<String>,
    frames: Vec<PlannedFrame>,
}

/// Outcome counters for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub run_id: Uuid,
    pub engine_version: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Human-readable elapsed time, e.g. `"1m 02.35s"`.
    pub elapsed: String,
    pub files_total: usize,
    pub files_placed: usize,
    pub files_skipped: usize,
    pub frames_placed: usize,
    /// Frames whose every crop option failed; left empty by design.
    pub frames_empty: usize,
}

fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) as f64 / 1000.0;
    if minutes > 0 {
        format!("{}m {:05.2}s", minutes, seconds)
    } else {
        format!("{:.2}s", seconds)
    }
}

pub struct PlacementDriver<I: ContentImporter> {
    importer: I,
}

impl<I: ContentImporter> PlacementDriver<I> {
    pub fn new(importer: I) -> Self {
        Self { importer }
    }

    pub fn importer(&self) -> &I {
        &self.importer
    }

    /// Place every file, in input order. Assumes validation has already
    /// approved the run; files without a page key are skipped silently here
    /// because the validator has reported them.
    pub fn run(
        &mut self,
        doc: &mut dyn Inventory,
        session: &mut Session,
        files: &[SourceFile],
    ) -> PlacementReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut files_placed = 0;
        let mut files_skipped = 0;
        let mut frames_placed = 0;
        let mut frames_empty = 0;

        for file in files {
            let Some(item) = self.build_item(doc, session, file) else {
                files_skipped += 1;
                continue;
            };
            let page_name = item
                .page
                .map(|p| doc.page(p).name.clone())
                .unwrap_or_default();
            info!(
                file = %item.file.display_name,
                page = %page_name,
                frames = item.frames.len(),
                "placing"
            );

            for frame in &item.frames {
                // Only frames from the division's own layer receive content;
                // without a division every frame does.
                let selected = match (&item.division, frame.source_layer.as_deref()) {
                    (Some(division), Some(layer)) => division == layer,
                    (Some(_), None) => false,
                    (None, _) => true,
                };
                if !selected {
                    continue;
                }
                if self.import_with_fallback(doc, frame, item.file, session) {
                    frames_placed += 1;
                } else {
                    warn!(
                        file = %item.file.display_name,
                        "all crop options failed; frame left empty"
                    );
                    frames_empty += 1;
                }
            }
            files_placed += 1;

            if session.settings.placement_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(session.settings.placement_delay_ms));
            }
        }

        // Lock every layer this run created so placed content survives
        // untouched until the next run's stale-layer cleanup.
        for layer in &session.created_layers {
            doc.set_layer_locked(layer, true);
        }

        let finished_at = Utc::now();
        PlacementReport {
            run_id: Uuid::new_v4(),
            engine_version: crate::ENGINE_VERSION,
            started_at,
            finished_at,
            elapsed: format_elapsed(clock.elapsed()),
            files_total: files.len(),
            files_placed,
            files_skipped,
            frames_placed,
            frames_empty,
        }
    }

    fn build_item<'a>(
        &self,
        doc: &mut dyn Inventory,
        session: &mut Session,
        file: &'a SourceFile,
    ) -> Option<Item<'a>> {
        let patterns = session.patterns.clone();
        let resolver = NameResolver::new(&patterns);
        let resolved = resolver.resolve(file);
        let page_key = resolved.page_key?;

        let page = doc.find_page_by_key(&page_key);
        let master = resolved
            .template_name
            .as_deref()
            .and_then(|name| LayoutPlanner::resolve_master(&*doc, name, page));

        let mut layer_name = resolved.template_name.clone();
        if layer_name.is_none() && file.in_source_root() {
            layer_name = Some(session.source_root_name.clone());
        }
        if let Some(name) = layer_name.as_deref() {
            if doc.find_layer(name).is_none() {
                doc.create_layer(name);
                session.note_created_layer(name);
            }
        }

        let frames = match (page, layer_name.as_deref()) {
            (Some(dest), Some(layer)) => LayoutPlanner::plan_frames(
                doc,
                dest,
                master,
                resolved.division_name.as_deref(),
                layer,
            ),
            _ => Vec::new(),
        };

        Some(Item {
            file,
            page,
            division: resolved.division_name,
            frames,
        })
    }

    /// Try the configured crop options in order; the first success wins.
    /// Per-option failures are transient by contract and only logged.
    fn import_with_fallback(
        &mut self,
        doc: &mut dyn Inventory,
        frame: &PlannedFrame,
        file: &SourceFile,
        session: &Session,
    ) -> bool {
        for crop in &session.settings.crop_order {
            match self.importer.import(
                doc,
                frame.item,
                file,
                *crop,
                session.settings.transparent_background,
            ) {
                Ok(()) => return true,
                Err(e) => {
                    debug!(
                        file = %file.display_name,
                        crop = ?crop,
                        error = %e,
                        "crop option failed, trying next"
                    );
                }
            }
        }
        false
    }
}

/// Decisions normally made interactively after a failed validation.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Scaffold a stub master template for each missing template name (the
    /// name must contain a hyphen) and an empty layer for each missing
    /// division name. The run still stops.
    pub create_missing: bool,
    /// Proceed with placement when the only validation errors are missing
    /// page numbers.
    pub proceed_on_missing_numbers: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RunOutcome {
    /// Placement ran to completion. `errors` is present when the run went
    /// through the missing-page-numbers escape hatch.
    Placed {
        report: PlacementReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        errors: Option<ErrorReport>,
    },
    /// Validation failed and placement never started. The document's page
    /// count has been rolled back.
    Blocked {
        errors: ErrorReport,
        rendered: String,
    },
}

/// Full validate-then-apply pipeline over an already collected file list.
pub fn run_pipeline<I: ContentImporter>(
    doc: &mut dyn Inventory,
    session: &mut Session,
    files: &[SourceFile],
    importer: I,
    options: &PipelineOptions,
) -> RunOutcome {
    Validator::new().validate(doc, session, files);

    if session.report.is_empty() {
        let report = PlacementDriver::new(importer).run(doc, session, files);
        return RunOutcome::Placed { report, errors: None };
    }

    if options.create_missing {
        scaffold_missing(doc, session);
    }

    if options.proceed_on_missing_numbers && session.report.only_missing_page_numbers() {
        let report = PlacementDriver::new(importer).run(doc, session, files);
        return RunOutcome::Placed {
            report,
            errors: Some(session.report.clone()),
        };
    }

    // Roll the page count back; the raise was only a validation
    // pre-condition.
    doc.set_page_count(session.initial_page_count);
    RunOutcome::Blocked {
        errors: session.report.clone(),
        rendered: session.report.render(),
    }
}

/// Create stubs for missing masters and divisions so the next run can
/// validate against them. Master stubs need a `prefix-base` shaped name.
fn scaffold_missing(doc: &mut dyn Inventory, session: &Session) {
    for name in &session.missing_master_names {
        if name.contains('-') {
            doc.create_template(name);
            info!(template = %name, "created master template stub");
        }
    }
    for name in &session.missing_division_names {
        doc.create_layer(name);
        info!(layer = %name, "created division layer");
    }
}
