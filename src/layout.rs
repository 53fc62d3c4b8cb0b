//! Frame resolution and the coordinate transform.
//!
//! Resolves a template name to one physical master page (side tie-break)
//! and duplicates that page's frames onto a destination page, translating
//! their bounds for single-sided vs. double-sided templates and spread
//! parity. Geometry is always committed before any content import runs.

use tracing::debug;

use crate::document::{FrameAddr, Inventory, ItemRef, PageRef, PageSide};
use crate::geometry::Rect;

/// One physical page of one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterPageRef {
    pub template: usize,
    pub page: usize,
}

/// A frame duplicated (or synthesized) onto the destination page, plus the
/// name of the layer it came from. The source layer drives the division
/// filter applied before content import; synthetic frames have none.
#[derive(Debug, Clone)]
pub struct PlannedFrame {
    pub item: ItemRef,
    pub source_layer: Option<String>,
}

pub struct LayoutPlanner;

impl LayoutPlanner {
    /// Find the master page for a template name.
    ///
    /// A single-page template is used unconditionally. A template spanning
    /// more than one physical page picks the page whose side matches the
    /// destination page; when the comparison cannot be made (no destination
    /// page, or no side matches) the template's first page is the fallback.
    pub fn resolve_master(
        doc: &dyn Inventory,
        template_name: &str,
        dest_page: Option<PageRef>,
    ) -> Option<MasterPageRef> {
        let (index, template) = doc
            .templates()
            .iter()
            .enumerate()
            .find(|(_, t)| t.name == template_name)?;

        if template.pages.len() > 1 {
            if let Some(dest) = dest_page {
                let dest_side = doc.page(dest).side;
                if let Some(page) = template.pages.iter().position(|p| p.side == dest_side) {
                    return Some(MasterPageRef { template: index, page });
                }
            }
            Some(MasterPageRef { template: index, page: 0 })
        } else {
            Some(MasterPageRef { template: index, page: 0 })
        }
    }

    /// Duplicate the master page's frames onto the destination page.
    ///
    /// With no master at all, a single synthetic frame spanning the full
    /// destination page is created instead. A division name keeps only the
    /// frames whose owning layer carries that name.
    pub fn plan_frames(
        doc: &mut dyn Inventory,
        dest: PageRef,
        master: Option<MasterPageRef>,
        division: Option<&str>,
        dest_layer: &str,
    ) -> Vec<PlannedFrame> {
        let Some(master) = master else {
            let bounds = doc.page(dest).bounds;
            let item = doc.add_page_frame(dest, bounds, dest_layer);
            return vec![PlannedFrame { item, source_layer: None }];
        };

        let template_page = &doc.templates()[master.template].pages[master.page];
        let single_sided = template_page.side == PageSide::Single;
        let candidates: Vec<(usize, Rect, String)> = template_page
            .frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| division.map_or(true, |d| frame.layer == d))
            .map(|(i, frame)| (i, frame.bounds, frame.layer.clone()))
            .collect();

        let page = doc.page(dest).clone();
        let mut planned = Vec::with_capacity(candidates.len());
        for (frame_index, bounds, source_layer) in candidates {
            let was_locked = doc.layer_locked(&source_layer);
            if was_locked {
                doc.set_layer_locked(&source_layer, false);
            }

            let source = FrameAddr {
                template: master.template,
                page: master.page,
                frame: frame_index,
            };
            let item = doc.duplicate_frame(source, dest);

            let new_bounds = if !single_sided && page.pages_in_spread < 2 {
                // Double-sided master landing on a lone page: collapse the
                // frame to the page's own horizontal origin, compensating
                // for the missing facing page.
                bounds.translated(page.bounds.top, -bounds.left)
            } else {
                bounds.translated(page.bounds.top, page.bounds.left)
            };
            doc.set_item_bounds(item, new_bounds);
            doc.set_item_layer(item, dest_layer);

            if was_locked {
                doc.set_layer_locked(&source_layer, true);
            }
            planned.push(PlannedFrame { item, source_layer: Some(source_layer) });
        }
        debug!(
            frames = planned.len(),
            page = %page.name,
            "planned destination frames"
        );
        planned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Document, Template, TemplateFrame, TemplatePage,
    };

    fn frame(top: f64, left: f64, bottom: f64, right: f64, layer: &str) -> TemplateFrame {
        TemplateFrame { bounds: Rect::new(top, left, bottom, right), layer: layer.to_string() }
    }

    fn single_sided_template(name: &str) -> Template {
        Template {
            name: name.to_string(),
            pages: vec![TemplatePage {
                side: PageSide::Single,
                frames: vec![frame(10.0, 20.0, 110.0, 220.0, "art")],
            }],
        }
    }

    fn double_sided_template(name: &str) -> Template {
        Template {
            name: name.to_string(),
            pages: vec![
                TemplatePage {
                    side: PageSide::Left,
                    frames: vec![frame(0.0, 0.0, 100.0, 200.0, "art")],
                },
                TemplatePage {
                    side: PageSide::Right,
                    frames: vec![frame(0.0, 700.0, 100.0, 900.0, "art")],
                },
            ],
        }
    }

    #[test]
    fn single_page_template_used_unconditionally() {
        let mut doc = Document::with_pages(4);
        doc.add_template(single_sided_template("@a-art"));
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(2)).unwrap();
        assert_eq!(master.page, 0);
        // Even without a destination page.
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", None).unwrap();
        assert_eq!(master.page, 0);
    }

    #[test]
    fn double_sided_template_matches_destination_side() {
        let mut doc = Document::with_facing_pages(5);
        doc.add_template(double_sided_template("@b-spread"));
        // Page 2 (index 1) is a left page.
        let left = LayoutPlanner::resolve_master(&doc, "@b-spread", Some(1)).unwrap();
        assert_eq!(left.page, 0);
        // Page 3 (index 2) is a right page.
        let right = LayoutPlanner::resolve_master(&doc, "@b-spread", Some(2)).unwrap();
        assert_eq!(right.page, 1);
    }

    #[test]
    fn side_lookup_failure_falls_back_to_first_page() {
        let mut doc = Document::with_facing_pages(3);
        doc.add_template(double_sided_template("@b-spread"));
        let master = LayoutPlanner::resolve_master(&doc, "@b-spread", None).unwrap();
        assert_eq!(master.page, 0);
    }

    #[test]
    fn unknown_template_resolves_to_none() {
        let doc = Document::with_pages(2);
        assert!(LayoutPlanner::resolve_master(&doc, "@nope", Some(0)).is_none());
    }

    #[test]
    fn single_sided_translation_is_pure_additive_offset() {
        let mut doc = Document::with_pages(3);
        doc.add_template(single_sided_template("@a-art"));
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(1));
        let planned = LayoutPlanner::plan_frames(&mut doc, 1, master, None, "run");
        assert_eq!(planned.len(), 1);
        let page = doc.page(1).bounds;
        let placed = doc.item(planned[0].item);
        assert_eq!(
            placed.bounds,
            Rect::new(10.0, 20.0, 110.0, 220.0).translated(page.top, page.left)
        );
        assert_eq!(placed.layer, "run");
        assert_eq!(planned[0].source_layer.as_deref(), Some("art"));
    }

    #[test]
    fn right_page_offset_shifts_frames_horizontally() {
        // Page 3 (index 2) of a facing document sits at left = page width.
        let mut doc = Document::with_facing_pages(4);
        doc.add_template(single_sided_template("@a-art"));
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(2));
        let planned = LayoutPlanner::plan_frames(&mut doc, 2, master, None, "run");
        let page = doc.page(2).bounds;
        assert!(page.left > 0.0);
        let placed = doc.item(planned[0].item);
        assert_eq!(
            placed.bounds,
            Rect::new(10.0, 20.0, 110.0, 220.0).translated(page.top, page.left)
        );
    }

    #[test]
    fn lone_page_collapses_frame_to_page_origin() {
        // Page 1 of a facing document sits alone in its spread.
        let mut doc = Document::with_facing_pages(3);
        doc.add_template(double_sided_template("@b-spread"));
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@b-spread", Some(0));
        // Page 1 is a right page, so the right master page (frame at
        // left=700) is chosen and collapsed back to x=0.
        let planned = LayoutPlanner::plan_frames(&mut doc, 0, master, None, "run");
        let placed = doc.item(planned[0].item);
        assert_eq!(placed.bounds.left, 0.0);
        assert_eq!(placed.bounds.right, 200.0);
        assert_eq!(placed.bounds.top, 0.0);
    }

    #[test]
    fn division_filter_keeps_only_matching_frames() {
        let mut doc = Document::with_pages(2);
        doc.add_template(Template {
            name: "@a-art".to_string(),
            pages: vec![TemplatePage {
                side: PageSide::Single,
                frames: vec![
                    frame(0.0, 0.0, 50.0, 50.0, "#photos"),
                    frame(60.0, 0.0, 110.0, 50.0, "#captions"),
                ],
            }],
        });
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(0));
        let planned = LayoutPlanner::plan_frames(&mut doc, 0, master, Some("#photos"), "run");
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].source_layer.as_deref(), Some("#photos"));
    }

    #[test]
    fn no_template_synthesizes_full_page_frame() {
        let mut doc = Document::with_pages(2);
        doc.create_layer("input");
        let planned = LayoutPlanner::plan_frames(&mut doc, 1, None, None, "input");
        assert_eq!(planned.len(), 1);
        assert!(planned[0].source_layer.is_none());
        let placed = doc.item(planned[0].item);
        assert_eq!(placed.bounds, doc.page(1).bounds);
        assert_eq!(placed.layer, "input");
    }

    #[test]
    fn locked_source_layer_is_restored() {
        let mut doc = Document::with_pages(2);
        doc.add_template(single_sided_template("@a-art"));
        doc.create_layer("art");
        doc.set_layer_locked("art", true);
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(0));
        let planned = LayoutPlanner::plan_frames(&mut doc, 0, master, None, "run");
        assert_eq!(planned.len(), 1);
        assert!(doc.layer_locked("art"));
    }

    #[test]
    fn replanning_from_the_template_is_not_cumulative() {
        let mut doc = Document::with_pages(3);
        doc.add_template(single_sided_template("@a-art"));
        doc.create_layer("run");
        let master = LayoutPlanner::resolve_master(&doc, "@a-art", Some(1));
        let first = LayoutPlanner::plan_frames(&mut doc, 1, master, None, "run");
        let second = LayoutPlanner::plan_frames(&mut doc, 1, master, None, "run");
        assert_eq!(
            doc.item(first[0].item).bounds,
            doc.item(second[0].item).bounds
        );
    }
}
