//! Host-document model.
//!
//! The engine only talks to the host through the `Inventory` capability
//! trait; `Document` is the in-memory implementation used by the CLI and the
//! test suite. A real host adapter would implement the same trait over its
//! own page/layer/template storage.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::CropOption;
use crate::errors::EngineError;
use crate::geometry::Rect;
use crate::resolve::SourceFile;

/// Index of a destination page within the document.
pub type PageRef = usize;
/// Index of a placed page item within the document.
pub type ItemRef = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    Left,
    Right,
    Single,
}

impl PageSide {
    pub fn label(&self) -> &'static str {
        match self {
            PageSide::Left => "left",
            PageSide::Right => "right",
            PageSide::Single => "single-sided",
        }
    }
}

/// A destination page. Bounds are in spread coordinates, so the right page
/// of a facing pair starts at `left = page width`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub side: PageSide,
    pub bounds: Rect,
    /// Physical pages in this page's spread. A lone page reports 1.
    pub pages_in_spread: usize,
}

/// A reusable named layout (master). Spans one or two physical pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub pages: Vec<TemplatePage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePage {
    pub side: PageSide,
    #[serde(default)]
    pub frames: Vec<TemplateFrame>,
}

/// A placeable frame owned by a template page. The owning layer is referenced
/// by name; its lock flag lives on the document layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFrame {
    pub bounds: Rect,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub locked: bool,
}

/// A frame placed on a destination page: either a duplicate of a template
/// frame or a synthetic full-page placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageItem {
    pub page: PageRef,
    pub bounds: Rect,
    pub layer: String,
    #[serde(default)]
    pub content: Option<PathBuf>,
}

/// Addresses one frame on one physical page of one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAddr {
    pub template: usize,
    pub page: usize,
    pub frame: usize,
}

/// Capability set the engine requires from the host document.
pub trait Inventory {
    fn page_count(&self) -> usize;
    /// Apply a page count. Existing placed items are untouched.
    fn set_page_count(&mut self, count: usize);
    fn find_page_by_key(&self, key: &str) -> Option<PageRef>;
    fn page(&self, page: PageRef) -> &Page;

    fn templates(&self) -> &[Template];
    fn find_template(&self, name: &str) -> Option<&Template> {
        self.templates().iter().find(|t| t.name == name)
    }
    /// Create an empty single-sided template stub. No-op when the name is
    /// already taken.
    fn create_template(&mut self, name: &str);

    fn find_layer(&self, name: &str) -> Option<&Layer>;
    /// Idempotent: creating an existing layer is a no-op.
    fn create_layer(&mut self, name: &str);
    /// Destructive: removing a layer deletes the placed items it contains
    /// and invalidates previously returned `ItemRef`s. Only called during
    /// pre-validation cleanup, never while placement holds frame handles.
    fn remove_layer(&mut self, name: &str);
    fn layer_locked(&self, name: &str) -> bool;
    fn set_layer_locked(&mut self, name: &str, locked: bool);

    fn duplicate_frame(&mut self, source: FrameAddr, dest: PageRef) -> ItemRef;
    fn add_page_frame(&mut self, dest: PageRef, bounds: Rect, layer: &str) -> ItemRef;
    fn set_item_bounds(&mut self, item: ItemRef, bounds: Rect);
    fn set_item_layer(&mut self, item: ItemRef, layer: &str);
    fn assign_content(&mut self, item: ItemRef, path: &Path);
    fn item(&self, item: ItemRef) -> &PageItem;
    fn items(&self) -> &[PageItem];
}

#[derive(Debug, Error)]
#[error("content import failed: {message}")]
pub struct ImportError {
    pub message: String,
}

impl ImportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// External collaborator that loads a file's content into a placed frame.
///
/// Implementations are expected to treat a failure for one crop option as
/// transient; the driver retries with the next option in the configured
/// order.
pub trait ContentImporter {
    fn import(
        &mut self,
        doc: &mut dyn Inventory,
        item: ItemRef,
        file: &SourceFile,
        crop: CropOption,
        transparent_background: bool,
    ) -> Result<(), ImportError>;
}

/// Stand-in collaborator: records the frame/file association on the
/// document without rendering anything.
#[derive(Debug, Default)]
pub struct RecordingImporter;

impl ContentImporter for RecordingImporter {
    fn import(
        &mut self,
        doc: &mut dyn Inventory,
        item: ItemRef,
        file: &SourceFile,
        _crop: CropOption,
        _transparent_background: bool,
    ) -> Result<(), ImportError> {
        doc.assign_content(item, &file.path);
        Ok(())
    }
}

/// Serializable shape of a document, loaded from JSON by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    #[serde(default = "default_page_count")]
    pub page_count: usize,
    #[serde(default)]
    pub facing_pages: bool,
    #[serde(default = "default_page_width")]
    pub page_width: f64,
    #[serde(default = "default_page_height")]
    pub page_height: f64,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

fn default_page_count() -> usize {
    1
}

fn default_page_width() -> f64 {
    595.0
}

fn default_page_height() -> f64 {
    842.0
}

/// In-memory host document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    facing_pages: bool,
    page_width: f64,
    page_height: f64,
    pages: Vec<Page>,
    templates: Vec<Template>,
    layers: Vec<Layer>,
    items: Vec<PageItem>,
}

impl Document {
    pub fn new(spec: DocumentSpec) -> Self {
        let mut doc = Self {
            facing_pages: spec.facing_pages,
            page_width: spec.page_width,
            page_height: spec.page_height,
            pages: Vec::new(),
            templates: spec.templates,
            layers: spec.layers,
            items: Vec::new(),
        };
        doc.rebuild_pages(spec.page_count.max(1));
        doc
    }

    /// Single-sided document with `count` pages, default page size.
    pub fn with_pages(count: usize) -> Self {
        Self::new(DocumentSpec {
            page_count: count,
            facing_pages: false,
            page_width: default_page_width(),
            page_height: default_page_height(),
            templates: Vec::new(),
            layers: Vec::new(),
        })
    }

    /// Facing-pages document: first page is a lone right page, then
    /// left/right pairs.
    pub fn with_facing_pages(count: usize) -> Self {
        Self::new(DocumentSpec {
            page_count: count,
            facing_pages: true,
            page_width: default_page_width(),
            page_height: default_page_height(),
            templates: Vec::new(),
            layers: Vec::new(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)?;
        let spec: DocumentSpec = serde_json::from_str(&content)?;
        Ok(Self::new(spec))
    }

    pub fn add_template(&mut self, template: Template) {
        self.templates.push(template);
    }

    fn rebuild_pages(&mut self, count: usize) {
        let (w, h) = (self.page_width, self.page_height);
        let single = Rect::new(0.0, 0.0, h, w);
        let mut pages = Vec::with_capacity(count);
        for number in 1..=count {
            let page = if !self.facing_pages {
                Page {
                    name: number.to_string(),
                    side: PageSide::Single,
                    bounds: single,
                    pages_in_spread: 1,
                }
            } else if number == 1 {
                // The first page sits alone on the right of its spread.
                Page {
                    name: number.to_string(),
                    side: PageSide::Right,
                    bounds: single,
                    pages_in_spread: 1,
                }
            } else if number % 2 == 0 {
                let lone = number == count;
                Page {
                    name: number.to_string(),
                    side: PageSide::Left,
                    bounds: single,
                    pages_in_spread: if lone { 1 } else { 2 },
                }
            } else {
                Page {
                    name: number.to_string(),
                    side: PageSide::Right,
                    bounds: single.shifted_x(w),
                    pages_in_spread: 2,
                }
            };
            pages.push(page);
        }
        self.pages = pages;
    }
}

impl Inventory for Document {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn set_page_count(&mut self, count: usize) {
        if count != self.pages.len() {
            self.rebuild_pages(count.max(1));
        }
    }

    fn find_page_by_key(&self, key: &str) -> Option<PageRef> {
        self.pages.iter().position(|p| p.name == key)
    }

    fn page(&self, page: PageRef) -> &Page {
        &self.pages[page]
    }

    fn templates(&self) -> &[Template] {
        &self.templates
    }

    fn create_template(&mut self, name: &str) {
        if self.find_template(name).is_some() {
            return;
        }
        self.templates.push(Template {
            name: name.to_string(),
            pages: vec![TemplatePage { side: PageSide::Single, frames: Vec::new() }],
        });
    }

    fn find_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn create_layer(&mut self, name: &str) {
        if self.find_layer(name).is_none() {
            self.layers.push(Layer { name: name.to_string(), locked: false });
        }
    }

    fn remove_layer(&mut self, name: &str) {
        if self.find_layer(name).is_none() {
            return;
        }
        self.layers.retain(|l| l.name != name);
        self.items.retain(|i| i.layer != name);
    }

    fn layer_locked(&self, name: &str) -> bool {
        self.find_layer(name).map(|l| l.locked).unwrap_or(false)
    }

    fn set_layer_locked(&mut self, name: &str, locked: bool) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.name == name) {
            layer.locked = locked;
        }
    }

    fn duplicate_frame(&mut self, source: FrameAddr, dest: PageRef) -> ItemRef {
        let frame = &self.templates[source.template].pages[source.page].frames[source.frame];
        self.items.push(PageItem {
            page: dest,
            bounds: frame.bounds,
            layer: frame.layer.clone(),
            content: None,
        });
        self.items.len() - 1
    }

    fn add_page_frame(&mut self, dest: PageRef, bounds: Rect, layer: &str) -> ItemRef {
        self.items.push(PageItem {
            page: dest,
            bounds,
            layer: layer.to_string(),
            content: None,
        });
        self.items.len() - 1
    }

    fn set_item_bounds(&mut self, item: ItemRef, bounds: Rect) {
        self.items[item].bounds = bounds;
    }

    fn set_item_layer(&mut self, item: ItemRef, layer: &str) {
        self.items[item].layer = layer.to_string();
    }

    fn assign_content(&mut self, item: ItemRef, path: &Path) {
        self.items[item].content = Some(path.to_path_buf());
    }

    fn item(&self, item: ItemRef) -> &PageItem {
        &self.items[item]
    }

    fn items(&self) -> &[PageItem] {
        &self.items
    }
}
