//! Pagesmith Core - Batch Page Assembly Engine
//!
//! Matches a folder tree of image files to document pages by their numeric
//! filename prefixes, resolves templates and divisions from file and folder
//! names, and places duplicated template frames onto the target pages.
//! Strictly validate-then-apply: no placement mutation happens until the
//! whole input set validates clean (or the run explicitly opts in to skip
//! files with missing page numbers).

pub mod config;
pub mod document;
pub mod errors;
pub mod geometry;
pub mod layout;
pub mod place;
pub mod resolve;
pub mod scan;
pub mod session;
pub mod validate;

pub use config::{CropOption, Patterns, Settings};
pub use document::{ContentImporter, Document, DocumentSpec, Inventory, RecordingImporter};
pub use errors::{EngineError, ErrorKind, ErrorReport};
pub use geometry::Rect;
pub use layout::LayoutPlanner;
pub use place::{run_pipeline, PipelineOptions, PlacementDriver, PlacementReport, RunOutcome};
pub use resolve::{NameResolver, ResolvedName, SourceFile};
pub use session::Session;
pub use validate::Validator;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
