//! Live, format-preserving editing of module metadata.
//!
//! The model keeps the source text authoritative: parsing registers a
//! position for every construct, setters translate to minimal text edits,
//! and every edit relocates the registered positions. Saving is just
//! writing [`MetadataModel::text`] back out.
//!
//! ```text
//!   text ──parse──▶ entries ──setters──▶ planned edits ──▶ text
//!                      ▲                                     │
//!                      └────────── relocated spans ──────────┘
//! ```

pub mod document;
pub mod entries;
pub mod errors;
pub mod model;
pub mod planner;
pub mod resolver;

pub use document::{PositionId, Span, TextDocument};
pub use entries::{DependencyInfo, OsSupportInfo};
pub use errors::{EditorError, EditorResult};
pub use model::{unresolved_message, MetadataModel, ModelState};
pub use resolver::{AcceptAll, DependencyResolver};

pub use modfile_parser::SourceSyntax;
