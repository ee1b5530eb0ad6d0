//! # dxfdoc
//!
//! A tag level DXF document engine: read, create, repair, edit, merge and
//! write DXF drawings from R12 to R2018.
//!
//! Every DXF object is kept as its ordered list of group-code/value tags
//! in a handle-keyed [`EntityDb`](database::EntityDb). Typed views from
//! the revision-aware [`EntityFactory`](factory::EntityFactory) give named
//! access to the tags the engine understands, while everything else is
//! carried through untouched.
//!
//! ## Features
//!
//! - Text DXF for R12 (legacy schema) and R13 to R2018 (extended schema)
//! - Handle synthesis and layout linking for files that lack them
//! - Idempotent repair passes run on every load
//! - Layouts, block definitions and groups
//! - Merging model space of one drawing into another
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dxfdoc::{Document, DxfVersion, Vector3};
//! use dxfdoc::factory::GraphicAttribs;
//! use dxfdoc::layouts::EntitySpaceMut;
//!
//! let mut doc = Document::new(DxfVersion::AC1015)?;
//! doc.new_layer("Walls")?;
//! doc.modelspace_mut().add_line(
//!     Vector3::ZERO,
//!     Vector3::new(10.0, 0.0, 0.0),
//!     &GraphicAttribs::on_layer("Walls"),
//! )?;
//! doc.saveas("walls.dxf", None)?;
//! # Ok::<(), dxfdoc::DxfError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`io`] - tag stream reading and writing, code pages
//! - [`database`] - tag groups and the handle-keyed database
//! - [`sections`] - HEADER, CLASSES, TABLES, BLOCKS, ENTITIES, OBJECTS
//! - [`factory`] - revision-aware builders and typed views
//! - [`repair`] - normalization passes run after parsing
//! - [`layouts`] - layouts, blocks and entity spaces
//! - [`document`] - the facade tying it together

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod audit;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod factory;
pub mod groups;
pub mod importer;
pub mod io;
pub mod layouts;
pub mod naming;
pub mod notification;
pub mod repair;
pub mod sections;
pub mod templates;
pub mod types;

// Re-export commonly used types
pub use audit::{AuditFinding, AuditKind, AuditReport};
pub use config::DocumentOptions;
pub use document::Document;
pub use error::{DxfError, Result};
pub use factory::{Entity, EntityFactory, GraphicAttribs, GraphicEntity, GraphicEntityMut, Schema, TagView};
pub use importer::{merge, Importer, MergeMode, MergeSummary};
pub use layouts::{EntitySpace, EntitySpaceMut};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use types::{DxfVersion, Handle, Vector2, Vector3};
