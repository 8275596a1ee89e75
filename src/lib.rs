//! sheetlib - Content library sheets for document-authoring sites
//!
//! Manages the library sheets (blocks, templates, icons, placeholders) a
//! site keeps in its content service, registers them in the site
//! configuration, and generates block documentation from live page markup.
//!
//! # Modules
//!
//! - `sheet`: Flat and multi-sheet JSON documents, row upsert/remove
//! - `library`: Library types, paths, sheet manager, site registration, setup flows
//! - `blocks`: Block markup extraction, source analysis, doc page generation
//! - `adapters`: Content service and source host clients
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # List the blocks library
//! sheetlib --org acme --repo site list blocks
//!
//! # Register the icons sheet in the site config
//! sheetlib --org acme --repo site register icons
//!
//! # Pull block variants out of a page
//! sheetlib --org acme --repo site extract --page /drafts/sample --block hero
//! ```

pub mod adapters;
pub mod blocks;
pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod sheet;

// Re-export main types at crate root for convenience
pub use adapters::{DaClient, DocumentStore, GitHubClient, SourceHost};
pub use error::{LibraryError, Result};
pub use library::{LibraryType, Registrar, SheetManager};
pub use sheet::{Row, Sheet, SheetDocument};
