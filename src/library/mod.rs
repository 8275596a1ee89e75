//! Content library sheets for a site.
//!
//! Each library type has one sheet document in the content service; the
//! site configuration's `library` sheet registers where each one lives.
//!
//! # Storage Layout
//!
//! ```text
//! config/<org>/<repo>/           # site config, `library` sheet: title -> path
//! source/<org>/<repo>/
//! └── docs/library/
//!     ├── blocks.json            # multi-sheet: data + options
//!     ├── blocks/<name>.html     # generated block documentation
//!     ├── templates.json
//!     ├── icons.json
//!     └── placeholders.json
//! ```

pub mod document;
pub mod kind;
pub mod manager;
pub mod paths;
pub mod registrar;
pub mod setup;

pub use document::{default_options_sheet, encode_library_document};
pub use kind::{LibraryType, TypeProperties};
pub use manager::{
    encoder, BatchItemResult, BatchOutcome, BatchSummary, RemoveOutcome, SheetManager,
    UpsertOutcome,
};
pub use paths::{build_public_url, build_storage_path};
pub use registrar::{RegistrationCheck, RegistrationOutcome, Registrar};
pub use setup::{BlockSource, IconItem, LibrarySetup, PlaceholderItem, SetupReport, TemplateItem};
