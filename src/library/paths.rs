//! Storage paths and public URLs for library sheets and pages.
//!
//! Pure string composition; nothing here touches the network.

use super::kind::LibraryType;
use crate::error::Result;

/// Public content domain serving published documents
pub const CONTENT_DOMAIN: &str = "https://content.da.live";

/// Default folder holding the library sheets
pub const DEFAULT_BASE_FOLDER: &str = "docs/library";

/// `/<base>/<type>` or `/<base>/<type>/<item>`
///
/// Fails with `UnknownLibraryType` before anything else is looked at.
pub fn build_storage_path(kind: &str, base_folder: &str, item: Option<&str>) -> Result<String> {
    let kind: LibraryType = kind.parse()?;
    Ok(storage_path(kind, base_folder, item))
}

/// Typed form of [`build_storage_path`]
pub fn storage_path(kind: LibraryType, base_folder: &str, item: Option<&str>) -> String {
    let base = base_folder.trim_matches('/');
    let mut path = if base.is_empty() {
        format!("/{}", kind)
    } else {
        format!("/{}/{}", base, kind)
    };

    if let Some(item) = item {
        path.push('/');
        path.push_str(item.trim_matches('/'));
    }

    path
}

/// Public URL of a stored document
pub fn build_public_url(org: &str, repo: &str, path: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        CONTENT_DOMAIN,
        org,
        repo,
        path.trim_start_matches('/')
    )
}

/// Public URL of a library sheet (`.json` resource)
pub fn sheet_url(org: &str, repo: &str, sheet_path: &str) -> String {
    build_public_url(org, repo, &format!("{}.json", sheet_path))
}
