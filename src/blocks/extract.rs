//! Extraction of live block markup from a page.
//!
//! Blocks are `<div>` elements whose class list starts with the block name,
//! optionally followed by a variant class (`<div class="hero dark">`). Only
//! `<div>` nesting is tracked; this is a depth counter over raw text, not a
//! markup parser.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::adapters::DocumentStore;

/// Opening `<div>` tag, with or without attributes
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static OPEN_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<div(?:\s[^>]*)?>").unwrap());

/// Closing `</div>` tag
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CLOSE_DIV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</div\s*>").unwrap());

/// `class` attribute value, double or single quoted
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Variant name -> inner markup of the first block of that variant.
///
/// The unvaried block is keyed by the empty string. Blocks whose closing
/// tag cannot be found are skipped.
pub fn extract_block_content(html: &str, block: &str) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();

    for open in OPEN_DIV_RE.find_iter(html) {
        let classes = class_list(open.as_str());
        if !classes.iter().any(|c| *c == block) {
            continue;
        }

        let variant = variant_of(&classes, block);
        if found.contains_key(&variant) {
            continue;
        }

        match balanced_inner(html, open.end()) {
            Some(inner) => {
                found.insert(variant, inner.trim().to_string());
            }
            None => debug!(block, %variant, "Unbalanced block markup, skipping"),
        }
    }

    found
}

fn class_list(tag: &str) -> Vec<&str> {
    CLASS_ATTR_RE
        .captures(tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default()
}

/// First class that is neither the block name nor `<block>-*`
fn variant_of(classes: &[&str], block: &str) -> String {
    let prefix = format!("{}-", block);
    classes
        .iter()
        .find(|c| **c != block && !c.starts_with(&prefix))
        .map(|c| c.to_string())
        .unwrap_or_default()
}

/// Markup between `start` and the `</div>` that closes the element opened
/// just before it
fn balanced_inner(html: &str, start: usize) -> Option<&str> {
    let mut depth = 1usize;
    let mut pos = start;

    loop {
        let close = CLOSE_DIV_RE.find_at(html, pos)?;
        match OPEN_DIV_RE.find_at(html, pos) {
            Some(open) if open.start() < close.start() => {
                depth += 1;
                pos = open.end();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..close.start()]);
                }
                pos = close.end();
            }
        }
    }
}

/// Fetch a page and extract a block's variants from it.
///
/// Returns `None` when no page is given or it cannot be fetched; extraction
/// never fails the caller.
pub async fn fetch_block_content<S: DocumentStore + ?Sized>(
    store: &S,
    org: &str,
    repo: &str,
    page: Option<&str>,
    block: &str,
) -> Option<BTreeMap<String, String>> {
    let html = fetch_page(store, org, repo, page?).await?;
    Some(extract_block_content(&html, block))
}

/// Best-effort page fetch
pub async fn fetch_page<S: DocumentStore + ?Sized>(
    store: &S,
    org: &str,
    repo: &str,
    page: &str,
) -> Option<String> {
    match store.get_html(org, repo, page).await {
        Ok(Some(html)) => Some(html),
        Ok(None) => {
            warn!(%page, "Sample page not found");
            None
        }
        Err(e) => {
            warn!(%page, error = %e, "Failed to fetch sample page");
            None
        }
    }
}
