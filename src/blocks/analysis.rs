//! Discovery and static analysis of block sources in a code repository.
//!
//! Blocks live at `blocks/<name>/` with `<name>.js`, `<name>.css` and an
//! optional `README.md`. All three are fetched concurrently and every one is
//! best-effort: a missing or unreadable file only removes hints.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::template::StructureFlags;
use crate::adapters::{EntryKind, SourceHost};
use crate::error::Result;

const BLOCKS_DIR: &str = "blocks";

/// Heading selectors or element names (`h1` .. `h6`)
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bh[1-6]\b").unwrap());

const MULTI_ITEM_HINTS: &[&str] = &[
    "block.children",
    ":scope > div",
    "querySelectorAll",
    "grid-template-columns",
];
const IMAGE_HINTS: &[&str] = &["picture", "img", "createOptimizedPicture"];
const BUTTON_HINTS: &[&str] = &["button", "decorateButtons"];

/// What a block's sources say about it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockAnalysis {
    pub name: String,
    pub variants: Vec<String>,
    pub flags: StructureFlags,
    /// First paragraph of the README, if any
    pub description: Option<String>,
    pub has_js: bool,
    pub has_css: bool,
}

/// Structural hints from script and stylesheet text
pub fn detect_flags(js: &str, css: &str) -> StructureFlags {
    let any = |hints: &[&str]| hints.iter().any(|h| js.contains(h) || css.contains(h));

    StructureFlags {
        multi_item: any(MULTI_ITEM_HINTS),
        images: any(IMAGE_HINTS),
        headings: HEADING_RE.is_match(js) || HEADING_RE.is_match(css),
        buttons: any(BUTTON_HINTS),
    }
}

/// Variant classes used in `.<block>.<variant>` selectors, in first-seen order
pub fn detect_variants(css: &str, block: &str) -> Vec<String> {
    let pattern = format!(r"\.{}\.([a-z][a-z0-9-]*)", regex::escape(block));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    re.captures_iter(css)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|v| v != "block" && seen.insert(v.clone()))
        .collect()
}

/// First prose paragraph of a README (headings, badges and code skipped)
pub fn readme_description(readme: &str) -> Option<String> {
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_code = false;

    for line in readme.lines() {
        let line = line.trim();
        if line.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if line.is_empty() || line.starts_with('#') || line.starts_with("![") {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        paragraph.push(line);
    }

    (!paragraph.is_empty()).then(|| paragraph.join(" "))
}

/// Names of the block directories in a repository, sorted
pub async fn discover_blocks<H: SourceHost + ?Sized>(
    host: &H,
    owner: &str,
    repo: &str,
    git_ref: &str,
) -> Result<Option<Vec<String>>> {
    let Some(entries) = host.list_directory(owner, repo, BLOCKS_DIR, git_ref).await? else {
        return Ok(None);
    };

    let mut names: Vec<String> = entries
        .into_iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .map(|e| e.name)
        .collect();
    names.sort();

    debug!(count = names.len(), "Discovered blocks");
    Ok(Some(names))
}

async fn fetch_optional<H: SourceHost + ?Sized>(
    host: &H,
    owner: &str,
    repo: &str,
    path: &str,
    git_ref: &str,
) -> Option<String> {
    match host.get_file(owner, repo, path, git_ref).await {
        Ok(content) => content,
        Err(e) => {
            warn!(%path, error = %e, "Failed to fetch block source");
            None
        }
    }
}

/// Fetch a block's script, stylesheet and README together and analyse them
pub async fn analyze_block<H: SourceHost + ?Sized>(
    host: &H,
    owner: &str,
    repo: &str,
    git_ref: &str,
    name: &str,
) -> BlockAnalysis {
    let js_path = format!("{}/{}/{}.js", BLOCKS_DIR, name, name);
    let css_path = format!("{}/{}/{}.css", BLOCKS_DIR, name, name);
    let readme_path = format!("{}/{}/README.md", BLOCKS_DIR, name);

    let (js, css, readme) = tokio::join!(
        fetch_optional(host, owner, repo, &js_path, git_ref),
        fetch_optional(host, owner, repo, &css_path, git_ref),
        fetch_optional(host, owner, repo, &readme_path, git_ref),
    );

    let js_text = js.as_deref().unwrap_or_default();
    let css_text = css.as_deref().unwrap_or_default();

    BlockAnalysis {
        name: name.to_string(),
        variants: detect_variants(css_text, name),
        flags: detect_flags(js_text, css_text),
        description: readme.as_deref().and_then(readme_description),
        has_js: js.is_some(),
        has_css: css.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_flags() {
        let js = "export default function decorate(block) { [...block.children].forEach((row) => {}); }";
        let css = ".cards picture img { width: 100%; } .cards h3 { margin: 0; }";
        let flags = detect_flags(js, css);

        assert!(flags.multi_item);
        assert!(flags.images);
        assert!(flags.headings);
        assert!(!flags.buttons);
    }

    #[test]
    fn test_heading_hint_needs_word_boundary() {
        // "width" and "h10" are not headings
        let flags = detect_flags("", ".x { width: 1px } .h10 {}");
        assert!(!flags.headings);
    }

    #[test]
    fn test_detect_variants() {
        let css = r#"
.hero.dark { color: white; }
.hero.light h1 { color: black; }
.hero.dark > div { padding: 0; }
.hero-wrapper.wide { }
.hero.block { }
"#;
        assert_eq!(detect_variants(css, "hero"), vec!["dark", "light"]);
    }

    #[test]
    fn test_readme_description() {
        let readme = "# Hero\n\n![badge](x.svg)\n\nA large banner\nat the top of a page.\n\n## Usage\nMore text";
        assert_eq!(
            readme_description(readme).as_deref(),
            Some("A large banner at the top of a page.")
        );
        assert_eq!(readme_description("# Only a title\n"), None);
    }
}
