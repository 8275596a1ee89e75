//! Documentation page generation for library blocks.
//!
//! Each variant gets a section with a `library-metadata` block followed by
//! the block itself, filled with live markup when some was extracted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structural hints found in a block's source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureFlags {
    pub multi_item: bool,
    pub images: bool,
    pub headings: bool,
    pub buttons: bool,
}

/// Inputs for one block documentation page
#[derive(Debug, Clone)]
pub struct BlockDoc<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub variants: &'a [String],
    pub flags: StructureFlags,
    /// Extracted markup by variant (`""` for the unvaried block)
    pub content: Option<&'a BTreeMap<String, String>>,
}

/// `hero-banner` -> `Hero Banner`
pub fn display_name(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_with_and(parts: &[&str]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Sentence describing a block from its structure and variants
pub fn describe_block(name: &str, flags: StructureFlags, variants: &[String]) -> String {
    let mut features = Vec::new();
    if flags.multi_item {
        features.push("a multi-item layout");
    }
    if flags.images {
        features.push("images");
    }
    if flags.headings {
        features.push("headings");
    }
    if flags.buttons {
        features.push("call-to-action buttons");
    }

    let mut description = format!("{} block", display_name(name));
    if !features.is_empty() {
        description.push_str(" with ");
        description.push_str(&join_with_and(&features));
    }
    if !variants.is_empty() {
        description.push_str(&format!(". Variants: {}", variants.join(", ")));
    }
    description
}

fn metadata_block(title: &str, description: &str) -> String {
    format!(
        "<div class=\"library-metadata\"><div><div>name</div><div>{}</div></div><div><div>description</div><div>{}</div></div></div>",
        html_escape::encode_text(title),
        html_escape::encode_text(description)
    )
}

fn section(doc: &BlockDoc<'_>, variant: &str, description: &str) -> String {
    let display = display_name(doc.name);
    let (title, class) = if variant.is_empty() {
        (display, doc.name.to_string())
    } else {
        (
            format!("{} ({})", display, display_name(variant)),
            format!("{} {}", doc.name, variant),
        )
    };

    let live = doc
        .content
        .and_then(|c| c.get(variant).or_else(|| c.get("")))
        .map(String::as_str)
        .unwrap_or("<div><div></div></div>");

    format!(
        "<div><h2>{}</h2>{}<div class=\"{}\">{}</div></div>",
        html_escape::encode_text(&title),
        metadata_block(&title, description),
        html_escape::encode_double_quoted_attribute(&class),
        live
    )
}

/// Render the documentation page for a block
pub fn generate_block_doc(doc: &BlockDoc<'_>) -> String {
    let description = doc
        .description
        .map(str::to_string)
        .unwrap_or_else(|| describe_block(doc.name, doc.flags, doc.variants));

    let sections: Vec<String> = if doc.variants.is_empty() {
        vec![section(doc, "", &description)]
    } else {
        doc.variants
            .iter()
            .map(|v| section(doc, v, &description))
            .collect()
    };

    format!(
        "<body><header></header><main>{}</main><footer></footer></body>",
        sections.join("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("hero"), "Hero");
        assert_eq!(display_name("hero-banner"), "Hero Banner");
        assert_eq!(display_name("two_up"), "Two Up");
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(
            describe_block("hero", StructureFlags::default(), &[]),
            "Hero block"
        );
    }

    #[test]
    fn test_description_clause_order() {
        let flags = StructureFlags {
            multi_item: true,
            images: true,
            headings: false,
            buttons: true,
        };
        let variants = vec!["dark".to_string(), "light".to_string()];
        assert_eq!(
            describe_block("cards", flags, &variants),
            "Cards block with a multi-item layout, images and call-to-action buttons. Variants: dark, light"
        );
    }

    #[test]
    fn test_section_per_variant_with_fallbacks() {
        let variants = vec!["dark".to_string(), "light".to_string()];
        let content: BTreeMap<String, String> = [
            ("dark".to_string(), "<div><div>D</div></div>".to_string()),
            ("".to_string(), "<div><div>plain</div></div>".to_string()),
        ]
        .into_iter()
        .collect();

        let html = generate_block_doc(&BlockDoc {
            name: "hero",
            description: Some("Big & bold"),
            variants: &variants,
            flags: StructureFlags::default(),
            content: Some(&content),
        });

        assert!(html.contains("<div class=\"hero dark\"><div><div>D</div></div></div>"));
        // light falls back to the unvaried markup
        assert!(html.contains("<div class=\"hero light\"><div><div>plain</div></div></div>"));
        assert!(html.contains("<div>Hero (Dark)</div>"));
        assert!(html.contains("Big &amp; bold"));
        assert_eq!(html.matches("library-metadata").count(), 2);
    }

    #[test]
    fn test_empty_placeholder_without_content() {
        let html = generate_block_doc(&BlockDoc {
            name: "hero",
            description: None,
            variants: &[],
            flags: StructureFlags::default(),
            content: None,
        });

        assert!(html.starts_with("<body><header></header><main>"));
        assert!(html.contains("<div class=\"hero\"><div><div></div></div></div>"));
        assert!(html.contains("<div>Hero block</div>"));
    }

    #[test]
    fn test_deterministic() {
        let doc = BlockDoc {
            name: "cards",
            description: None,
            variants: &[],
            flags: StructureFlags {
                images: true,
                ..Default::default()
            },
            content: None,
        };
        assert_eq!(generate_block_doc(&doc), generate_block_doc(&doc));
    }
}
