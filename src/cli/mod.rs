//! Command-line interface for sheetlib.
//!
//! Provides commands for reading and editing library sheets, registering
//! them in the site configuration, extracting block markup and running the
//! setup flows. Results are printed as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::adapters::{DaClient, DocumentStore, GitHubClient};
use crate::blocks::{fetch_block_content, generate_block_doc, BlockDoc, StructureFlags};
use crate::config::{self, ResolvedConfig};
use crate::library::paths::{sheet_url, storage_path};
use crate::library::{
    BlockSource, IconItem, LibrarySetup, LibraryType, PlaceholderItem, Registrar, SheetManager,
    TemplateItem,
};
use crate::sheet::Row;

/// sheetlib - Content library sheets for document-authoring sites
#[derive(Parser, Debug)]
#[command(name = "sheetlib")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Organization in the content service
    #[arg(long, global = true, env = "SHEETLIB_ORG")]
    pub org: Option<String>,

    /// Site repository in the content service
    #[arg(long, global = true, env = "SHEETLIB_REPO")]
    pub repo: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the entries of a library sheet
    List {
        #[arg(value_enum)]
        library: LibraryArg,
    },

    /// Add or replace one entry (fields as column=value)
    Upsert {
        #[arg(value_enum)]
        library: LibraryArg,

        /// Columns of the entry, e.g. name=hero path=/docs/library/blocks/hero
        #[arg(required = true, value_parser = parse_pair)]
        fields: Vec<(String, String)>,
    },

    /// Remove an entry by key
    Remove {
        #[arg(value_enum)]
        library: LibraryArg,

        /// Key value of the entry
        key: String,
    },

    /// Register a library sheet in the site config
    Register {
        #[arg(value_enum)]
        library: LibraryArg,

        /// Sheet URL (defaults to the public URL of the library sheet)
        #[arg(long)]
        path: Option<String>,
    },

    /// Check whether a library sheet is registered
    Check {
        #[arg(value_enum)]
        library: LibraryArg,
    },

    /// Extract a block's variants from a page
    Extract {
        /// Page path in the content service
        #[arg(long)]
        page: String,

        /// Block name
        #[arg(long)]
        block: String,
    },

    /// Print a block documentation page without storing it
    Preview {
        /// Block name
        #[arg(long)]
        block: String,

        /// Variant names (comma-separated)
        #[arg(long, value_delimiter = ',')]
        variants: Vec<String>,

        /// Description (derived when omitted)
        #[arg(long)]
        description: Option<String>,

        /// Page to take live markup from
        #[arg(long)]
        page: Option<String>,
    },

    /// Document every block of a code repository
    SetupBlocks {
        /// Source repository owner
        #[arg(long)]
        owner: String,

        /// Source repository name (defaults to --repo)
        #[arg(long)]
        source_repo: Option<String>,

        /// Branch or tag (defaults to the configured ref)
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Page to take live block markup from
        #[arg(long)]
        sample_page: Option<String>,
    },

    /// List page templates (name=path)
    SetupTemplates {
        #[arg(required = true, value_parser = parse_pair)]
        items: Vec<(String, String)>,
    },

    /// List icons (key or key=url)
    SetupIcons {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// List placeholder strings (Key=Text)
    SetupPlaceholders {
        #[arg(required = true, value_parser = parse_pair)]
        items: Vec<(String, String)>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Library type for CLI (maps to LibraryType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LibraryArg {
    Blocks,
    Templates,
    Icons,
    Placeholders,
}

impl From<LibraryArg> for LibraryType {
    fn from(arg: LibraryArg) -> Self {
        match arg {
            LibraryArg::Blocks => LibraryType::Blocks,
            LibraryArg::Templates => LibraryType::Templates,
            LibraryArg::Icons => LibraryType::Icons,
            LibraryArg::Placeholders => LibraryType::Placeholders,
        }
    }
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::load_config()?;

        if let Commands::Config = self.command {
            return show_config(&config);
        }

        let org = self.org.context("--org is required (or set SHEETLIB_ORG)")?;
        let repo = self.repo.context("--repo is required (or set SHEETLIB_REPO)")?;
        let manager = SheetManager::new(DaClient::from_config(&config));
        let base = config.base_folder.as_str();

        match self.command {
            Commands::List { library } => {
                let items = manager.list_library(&org, &repo, library.into(), base).await?;
                print_json(&items)
            }
            Commands::Upsert { library, fields } => {
                let entry: Row = fields.into_iter().map(|(k, v)| (k, v.into())).collect();
                let outcome = manager
                    .add_entry(&org, &repo, library.into(), base, entry)
                    .await?;
                print_json(&outcome)
            }
            Commands::Remove { library, key } => {
                let outcome = manager
                    .remove_entry(&org, &repo, library.into(), base, &key)
                    .await?;
                print_json(&outcome)
            }
            Commands::Register { library, path } => {
                let kind = LibraryType::from(library);
                let path = path.unwrap_or_else(|| {
                    sheet_url(&org, &repo, &storage_path(kind, base, None))
                });
                let outcome = Registrar::new(manager.store())
                    .register(&org, &repo, kind.as_str(), &path)
                    .await;
                print_json(&outcome)
            }
            Commands::Check { library } => {
                let kind = LibraryType::from(library);
                let check = Registrar::new(manager.store())
                    .check(&org, &repo, kind.as_str())
                    .await;
                print_json(&check)
            }
            Commands::Extract { page, block } => {
                let found = fetch_block_content(
                    manager.store(),
                    &org,
                    &repo,
                    Some(page.as_str()),
                    &block,
                )
                .await;
                print_json(&found)
            }
            Commands::Preview {
                block,
                variants,
                description,
                page,
            } => {
                preview(manager.store(), &org, &repo, &block, &variants, description, page).await
            }
            Commands::SetupBlocks {
                owner,
                source_repo,
                git_ref,
                sample_page,
            } => {
                let host = GitHubClient::from_config(&config);
                let source = BlockSource {
                    owner,
                    repo: source_repo.unwrap_or_else(|| repo.clone()),
                    git_ref: git_ref.unwrap_or_else(|| config.git_ref.clone()),
                };
                let report = LibrarySetup::new(&manager, &org, &repo, base)
                    .blocks(&host, &source, sample_page.as_deref())
                    .await;
                print_json(&report)
            }
            Commands::SetupTemplates { items } => {
                let items: Vec<TemplateItem> = items
                    .into_iter()
                    .map(|(name, path)| TemplateItem { name, path })
                    .collect();
                let report = LibrarySetup::new(&manager, &org, &repo, base)
                    .templates(&items)
                    .await;
                print_json(&report)
            }
            Commands::SetupIcons { items } => {
                let items: Vec<IconItem> = items
                    .into_iter()
                    .map(|item| match item.split_once('=') {
                        Some((key, icon)) => IconItem {
                            key: key.to_string(),
                            icon: Some(icon.to_string()),
                        },
                        None => IconItem {
                            key: item,
                            icon: None,
                        },
                    })
                    .collect();
                let report = LibrarySetup::new(&manager, &org, &repo, base)
                    .icons(&items)
                    .await;
                print_json(&report)
            }
            Commands::SetupPlaceholders { items } => {
                let items: Vec<PlaceholderItem> = items
                    .into_iter()
                    .map(|(key, text)| PlaceholderItem { key, text })
                    .collect();
                let report = LibrarySetup::new(&manager, &org, &repo, base)
                    .placeholders(&items)
                    .await;
                print_json(&report)
            }
            Commands::Config => show_config(&config),
        }
    }
}

/// Render a block page from optional live markup and print it
async fn preview<S: DocumentStore>(
    store: &S,
    org: &str,
    repo: &str,
    block: &str,
    variants: &[String],
    description: Option<String>,
    page: Option<String>,
) -> Result<()> {
    let content = fetch_block_content(store, org, repo, page.as_deref(), block).await;

    let html = generate_block_doc(&BlockDoc {
        name: block,
        description: description.as_deref(),
        variants,
        flags: StructureFlags::default(),
        content: content.as_ref(),
    });
    println!("{}", html);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("sheetlib configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Content service:  {}", cfg.admin_url);
    println!("Source host API:  {}", cfg.github_api_url);
    println!("Source ref:       {}", cfg.git_ref);
    println!("Library folder:   {}", cfg.base_folder);
    println!();
    println!("Credentials:");
    println!("  DA_TOKEN:     {}", if cfg.da_token.is_some() { "set" } else { "not set" });
    println!("  GITHUB_TOKEN: {}", if cfg.github_token.is_some() { "set" } else { "not set" });
    println!();
    println!("Library sheets:");
    for kind in LibraryType::ALL {
        println!("  {:<13} {}", kind.as_str(), storage_path(kind, &cfg.base_folder, None));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("name = hero").unwrap(),
            ("name".to_string(), "hero".to_string())
        );
        assert_eq!(
            parse_pair("Text=a=b").unwrap(),
            ("Text".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("novalue").is_err());
    }

    #[test]
    fn test_cli_parses_setup_icons() {
        let cli = Cli::try_parse_from([
            "sheetlib", "--org", "acme", "--repo", "site", "setup-icons", "home", "star=/s.svg",
        ])
        .unwrap();

        match cli.command {
            Commands::SetupIcons { items } => assert_eq!(items, vec!["home", "star=/s.svg"]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.org.as_deref(), Some("acme"));
    }

    #[test]
    fn test_library_arg_maps_to_type() {
        assert_eq!(LibraryType::from(LibraryArg::Placeholders), LibraryType::Placeholders);
    }
}
