//! Configuration for sheetlib.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DA_TOKEN, GITHUB_TOKEN, SHEETLIB_ADMIN_URL,
//!    SHEETLIB_GITHUB_API_URL, SHEETLIB_BASE_FOLDER)
//! 2. Config file (.sheetlib/config.yaml, then ~/.sheetlib/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .sheetlib/config.yaml
//! - Falls back to the user's home directory
//!
//! Credentials are only read from the environment. The resolved value is
//! passed to client constructors; nothing is cached globally.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::library::paths::DEFAULT_BASE_FOLDER;

pub const DEFAULT_ADMIN_URL: &str = "https://admin.da.live";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GIT_REF: &str = "main";

const CONFIG_DIR: &str = ".sheetlib";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Admin API base URL
    pub admin_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    pub api_url: Option<String>,
    /// Branch or tag to read block sources from
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryConfig {
    /// Folder holding the library sheets
    pub base_folder: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub admin_url: String,
    pub github_api_url: String,
    pub git_ref: String,
    pub base_folder: String,
    pub da_token: Option<String>,
    pub github_token: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            admin_url: DEFAULT_ADMIN_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            git_ref: DEFAULT_GIT_REF.to_string(),
            base_folder: DEFAULT_BASE_FOLDER.to_string(),
            da_token: None,
            github_token: None,
            config_file: None,
        }
    }
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    home.exists().then_some(home)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge file settings and environment over the defaults
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let mut config = ResolvedConfig::default();

    if let Some((path, file)) = file {
        if let Some(url) = file.service.admin_url {
            config.admin_url = url;
        }
        if let Some(url) = file.github.api_url {
            config.github_api_url = url;
        }
        if let Some(git_ref) = file.github.git_ref {
            config.git_ref = git_ref;
        }
        if let Some(folder) = file.library.base_folder {
            config.base_folder = folder;
        }
        config.config_file = Some(path);
    }

    if let Some(url) = env("SHEETLIB_ADMIN_URL") {
        config.admin_url = url;
    }
    if let Some(url) = env("SHEETLIB_GITHUB_API_URL") {
        config.github_api_url = url;
    }
    if let Some(folder) = env("SHEETLIB_BASE_FOLDER") {
        config.base_folder = folder;
    }
    config.da_token = env("DA_TOKEN");
    config.github_token = env("GITHUB_TOKEN");

    config
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from all sources, starting discovery at `start`
pub fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let file = match find_config_file(start) {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    Ok(resolve(file, non_empty_env))
}

/// Load configuration from all sources, starting at the current directory
pub fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}
