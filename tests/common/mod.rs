//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use sheetlib::adapters::{DirEntry, EntryKind};
use sheetlib::{DocumentStore, LibraryError, Result, SourceHost};

type Key = (String, String, String);

fn key(org: &str, repo: &str, path: &str) -> Key {
    (org.to_string(), repo.to_string(), path.to_string())
}

#[derive(Default)]
struct State {
    documents: HashMap<Key, Value>,
    pages: HashMap<Key, String>,
    configs: HashMap<(String, String), Value>,
    writes: usize,
    fail_writes_to: Option<String>,
}

/// Document store backed by hash maps; clones share state
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, org: &str, repo: &str, path: &str, document: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(key(org, repo, path), document);
        self
    }

    pub fn with_page(self, org: &str, repo: &str, path: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(key(org, repo, path), html.to_string());
        self
    }

    pub fn with_config(self, org: &str, repo: &str, config: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .configs
            .insert((org.to_string(), repo.to_string()), config);
        self
    }

    /// Make every write to a path containing `fragment` fail
    pub fn failing_writes_to(self, fragment: &str) -> Self {
        self.state.lock().unwrap().fail_writes_to = Some(fragment.to_string());
        self
    }

    pub fn document(&self, org: &str, repo: &str, path: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(&key(org, repo, path))
            .cloned()
    }

    pub fn page(&self, org: &str, repo: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(&key(org, repo, path))
            .cloned()
    }

    pub fn config(&self, org: &str, repo: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .configs
            .get(&(org.to_string(), repo.to_string()))
            .cloned()
    }

    /// Number of successful writes of any kind
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    fn check_write(state: &mut State, url: &str) -> Result<()> {
        if let Some(fragment) = &state.fail_writes_to {
            if url.contains(fragment.as_str()) {
                return Err(LibraryError::Transport {
                    service: "memory",
                    url: url.to_string(),
                    status: 500,
                    body: "write refused".to_string(),
                });
            }
        }
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_document(&self, org: &str, repo: &str, path: &str) -> Result<Option<Value>> {
        Ok(self.document(org, repo, path))
    }

    async fn put_document(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        document: &Value,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&mut state, path)?;
        state
            .documents
            .insert(key(org, repo, path), document.clone());
        Ok(())
    }

    async fn get_html(&self, org: &str, repo: &str, path: &str) -> Result<Option<String>> {
        Ok(self.page(org, repo, path))
    }

    async fn put_html(&self, org: &str, repo: &str, path: &str, html: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&mut state, path)?;
        state.pages.insert(key(org, repo, path), html.to_string());
        Ok(())
    }

    async fn get_site_config(&self, org: &str, repo: &str) -> Result<Option<Value>> {
        Ok(self.config(org, repo))
    }

    async fn put_site_config(&self, org: &str, repo: &str, config: &Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&mut state, "config")?;
        state
            .configs
            .insert((org.to_string(), repo.to_string()), config.clone());
        Ok(())
    }
}

/// Source host serving a fixed file tree, keyed by repository path
#[derive(Default)]
pub struct StaticHost {
    files: HashMap<String, String>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl SourceHost for StaticHost {
    async fn list_directory(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> Result<Option<Vec<DirEntry>>> {
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut entries: Vec<DirEntry> = Vec::new();

        for file in self.files.keys() {
            let Some(rest) = file.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((dir, _)) => (dir, EntryKind::Dir),
                None => (rest, EntryKind::File),
            };
            if !entries.iter().any(|e| e.name == name) {
                entries.push(DirEntry {
                    name: name.to_string(),
                    path: format!("{}{}", prefix, name),
                    kind,
                });
            }
        }

        Ok((!entries.is_empty()).then_some(entries))
    }

    async fn get_file(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> Result<Option<String>> {
        Ok(self.files.get(path.trim_matches('/')).cloned())
    }
}
