//! Site config registration tests.
//!
//! Covers each stored config shape, re-registration and the read-only check.

mod common;

use common::MemoryStore;
use serde_json::json;

use sheetlib::Registrar;

const ORG: &str = "acme";
const REPO: &str = "site";
const BLOCKS_URL: &str = "https://content.da.live/acme/site/docs/library/blocks.json";

fn flat_config(rows: usize) -> serde_json::Value {
    let data: Vec<_> = (0..rows)
        .map(|i| json!({"key": format!("setting-{}", i), "value": "on"}))
        .collect();
    json!({
        "total": rows,
        "limit": rows,
        "offset": 0,
        "data": data,
        ":colWidths": [120, 80],
        ":type": "sheet"
    })
}

#[tokio::test]
async fn test_register_into_missing_config() {
    let store = MemoryStore::new();

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "blocks", BLOCKS_URL)
        .await;

    assert!(outcome.registered);
    assert!(!outcome.existed);
    assert!(outcome.created_sheet);
    assert!(!outcome.converted_to_multi_sheet);
    assert_eq!(outcome.library_entry_count, 1);

    let config = store.config(ORG, REPO).unwrap();
    assert_eq!(config[":type"], "multi-sheet");
    assert_eq!(config[":names"], json!(["library"]));
    assert_eq!(config["library"]["data"][0]["title"], "blocks");
    assert_eq!(config["library"]["data"][0]["path"], BLOCKS_URL);
}

#[tokio::test]
async fn test_flat_config_is_migrated() {
    let store = MemoryStore::new().with_config(ORG, REPO, flat_config(4));

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "icons", "https://content.da.live/acme/site/docs/library/icons.json")
        .await;

    assert!(outcome.registered);
    assert!(outcome.converted_to_multi_sheet);
    assert_eq!(outcome.preserved_rows, 4);

    let config = store.config(ORG, REPO).unwrap();
    assert_eq!(config[":names"], json!(["data", "library"]));
    assert_eq!(config["data"]["total"], 4);
    assert_eq!(config["data"]["data"][3]["key"], "setting-3");
    assert_eq!(config["data"][":colWidths"], json!([120, 80]));
    assert_eq!(config["library"]["total"], 1);
}

#[tokio::test]
async fn test_other_sheets_untouched() {
    let config = json!({
        "permissions": {
            "total": 1, "limit": 1, "offset": 0,
            "data": [{"path": "/+**", "groups": "admins"}],
            ":type": "sheet"
        },
        ":version": 3,
        ":names": ["permissions"],
        ":type": "multi-sheet"
    });
    let store = MemoryStore::new().with_config(ORG, REPO, config);

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "templates", "https://example.com/t.json")
        .await;

    assert!(outcome.registered);
    assert!(outcome.created_sheet);
    assert_eq!(outcome.preserved_rows, 0);

    let stored = store.config(ORG, REPO).unwrap();
    assert_eq!(stored[":names"], json!(["permissions", "library"]));
    assert_eq!(stored["permissions"]["data"][0]["groups"], "admins");
}

#[tokio::test]
async fn test_reregister_replaces_path() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(&store);

    registrar.register(ORG, REPO, "blocks", "https://old/blocks.json").await;
    let outcome = registrar.register(ORG, REPO, "blocks", BLOCKS_URL).await;

    assert!(outcome.registered);
    assert!(outcome.existed);
    assert_eq!(outcome.library_entry_count, 1);

    let check = registrar.check(ORG, REPO, "blocks").await;
    assert!(check.registered);
    assert_eq!(check.path.as_deref(), Some(BLOCKS_URL));
}

#[tokio::test]
async fn test_new_row_is_backfilled() {
    let config = json!({
        "library": {
            "total": 1, "limit": 1, "offset": 0,
            "data": [{"title": "icons", "path": "https://x/icons.json", "owner": "design"}],
            ":type": "sheet"
        },
        ":version": 3,
        ":names": ["library"],
        ":type": "multi-sheet"
    });
    let store = MemoryStore::new().with_config(ORG, REPO, config);

    Registrar::new(&store)
        .register(ORG, REPO, "blocks", BLOCKS_URL)
        .await;

    let stored = store.config(ORG, REPO).unwrap();
    let added = &stored["library"]["data"][1];
    assert_eq!(added["title"], "blocks");
    assert_eq!(added["owner"], "");
    assert_eq!(stored["library"]["total"], 2);
}

#[tokio::test]
async fn test_malformed_config_is_reported() {
    let store = MemoryStore::new().with_config(ORG, REPO, json!({"whatever": true}));

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "blocks", BLOCKS_URL)
        .await;

    assert!(!outcome.registered);
    assert!(outcome.error.is_some());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let store = MemoryStore::new().failing_writes_to("config");

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "blocks", BLOCKS_URL)
        .await;

    assert!(!outcome.registered);
    assert!(outcome.error.unwrap().contains("500"));
}

#[tokio::test]
async fn test_unknown_type_rejected() {
    let store = MemoryStore::new();

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "widgets", "https://x/widgets.json")
        .await;

    assert!(!outcome.registered);
    assert!(outcome.error.unwrap().contains("widgets"));
    assert!(store.config(ORG, REPO).is_none());
}

#[tokio::test]
async fn test_check_without_library_sheet() {
    let store = MemoryStore::new().with_config(ORG, REPO, flat_config(2));

    let check = Registrar::new(&store).check(ORG, REPO, "blocks").await;

    assert!(!check.registered);
    assert!(check.reason.is_some());
    assert!(check.error.is_none());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_check_lists_registered_types() {
    let store = MemoryStore::new();
    let registrar = Registrar::new(&store);
    registrar.register(ORG, REPO, "icons", "https://x/icons.json").await;
    registrar.register(ORG, REPO, "templates", "https://x/templates.json").await;

    let check = registrar.check(ORG, REPO, "blocks").await;

    assert!(!check.registered);
    assert_eq!(check.registered_types, vec!["icons", "templates"]);
}

#[tokio::test]
async fn test_private_and_sheet_members_preserved() {
    let private = json!({"secrets": {"data": [{"key": "token", "value": "abc"}]}});
    let config = json!({
        "permissions": {
            "total": 1, "limit": 1, "offset": 0,
            "data": [{"path": "/+**", "groups": "admins"}],
            ":sheetname": "permissions",
            ":type": "sheet"
        },
        ":private": private.clone(),
        ":version": 3,
        ":names": ["permissions"],
        ":type": "multi-sheet"
    });
    let store = MemoryStore::new().with_config(ORG, REPO, config);

    let outcome = Registrar::new(&store)
        .register(ORG, REPO, "blocks", BLOCKS_URL)
        .await;
    assert!(outcome.registered);

    let stored = store.config(ORG, REPO).unwrap();
    assert_eq!(stored[":private"], private);
    assert_eq!(stored["permissions"][":sheetname"], "permissions");
    assert_eq!(stored[":names"], json!(["permissions", "library"]));
    assert_eq!(stored["library"]["data"][0]["title"], "blocks");
}

#[tokio::test]
async fn test_flat_migration_keeps_sheet_members() {
    let mut config = flat_config(2);
    config[":sheetname"] = json!("settings");
    let store = MemoryStore::new().with_config(ORG, REPO, config);

    Registrar::new(&store)
        .register(ORG, REPO, "icons", "https://x/icons.json")
        .await;

    let stored = store.config(ORG, REPO).unwrap();
    assert_eq!(stored["data"][":sheetname"], "settings");
    assert_eq!(stored["data"]["total"], 2);
}

#[tokio::test]
async fn test_check_with_empty_library_sheet() {
    let config = json!({
        "library": {"total": 0, "limit": 0, "offset": 0, "data": [], ":type": "sheet"},
        ":version": 3,
        ":names": ["library"],
        ":type": "multi-sheet"
    });
    let store = MemoryStore::new().with_config(ORG, REPO, config);

    let check = Registrar::new(&store).check(ORG, REPO, "blocks").await;

    assert!(!check.registered);
    assert_eq!(check.reason.as_deref(), Some("'blocks' is not registered"));
    assert!(check.registered_types.is_empty());
}
