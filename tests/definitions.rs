mod common;

use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

use common::{extended_document, primary_document, MockHttp, PRIMARY_URL};
use rswappalyzer_driver::config::{CustomConfigBuilder, ResourceLocation};
use rswappalyzer_driver::rule::{DefinitionLoader, DefinitionsHandle};

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

fn loader(http: std::sync::Arc<MockHttp>, fallback: PathBuf, extended: PathBuf) -> DefinitionLoader {
    let config = CustomConfigBuilder::new()
        .primary_definitions_url(PRIMARY_URL)
        .fallback_definitions(ResourceLocation::Local(fallback))
        .extended_definitions(ResourceLocation::Local(extended))
        .build();
    DefinitionLoader::new(http, config)
}

#[tokio::test]
async fn test_remote_primary_merged_with_extended() {
    let dir = tempfile::tempdir().unwrap();
    let extended = write_json(&dir, "extended_apps.json", &extended_document());
    let http = MockHttp::new();
    http.route(PRIMARY_URL, 200, &primary_document().to_string());

    let definitions = loader(http.clone(), dir.path().join("missing.json"), extended)
        .load()
        .await
        .unwrap();

    assert_eq!(definitions.apps["A"]["v"], json!(2));
    assert_eq!(definitions.apps["B"]["v"], json!(3));
    assert!(definitions.apps.contains_key("Nginx"));
    assert_eq!(definitions.category_order, Some(vec![2, 1]));
    assert_eq!(definitions.supported_apps, Some(json!(["A"])));
    assert_eq!(definitions.tech_tooltips, Some(json!({"A": "A tooltip"})));
    assert_eq!(http.get_count(PRIMARY_URL), 1);
}

#[tokio::test]
async fn test_primary_non_ok_falls_back_to_local_copy() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = write_json(&dir, "apps.json", &primary_document());
    let extended = write_json(&dir, "extended_apps.json", &extended_document());
    let http = MockHttp::new();
    http.route(PRIMARY_URL, 503, "unavailable");

    let definitions = loader(http, fallback, extended).load().await.unwrap();

    assert!(!definitions.is_empty());
    assert!(definitions.apps.contains_key("Nginx"));
    assert_eq!(definitions.categories.len(), 2);
}

#[tokio::test]
async fn test_primary_network_error_falls_back_to_local_copy() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = write_json(&dir, "apps.json", &primary_document());
    let extended = write_json(&dir, "extended_apps.json", &extended_document());

    // 未配置路由：网络错误
    let definitions = loader(MockHttp::new(), fallback, extended).load().await.unwrap();
    assert_eq!(definitions.apps["A"]["v"], json!(2));
}

#[tokio::test]
async fn test_extended_failure_leaves_partial_state() {
    let dir = tempfile::tempdir().unwrap();
    let http = MockHttp::new();
    http.route(PRIMARY_URL, 200, &primary_document().to_string());

    let definitions = loader(http, dir.path().join("apps.json"), dir.path().join("missing.json"))
        .load()
        .await
        .unwrap();

    assert_eq!(definitions.apps["A"]["v"], json!(1));
    assert!(!definitions.apps.contains_key("B"));
    assert_eq!(definitions.categories.len(), 2);
    assert_eq!(definitions.category_order, None);
    assert_eq!(definitions.supported_apps, None);
    assert_eq!(definitions.convertable_apps, None);
}

#[tokio::test]
async fn test_all_sources_failing_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = loader(
        MockHttp::new(),
        dir.path().join("apps.json"),
        dir.path().join("extended_apps.json"),
    )
    .load()
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_primary_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = write_json(&dir, "apps.json", &primary_document());
    let http = MockHttp::new();
    http.route(PRIMARY_URL, 200, "{not json");

    let definitions = loader(http, fallback, dir.path().join("missing.json"))
        .load()
        .await
        .unwrap();
    assert!(definitions.apps.contains_key("Nginx"));
}

#[tokio::test]
async fn test_waiters_released_on_publish() {
    let handle = DefinitionsHandle::new();
    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_ready().await.apps.len() })
    };

    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    let dir = tempfile::tempdir().unwrap();
    let http = MockHttp::new();
    http.route(PRIMARY_URL, 200, &primary_document().to_string());
    let definitions = loader(http, dir.path().join("a.json"), dir.path().join("b.json"))
        .load()
        .await
        .unwrap();
    handle.publish(definitions);

    assert_eq!(waiter.await.unwrap(), 2);
}
