//! Built-in action parameter handling and session calls

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use test_case::test_case;

use common::RecordingSession;
use stitch_common::Parameters;
use stitch_runner::{ActionRegistry, RunnerResult};

async fn run(session: &RecordingSession, block: &str, params: Value) -> RunnerResult<()> {
    let registry = ActionRegistry::builtin();
    let action = registry.get(block).expect("built-in action");
    let params: Parameters = serde_json::from_value(params).unwrap();
    action.run(session, &params).await
}

#[test_case("click", json!({}), "Missing required parameters for click: selector" ; "click")]
#[test_case("fill", json!({ "value": "" }), "Missing required parameters for fill: selector, value" ; "fill")]
#[test_case("type", json!({ "selector": "#q" }), "Missing required parameters for type: text" ; "type")]
#[test_case("goto", json!({ "url": "  " }), "Missing required parameters for goto: url" ; "blank goto")]
#[test_case("expectText", json!({}), "Missing required parameters for expectText: selector, text" ; "expect text")]
#[test_case("wait", json!({ "ms": null }), "Missing required parameters for wait: ms" ; "wait")]
#[test_case("loadAuthState", json!({}), "Missing required parameters for loadAuthState: path" ; "load auth")]
#[test_case("waitForResponse", json!({}), "Missing required parameters for waitForResponse: urlOrPredicate" ; "wait for response")]
#[tokio::test]
async fn test_missing_parameters_fail_before_session(block: &str, params: Value, expected: &str) {
    let session = RecordingSession::blank();
    let err = run(&session, block, params).await.unwrap_err();
    assert_eq!(err.to_string(), expected);
    assert!(session.ops().is_empty());
}

#[tokio::test]
async fn test_click_waits_then_clicks() {
    let session = RecordingSession::blank();
    run(&session, "click", json!({ "selector": "#go", "timeout": "2500" }))
        .await
        .unwrap();
    assert_eq!(
        session.ops(),
        vec!["wait_for_selector #go visible 2500ms", "click #go"]
    );
}

#[tokio::test]
async fn test_click_failure_names_selector() {
    let session = RecordingSession::blank().failing("#go");
    let err = run(&session, "click", json!({ "selector": "#go" }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to click \"#go\": Timeout 10000ms exceeded waiting for #go"
    );
}

#[tokio::test]
async fn test_type_uses_key_delay() {
    let session = RecordingSession::blank();
    run(&session, "type", json!({ "selector": "#q", "text": "hello", "delay": 25 }))
        .await
        .unwrap();
    assert_eq!(session.ops()[1], "type_text #q hello 25ms");
}

#[tokio::test]
async fn test_press_without_selector_targets_page() {
    let session = RecordingSession::blank();
    run(&session, "press", json!({ "key": "Escape" })).await.unwrap();
    assert_eq!(session.ops(), vec!["press page Escape"]);
}

#[tokio::test]
async fn test_expect_title_exact_by_default() {
    let session = RecordingSession::blank().titled("Home | Shop");

    let err = run(&session, "expectTitle", json!({ "title": "Home" }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Title assertion failed: Title mismatch. Expected: \"Home\", Actual: \"Home | Shop\""
    );

    run(&session, "expectTitle", json!({ "title": "Home", "exact": false }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expect_text_matching() {
    let session = RecordingSession::blank()
        .with_text("#msg", "  Saved successfully ")
        .with_text("#empty", "");

    run(&session, "expectText", json!({ "selector": "#msg", "text": "Saved" }))
        .await
        .unwrap();
    run(
        &session,
        "expectText",
        json!({ "selector": "#msg", "text": "Saved successfully", "exact": "true" }),
    )
    .await
    .unwrap();

    let err = run(&session, "expectText", json!({ "selector": "#empty", "text": "x" }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Text assertion failed: No text content found in element: #empty"
    );
}

#[tokio::test]
async fn test_expect_url() {
    let session = RecordingSession::blank().at("https://shop.test/cart");

    run(&session, "expectUrl", json!({ "pattern": "/cart" })).await.unwrap();

    let err = run(&session, "expectUrl", json!({ "url": "https://shop.test/" }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "URL assertion failed: URL mismatch. Expected: \"https://shop.test/\", Actual: \"https://shop.test/cart\""
    );

    let err = run(&session, "expectUrl", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("Either url or pattern"));
}

#[tokio::test]
async fn test_navigate_to_page_uses_current_origin() {
    let session = RecordingSession::blank().at("https://shop.test/cart?step=2");
    run(&session, "navigateToPage", json!({ "path": "/login" }))
        .await
        .unwrap();
    assert_eq!(
        session.ops(),
        vec![
            "url",
            "goto https://shop.test/login",
            "wait_for_load_state networkidle default",
        ]
    );
}

#[tokio::test]
async fn test_wait_rejects_negative() {
    let session = RecordingSession::blank();
    let err = run(&session, "wait", json!({ "ms": -5 })).await.unwrap_err();
    assert_eq!(err.to_string(), "Wait time must be positive");

    let err = run(&session, "wait", json!({ "ms": "soon" })).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid parameter 'ms' for wait: expected an integer"
    );
}

#[tokio::test]
async fn test_wait_for_selector_states() {
    let session = RecordingSession::blank();
    run(
        &session,
        "waitForSelector",
        json!({ "selector": ".spinner", "state": "detached" }),
    )
    .await
    .unwrap();
    assert_eq!(session.ops(), vec!["wait_for_selector .spinner detached 30000ms"]);

    let err = run(
        &session,
        "waitForSelector",
        json!({ "selector": ".spinner", "state": "shiny" }),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("unknown state 'shiny'"));
}

#[tokio::test]
async fn test_wait_for_load_state_default() {
    let session = RecordingSession::blank();
    run(&session, "waitForLoadState", json!({})).await.unwrap();
    assert_eq!(session.ops(), vec!["wait_for_load_state load 30000ms"]);
}

#[tokio::test]
async fn test_screenshot_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shots/nested/home.jpg");
    let session = RecordingSession::blank();

    run(&session, "screenshot", json!({ "path": path, "fullPage": false }))
        .await
        .unwrap();

    assert!(dir.path().join("shots/nested").is_dir());
    assert_eq!(
        session.ops(),
        vec![format!("screenshot {} jpeg fullPage=false", path.display())]
    );
}

#[tokio::test]
async fn test_tab_actions() {
    let session = Arc::new(RecordingSession::blank());

    run(&session, "openNewTab", json!({ "url": "https://docs.test" }))
        .await
        .unwrap();
    run(&session, "switchToTab", json!({ "index": "0" })).await.unwrap();
    run(&session, "switchToTab", json!({ "title": "Docs" })).await.unwrap();
    run(&session, "closeTab", json!({ "current": true })).await.unwrap();

    assert_eq!(
        session.ops(),
        vec![
            "open_tab https://docs.test",
            "switch_tab Index(0)",
            "switch_tab Title(\"Docs\")",
            "close_tab current",
        ]
    );

    let err = run(&session, "switchToTab", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("Either index, url, or title"));
}

#[tokio::test]
async fn test_auth_state_default_path() {
    let session = RecordingSession::blank();
    run(&session, "saveAuthState", json!({})).await.unwrap();
    assert_eq!(session.ops(), vec!["save_storage_state ./auth-state.json"]);
}

#[tokio::test]
async fn test_execute_javascript_passes_args() {
    let session = RecordingSession::blank();
    run(
        &session,
        "executeJavaScript",
        json!({ "code": "(n) => n * 2", "args": 21 }),
    )
    .await
    .unwrap();
    assert_eq!(session.ops(), vec!["evaluate (n) => n * 2 21"]);
}
