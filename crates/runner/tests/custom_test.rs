//! Lua custom blocks

mod common;

use std::sync::Arc;

use common::RecordingSession;
use stitch_common::{CustomBlock, Parameters};
use stitch_runner::{BrowserSession, CustomBlockExecutor};

fn block(code: &str) -> CustomBlock {
    CustomBlock {
        name: "test-block".to_string(),
        description: None,
        code: code.to_string(),
    }
}

fn executor(session: Arc<RecordingSession>) -> CustomBlockExecutor {
    let session: Arc<dyn BrowserSession> = session;
    CustomBlockExecutor::new(session)
}

#[tokio::test]
async fn test_helpers_drive_the_session() {
    let session = RecordingSession::new();
    let params = Parameters::new()
        .with("selector", "#search")
        .with("query", "rust");

    executor(session.clone())
        .run(
            &block(
                r##"
                waitForSelector(parameters.selector)
                fill(parameters.selector, parameters.query)
                click("#submit")
                wait(1)
                navigate("/results")
                "##,
            ),
            &params,
        )
        .await
        .unwrap();

    assert_eq!(
        session.ops(),
        vec![
            "wait_for_selector #search visible default",
            "fill #search rust",
            "click #submit",
            "goto /results",
        ]
    );
}

#[tokio::test]
async fn test_goto_reachable_through_globals() {
    let session = RecordingSession::new();

    executor(session.clone())
        .run(&block(r#"_G["goto"]("/docs")"#), &Parameters::new())
        .await
        .unwrap();

    assert_eq!(session.ops(), vec!["goto /docs"]);
}

#[tokio::test]
async fn test_null_parameters_are_nil() {
    let session = RecordingSession::new();
    let params: Parameters =
        serde_json::from_value(serde_json::json!({ "selector": null, "label": "ok" })).unwrap();
    let code = r#"
        if parameters.selector then click(parameters.selector) end
        if parameters.selector ~= nil then error("selector should be nil") end
        if parameters.label ~= "ok" then error("label lost") end
    "#;

    executor(session.clone())
        .run(&block(code), &params)
        .await
        .unwrap();

    assert!(session.ops().is_empty());
}

#[tokio::test]
async fn test_page_info_is_readable() {
    let session = Arc::new(RecordingSession::blank().titled("Home").at("https://shop.test/"));
    let code = r#"
        if page.title() ~= "Home" then error("wrong title") end
        if not string.find(page.url(), "shop.test", 1, true) then error("wrong url") end
        console.log("on", page.title())
    "#;

    executor(session)
        .run(&block(code), &Parameters::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lua_error_becomes_custom_block_failure() {
    let err = executor(RecordingSession::new())
        .run(&block("error('checkout total mismatch')"), &Parameters::new())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Custom block failed: "), "{}", message);
    assert!(message.contains("checkout total mismatch"), "{}", message);
}

#[tokio::test]
async fn test_failing_helper_surfaces_session_error() {
    let session = Arc::new(RecordingSession::blank().failing("#missing"));
    let err = executor(session)
        .run(&block("click('#missing')"), &Parameters::new())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Custom block failed: "), "{}", message);
    assert!(
        message.contains("Timeout default exceeded waiting for #missing"),
        "{}",
        message
    );
}

#[tokio::test]
async fn test_empty_code_is_rejected() {
    let err = executor(RecordingSession::new())
        .run(&block("   \n"), &Parameters::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Custom block failed: No custom code provided");
}

#[tokio::test]
async fn test_syntax_error_is_reported() {
    let err = executor(RecordingSession::new())
        .run(&block("click(("), &Parameters::new())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Custom block failed: "));
}

#[tokio::test]
async fn test_sandbox_hides_host_access() {
    let code = r#"
        for _, name in ipairs({ "io", "os", "package", "debug", "require", "dofile", "loadfile", "load", "collectgarbage" }) do
            if _G[name] ~= nil then error("exposed: " .. name) end
        end
    "#;

    executor(RecordingSession::new())
        .run(&block(code), &Parameters::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_state_does_not_leak_between_runs() {
    let executor = executor(RecordingSession::new());

    executor
        .run(&block("leaked = 42"), &Parameters::new())
        .await
        .unwrap();
    executor
        .run(
            &block("if leaked ~= nil then error('state leaked') end"),
            &Parameters::new(),
        )
        .await
        .unwrap();
}
