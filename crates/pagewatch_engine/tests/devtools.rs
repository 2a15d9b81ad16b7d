use std::time::Duration;

use pagewatch_core::TargetId;
use pagewatch_engine::{DevToolsHost, DevToolsSettings, HostError, PageHost};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn host_with_listing(listing: serde_json::Value) -> (MockServer, DevToolsHost) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(&server)
        .await;
    let host = DevToolsHost::new(DevToolsSettings {
        base_url: format!("{}/", server.uri()),
        request_timeout: Duration::from_secs(5),
    })
    .expect("client");
    (server, host)
}

fn listing() -> serde_json::Value {
    json!([
        {
            "id": "A1",
            "type": "page",
            "title": "(1) Chat | Microsoft Teams",
            "url": "https://teams.microsoft.com/v2/",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/A1"
        },
        {
            "id": "W1",
            "type": "service_worker",
            "url": "https://teams.microsoft.com/sw.js"
        },
        {
            "id": "B2",
            "type": "page",
            "title": "New Tab",
            "url": "chrome://newtab/"
        }
    ])
}

#[tokio::test]
async fn lists_only_page_targets() {
    let (_server, host) = host_with_listing(listing()).await;

    let targets = host.list_targets().await.expect("listing");
    let ids: Vec<&str> = targets.iter().map(|info| info.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "B2"]);
    assert_eq!(targets[0].url, "https://teams.microsoft.com/v2/");
    assert_eq!(targets[0].title, "(1) Chat | Microsoft Teams");
}

#[tokio::test]
async fn liveness_follows_the_listing() {
    let (_server, host) = host_with_listing(listing()).await;

    assert!(host.is_alive(&TargetId::new("A1")).await.unwrap());
    assert!(!host.is_alive(&TargetId::new("W1")).await.unwrap());
    assert!(!host.is_alive(&TargetId::new("gone")).await.unwrap());
}

#[tokio::test]
async fn target_without_debugger_url_cannot_be_snapshotted() {
    let (_server, host) = host_with_listing(listing()).await;

    let err = host.snapshot(&TargetId::new("B2")).await.unwrap_err();
    assert_eq!(err, HostError::TargetNotFound(TargetId::new("B2")));
}

#[tokio::test]
async fn listing_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/list"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let host = DevToolsHost::new(DevToolsSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_secs(5),
    })
    .expect("client");

    assert_eq!(
        host.list_targets().await.unwrap_err(),
        HostError::HttpStatus(503)
    );
}
