use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use pagewatch_core::{ChangeEvent, EventKind};
use pagewatch_engine::{dispatch, DeliveryError, HttpSink, NotificationSink, SinkSettings};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event() -> ChangeEvent {
    ChangeEvent {
        kind: EventKind::NewMessage,
        count: 2,
        previous_count: Some(-1),
        label: "Microsoft Teams".to_string(),
        message: "2 unread messages".to_string(),
        timestamp: 1_700_000_000_000,
    }
}

fn sink_for(server: &MockServer) -> HttpSink {
    HttpSink::new(SinkSettings {
        url: format!("{}/notification", server.uri()),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .expect("client")
}

#[tokio::test]
async fn posts_the_event_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notification"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "type": "new_message",
            "count": 2,
            "previousCount": -1,
            "title": "Microsoft Teams",
            "message": "2 unread messages",
            "timestamp": 1_700_000_000_000_i64,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    sink_for(&server).deliver(&event()).await.expect("delivered");
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notification"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = sink_for(&server).deliver(&event()).await.unwrap_err();
    assert_eq!(err, DeliveryError::HttpStatus(500));
}

#[tokio::test]
async fn unreachable_sink_fails_without_panicking() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let sink: Arc<dyn NotificationSink> = Arc::new(
        HttpSink::new(SinkSettings {
            url: format!("http://127.0.0.1:{port}/notification"),
            request_timeout: Some(Duration::from_secs(2)),
        })
        .expect("client"),
    );
    let result = dispatch(sink, event()).await.expect("task joined");
    assert!(matches!(
        result,
        Err(DeliveryError::Network(_)) | Err(DeliveryError::Timeout)
    ));
}
