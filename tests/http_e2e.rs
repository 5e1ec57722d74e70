//! The bridge served over a real TCP listener.

mod common;

use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use op25_bridge::domain::Envelope;

use common::{harness, FrameReader};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn sse_and_commands_over_tcp() {
    let h = harness();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = h.ctx.shutdown_token();
    let app = h.ctx.router();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let mut frames = FrameReader::new(Box::pin(response.bytes_stream()));
    let hello = frames.next_data(WAIT).await.expect("connection frame");
    assert_eq!(hello["event"], "connection");

    let payload = json!({"json_type": "call_log", "log": []});
    h.inbound.try_push(Envelope::from_value(&payload)).unwrap();
    let frame = frames.next_data(WAIT).await.expect("call_log frame");
    assert_eq!(frame["event"], "call_log");
    assert_eq!(frame["data"], payload);

    // The call_log envelope was also mirrored into the response queue.
    let responses: Value = client
        .post(format!("http://{addr}/"))
        .body(r#"[{"command":"update","arg1":0,"arg2":0}]"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(responses, json!([payload]));
    assert_eq!(h.commands.len(), 1);

    let missing = client
        .get(format!("http://{addr}/missing.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.text().await.unwrap(), "404 NOT FOUND");

    h.ctx.shutdown();
    assert!(frames.next_frame(WAIT).await.is_none());
    tokio::time::timeout(WAIT, server)
        .await
        .expect("server stopped")
        .unwrap()
        .unwrap();
}
