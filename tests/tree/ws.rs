//! WebSocket transport integration tests.

use std::sync::Arc;
use std::time::Duration;

use command_tree::connection::{self, WsClient};
use command_tree::{App, Session, USER_ID};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use crate::support;

/// Bind to port 0 and return the WebSocket URL.
async fn start_server(app: App) -> String {
    let routes = connection::router(Arc::new(app));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

#[tokio::test]
async fn envelopes_round_trip() {
    let url = start_server(support::server_app()).await;
    let client = WsClient::connect(&url).await.unwrap();

    let created = client
        .call("todosCreate", json!({ "title": "tea" }))
        .await
        .unwrap();
    assert_eq!(created["id"], "t1");

    let all = client.call("todosGet", json!({})).await.unwrap();
    assert_eq!(all, json!([{ "id": "t1", "title": "tea", "completed": false }]));

    let err = client.call("todosArchive", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn concurrent_calls_share_one_socket() {
    let url = start_server(support::server_app()).await;
    let client = WsClient::connect(&url).await.unwrap();

    let calls = (0..5).map(|i| client.call("todosCreate", json!({ "title": format!("item {i}") })));
    let results = futures_util::future::join_all(calls).await;
    assert!(results.iter().all(Result::is_ok));

    let all = client.call("todosGet", json!({})).await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn upgrade_headers_become_the_session() {
    let url = start_server(support::server_app()).await;

    let anonymous = WsClient::connect(&url).await.unwrap();
    let err = anonymous.call("accountWhoami", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 401);

    let session = Session::new().with(USER_ID, "u9");
    let signed_in = WsClient::connect_with_session(&url, &session).await.unwrap();
    let me = signed_in.call("accountWhoami", json!({})).await.unwrap();
    assert_eq!(me["user_id"], "u9");
}

#[tokio::test]
async fn ws_client_drives_a_remote_app() {
    let url = start_server(support::server_app()).await;
    let remote = App::new(support::tree())
        .unwrap()
        .with_client(WsClient::connect(&url).await.unwrap());

    let created = remote
        .execute("todosCreate", json!({ "title": "jam" }))
        .await
        .unwrap();
    let updated = remote
        .execute("todosUpdate", json!({ "id": created["id"], "completed": true }))
        .await
        .unwrap();
    assert_eq!(updated["completed"], true);

    let err = remote.execute("todosCreate", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn malformed_frames_are_skipped() {
    let url = start_server(support::server_app()).await;
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();

    socket.send(Message::Text("not an envelope".into())).await.unwrap();
    socket
        .send(Message::Text(
            json!({ "id": 42, "command": "todosGet" }).to_string(),
        ))
        .await
        .unwrap();

    let reply = loop {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => break serde_json::from_str::<Value>(&text).unwrap(),
            _ => continue,
        }
    };
    assert_eq!(reply, json!({ "id": 42, "error": null, "result": [] }));
}

/// A server that accepts one socket, closes it, then drains until the
/// client goes away.
async fn start_closing_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = socket.close(None).await;
        while let Some(Ok(_)) = socket.next().await {}
    });
    format!("ws://{addr}")
}

#[tokio::test]
async fn calls_after_the_server_closes_fail_fast() {
    let url = start_closing_server().await;
    let client = WsClient::connect(&url).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while !client.is_closed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never saw the close frame");

    let err = tokio::time::timeout(Duration::from_secs(5), client.call("todosGet", json!({})))
        .await
        .expect("call hung on a closed socket")
        .unwrap_err();
    assert_eq!(err.status_code(), 503);
}
