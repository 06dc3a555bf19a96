//! Integration tests for the WebSocket exposure
//!
//! These tests spin up a real HTTP+WebSocket server and verify the full
//! event flow: connect → (subscribe) → reminder run or REST mutation →
//! receive the event via WS.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use common::test_config;
use crm::mail::LogMailer;
use crm::scheduler::ReminderScheduler;
use crm::server::{ServerBuilder, ServerHost};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tower::ServiceExt;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper: start a test server and return (address, host, router)
async fn start_test_server() -> (SocketAddr, Arc<ServerHost>, axum::Router) {
    let (host, app) = ServerBuilder::new()
        .with_config(test_config())
        .with_mailer(Arc::new(LogMailer::new()))
        .build()
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    // Small delay to let the server start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, host, app)
}

/// Helper: connect to WS and return the welcome message + stream
async fn ws_connect(addr: SocketAddr) -> (Value, WsStream) {
    let url = format!("ws://{}/ws", addr);
    let (mut ws, _) = connect_async(&url).await.expect("Failed to connect");
    let welcome = next_json(&mut ws).await;
    (welcome, ws)
}

/// Helper: read the next text frame as JSON
async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(3), ws.next())
            .await
            .expect("Timed out waiting for WS message")
            .expect("Stream ended")
            .expect("WS error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn test_welcome_and_ping() {
    let (addr, _host, _app) = start_test_server().await;
    let (welcome, mut ws) = ws_connect(addr).await;

    assert_eq!(welcome["type"], "welcome");
    assert!(welcome["connection_id"].as_str().unwrap().starts_with("conn_"));
    assert!(welcome["subscription_id"].as_str().unwrap().starts_with("sub_"));

    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    ws.send(Message::Text("not json".into())).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "error");
}

#[tokio::test]
async fn test_reminder_run_is_pushed_to_dashboards() {
    let (addr, host, app) = start_test_server().await;
    let (welcome, mut ws) = ws_connect(addr).await;
    let default_sub = welcome["subscription_id"].clone();

    let request = Request::post("/api/v1/invoices")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "companyName": "Acme",
                "emailAddress": "billing@example.com",
                "amount": 1000,
                "status": "Unpaid",
                "endDate": "2025-05-01T10:00:00Z"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let now = chrono_tz::Asia::Kolkata
        .with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let report = ReminderScheduler::from_host(&host)
        .unwrap()
        .run_invoice_once(now)
        .await
        .unwrap();
    assert_eq!(report.fired, 1);

    // entity events are not part of the default feed
    let reminder = next_json(&mut ws).await;
    assert_eq!(reminder["type"], "event");
    assert_eq!(reminder["subscription_id"], default_sub);
    assert_eq!(reminder["event"], "reminder");
    assert_eq!(reminder["data"]["reminderType"], "On Due Date");
    assert_eq!(reminder["data"]["title"], "Invoice Reminder");

    let notification = next_json(&mut ws).await;
    assert_eq!(notification["event"], "notification");
    assert_eq!(notification["data"]["kind"], "On Due Date");
    assert_eq!(
        notification["data"]["id"],
        reminder["data"]["notificationId"]
    );
}

#[tokio::test]
async fn test_entity_subscription_receives_mutations() {
    let (addr, _host, app) = start_test_server().await;
    let (_welcome, mut ws) = ws_connect(addr).await;

    send_json(
        &mut ws,
        json!({
            "type": "subscribe",
            "filter": {"events": ["entity"], "entity_type": "lead", "action": "created"}
        }),
    )
    .await;
    let subscribed = next_json(&mut ws).await;
    assert_eq!(subscribed["type"], "subscribed");

    let request = Request::post("/api/v1/leads")
        .header("content-type", "application/json")
        .body(Body::from(json!({"companyName": "Nimbus"}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let event = next_json(&mut ws).await;
    assert_eq!(event["event"], "entity");
    assert_eq!(event["subscription_id"], subscribed["subscription_id"]);
    assert_eq!(event["data"]["action"], "created");
    assert_eq!(event["data"]["entity_type"], "lead");
    assert_eq!(event["data"]["data"]["companyName"], "Nimbus");
}
