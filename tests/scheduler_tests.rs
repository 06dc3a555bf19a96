//! Reminder jobs driven against records created over HTTP

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use common::test_app;
use crm::scheduler::{ReminderScheduler, RunReport};
use serde_json::{Value, json};

/// Wall-clock time in India as a UTC instant
fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Kolkata
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn test_invoice_reminders_fire_once_per_day() {
    let app = test_app();
    for (company, status, due) in [
        ("Due In Three", "Unpaid", "2025-05-04T10:00:00Z"),
        ("Due Tomorrow", "Unpaid", "2025-05-02T10:00:00Z"),
        ("Already Paid", "Paid", "2025-05-02T10:00:00Z"),
        ("Far Off", "Unpaid", "2025-06-30T10:00:00Z"),
    ] {
        app.server
            .post("/api/v1/invoices")
            .json(&json!({
                "companyName": company,
                "emailAddress": "billing@example.com",
                "amount": 1000,
                "status": status,
                "endDate": due
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let scheduler = ReminderScheduler::from_host(&app.host).unwrap();
    let report = scheduler.run_invoice_once(ist(2025, 5, 1, 9, 0)).await.unwrap();
    assert_eq!(
        report,
        RunReport {
            scanned: 3,
            fired: 2,
            ..Default::default()
        }
    );

    let body: Value = app.server.get("/api/v1/notifications").await.json();
    let mut kinds: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect();
    kinds.sort();
    assert_eq!(kinds, vec!["1 Day Before", "3 Days Before"]);
    assert_eq!(app.mailer.sent().len(), 2);

    // a restart later the same day does not repeat them
    let again = scheduler.run_invoice_once(ist(2025, 5, 1, 21, 0)).await.unwrap();
    assert_eq!(again.fired, 0);
    assert_eq!(again.skipped, 2);
    assert_eq!(app.mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_paying_an_invoice_stops_its_reminders() {
    let app = test_app();
    let created: Value = app
        .server
        .post("/api/v1/invoices")
        .json(&json!({
            "companyName": "Acme",
            "emailAddress": "billing@example.com",
            "amount": 500,
            "status": "Unpaid",
            "endDate": "2025-05-02T10:00:00Z"
        }))
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    app.server
        .patch(&format!("/api/v1/invoices/{}/status", id))
        .json(&json!({"status": "Paid"}))
        .await
        .assert_status_ok();

    let scheduler = ReminderScheduler::from_host(&app.host).unwrap();
    let report = scheduler.run_invoice_once(ist(2025, 5, 1, 9, 0)).await.unwrap();
    assert_eq!(report, RunReport::default());
}

#[tokio::test]
async fn test_calendar_reminder_for_todays_events() {
    let app = test_app();
    app.server
        .post("/api/v1/scheduled_events")
        .json(&json!({
            "title": "Quarterly review",
            "date": "2025-05-01T11:30:00Z",
            "participants": "ops@example.com, cfo@example.com"
        }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/v1/scheduled_events")
        .json(&json!({"title": "Next week", "date": "2025-05-08T11:30:00Z"}))
        .await
        .assert_status(StatusCode::CREATED);

    let scheduler = ReminderScheduler::from_host(&app.host).unwrap();
    let report = scheduler
        .run_calendar_once(ist(2025, 5, 1, 8, 0))
        .await
        .unwrap();
    assert_eq!(report.fired, 1);
    assert_eq!(report.mail_failed, 0);

    let recipients: Vec<String> = app.mailer.sent().into_iter().map(|m| m.to).collect();
    assert_eq!(recipients, vec!["ops@example.com", "cfo@example.com"]);

    let body: Value = app.server.get("/api/v1/notifications").await.json();
    assert_eq!(body["data"][0]["kind"], "Today");
    assert_eq!(body["data"][0]["isRead"], false);

    // the 60s tick keeps running all day without repeating
    for minute in [1, 2, 3] {
        let report = scheduler
            .run_calendar_once(ist(2025, 5, 1, 8, minute))
            .await
            .unwrap();
        assert_eq!(report.fired, 0);
    }
    assert_eq!(app.mailer.sent().len(), 2);
}
