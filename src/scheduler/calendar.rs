//! Calendar job: remind about scheduled events happening today

use super::{ReminderContext, ReminderDraft, ReminderKind, RunReport, local_day};
use crate::core::field::DateValue;
use crate::mail::templates;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Whether an event starting at `start` falls on the local day `today`
pub fn is_due(start: DateValue, today: NaiveDate, tz: Tz) -> bool {
    start.local_day(tz) == today
}

pub(crate) async fn run(ctx: &ReminderContext, now: DateTime<Utc>) -> Result<RunReport> {
    let today = local_day(now, ctx.timezone);
    let events = ctx.stores.scheduled_events.list().await?;
    let mut fired = ctx.fired_keys(today).await?;
    let mut report = RunReport::default();

    for event in events {
        report.scanned += 1;
        let Some(start) = event.date else {
            report.skipped += 1;
            continue;
        };
        if !is_due(start, today, ctx.timezone) {
            continue;
        }

        let mut recipients = event.recipients();
        if recipients.is_empty()
            && let Some(fallback) = ctx.default_recipient.as_ref()
        {
            recipients.push(fallback.clone());
        }
        let emails = recipients
            .iter()
            .map(|to| templates::calendar_reminder(to, &event, today))
            .collect();

        let title = if event.title.trim().is_empty() {
            "Scheduled event".to_string()
        } else {
            event.title.clone()
        };
        let draft = ReminderDraft {
            reference_type: "scheduled_event",
            reference_id: event.id,
            message: format!("{} is scheduled for today", title),
            title,
            kind: ReminderKind::Today,
            due_date: start.instant(ctx.timezone),
            emails,
        };
        report.record(ctx.deliver(draft, now, &mut fired).await);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventBus, Record};
    use crate::mail::LogMailer;
    use crate::scheduler::ReminderContext;
    use crate::storage::Stores;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    const IST: Tz = chrono_tz::Asia::Kolkata;

    fn context(mailer: Arc<LogMailer>) -> ReminderContext {
        ReminderContext {
            stores: Stores::in_memory(),
            event_bus: EventBus::new(64),
            mailer,
            timezone: IST,
            default_recipient: Some("ops@example.com".to_string()),
        }
    }

    async fn add_event(ctx: &ReminderContext, payload: serde_json::Value) {
        let event = crate::entities::ScheduledEvent::from_payload(payload).unwrap();
        ctx.stores.scheduled_events.create(event).await.unwrap();
    }

    #[test]
    fn test_is_due_uses_local_day() {
        // 2025-06-09T20:00Z is 10 June in Kolkata
        let start = DateValue::At(Utc.with_ymd_and_hms(2025, 6, 9, 20, 0, 0).unwrap());
        let june_10 = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert!(is_due(start, june_10, IST));
        assert!(!is_due(start, june_10, chrono_tz::UTC));

        let bare = DateValue::Day(june_10);
        assert!(is_due(bare, june_10, chrono_tz::America::Los_Angeles));
        assert!(is_due(bare, june_10, IST));
    }

    #[tokio::test]
    async fn test_bare_day_event_fires_on_that_day_west_of_utc() {
        let mailer = Arc::new(LogMailer::new());
        let ctx = ReminderContext {
            timezone: chrono_tz::America::New_York,
            ..context(mailer.clone())
        };
        add_event(&ctx, json!({"title": "Site visit", "date": "2025-03-13"})).await;

        // 22:00 on 12 March in New York
        let evening_before = Utc.with_ymd_and_hms(2025, 3, 13, 2, 0, 0).unwrap();
        assert_eq!(run(&ctx, evening_before).await.unwrap().fired, 0);

        // 10:00 on 13 March in New York
        let morning_of = Utc.with_ymd_and_hms(2025, 3, 13, 14, 0, 0).unwrap();
        assert_eq!(run(&ctx, morning_of).await.unwrap().fired, 1);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_fires_once_per_day() {
        let mailer = Arc::new(LogMailer::new());
        let ctx = context(mailer.clone());
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap();

        add_event(&ctx, json!({"title": "Demo", "date": "2025-06-10T06:00:00Z", "participants": "a@x.com, b@x.com"})).await;
        add_event(&ctx, json!({"title": "Later", "date": "2025-06-12T06:00:00Z"})).await;
        add_event(&ctx, json!({"title": "Undated"})).await;

        let first = run(&ctx, now).await.unwrap();
        assert_eq!(first.scanned, 3);
        assert_eq!(first.fired, 1);
        assert_eq!(first.skipped, 1);
        assert_eq!(mailer.sent().len(), 2);

        // next tick, same day
        let second = run(&ctx, now + chrono::Duration::minutes(1)).await.unwrap();
        assert_eq!(second.fired, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(ctx.stores.notifications.count().await.unwrap(), 1);

        let notification = &ctx.stores.notifications.list().await.unwrap()[0];
        assert_eq!(notification.kind, "Today");
        assert_eq!(notification.reference_type, "scheduled_event");
    }

    #[tokio::test]
    async fn test_default_recipient_used_without_participants() {
        let mailer = Arc::new(LogMailer::new());
        let ctx = context(mailer.clone());
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap();
        add_event(&ctx, json!({"title": "Solo", "date": "10-06-2025"})).await;

        let report = run(&ctx, now).await.unwrap();
        assert_eq!(report.fired, 1);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
    }

    #[tokio::test]
    async fn test_publishes_calendar_event() {
        let ctx = context(Arc::new(LogMailer::new()));
        let mut rx = ctx.event_bus.subscribe();
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap();
        add_event(&ctx, json!({"title": "Call", "date": "2025-06-10T08:00:00Z"})).await;

        run(&ctx, now).await.unwrap();
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.name(), "calenderreminder");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"]["reminderType"], "Today");
        assert_eq!(json["data"]["title"], "Call");
    }
}
