//! Reminder jobs for calendar events and unpaid invoices
//!
//! The scheduler is an explicit object: build it from the server host, call
//! [`ReminderScheduler::start`] to spawn both jobs and keep the returned
//! [`SchedulerHandle`] to stop them.
//!
//! ```text
//! tick ──▶ scan collection ──▶ due today? ──▶ store Notification
//!                                               ├──▶ live event (reminder / calenderreminder)
//!                                               ├──▶ feed event (notification)
//!                                               └──▶ email
//! ```
//!
//! A reminder fires at most once per record, label and local day. The check
//! runs against stored notifications, so restarts and repeated ticks do not
//! fire it again.

pub mod calendar;
pub mod invoice;

use crate::config::SchedulerConfig;
use crate::core::error::ConfigError;
use crate::core::{CrmEvent, EventBus, Record, ReminderEvent};
use crate::entities::{Notification, ReminderKey};
use crate::mail::{Email, MailError, Mailer};
use crate::server::host::ServerHost;
use crate::storage::Stores;
use anyhow::Result;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Label attached to a fired reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    ThreeDaysBefore,
    OneDayBefore,
    OnDueDate,
    Today,
}

impl ReminderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReminderKind::ThreeDaysBefore => "3 Days Before",
            ReminderKind::OneDayBefore => "1 Day Before",
            ReminderKind::OnDueDate => "On Due Date",
            ReminderKind::Today => "Today",
        }
    }
}

/// Counters of one job run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Candidate records examined
    pub scanned: usize,
    /// Reminders stored and pushed
    pub fired: usize,
    /// Due records skipped: already reminded today, or no usable date
    pub skipped: usize,
    /// Records whose notification could not be stored
    pub failed: usize,
    /// Emails that could not be built or delivered
    pub mail_failed: usize,
}

/// Local calendar day of an instant
pub fn local_day(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// Next instant the wall clock in `tz` reads `at`, strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> DateTime<Utc> {
    let today = local_day(now, tz);
    [today, today + Days::new(1), today + Days::new(2)]
        .into_iter()
        .filter_map(|day| {
            let naive = day.and_time(at);
            tz.from_local_datetime(&naive)
                .earliest()
                // wall-clock time skipped by a DST jump
                .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .find(|dt| *dt > now)
        .unwrap_or(now + chrono::Duration::days(1))
}

/// What the jobs need to fire reminders
#[derive(Clone)]
pub struct ReminderContext {
    pub stores: Stores,
    pub event_bus: EventBus,
    pub mailer: Arc<dyn Mailer>,
    pub timezone: Tz,
    /// Calendar reminder recipient for events without participants
    pub default_recipient: Option<String>,
}

/// A reminder about to be delivered
pub(crate) struct ReminderDraft {
    pub reference_type: &'static str,
    pub reference_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: ReminderKind,
    pub due_date: DateTime<Utc>,
    pub emails: Vec<Result<Email, MailError>>,
}

pub(crate) enum Delivery {
    Fired { mail_failed: usize },
    Duplicate,
    Failed,
}

impl ReminderContext {
    /// Keys of reminders already fired on `today`
    pub(crate) async fn fired_keys(&self, today: NaiveDate) -> Result<HashSet<ReminderKey>> {
        let keys = self
            .stores
            .notifications
            .list()
            .await?
            .iter()
            .filter_map(|n| n.reminder_key(self.timezone))
            .filter(|key| key.day == today)
            .collect();
        Ok(keys)
    }

    /// Store, push and mail one reminder.
    pub(crate) async fn deliver(
        &self,
        draft: ReminderDraft,
        now: DateTime<Utc>,
        fired: &mut HashSet<ReminderKey>,
    ) -> Delivery {
        let key = ReminderKey {
            reference_id: draft.reference_id,
            kind: draft.kind.label().to_string(),
            day: local_day(now, self.timezone),
        };
        if fired.contains(&key) {
            tracing::debug!(
                reference_type = draft.reference_type,
                reference_id = %draft.reference_id,
                kind = draft.kind.label(),
                "reminder already fired today"
            );
            return Delivery::Duplicate;
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: draft.title.clone(),
            message: draft.message.clone(),
            kind: draft.kind.label().to_string(),
            reference_type: draft.reference_type.to_string(),
            reference_id: Some(draft.reference_id),
            reminder_date: Some(now),
            is_read: false,
        };

        let stored = match self.stores.notifications.create(notification).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    reference_type = draft.reference_type,
                    reference_id = %draft.reference_id,
                    error = %e,
                    "failed to store reminder notification"
                );
                return Delivery::Failed;
            }
        };
        fired.insert(key);

        let event = ReminderEvent {
            notification_id: stored.id,
            reference_type: draft.reference_type.to_string(),
            reference_id: draft.reference_id,
            title: draft.title,
            message: draft.message,
            reminder_type: draft.kind.label().to_string(),
            due_date: draft.due_date,
        };
        let live = match draft.kind {
            ReminderKind::Today => CrmEvent::CalendarReminder(event),
            _ => CrmEvent::InvoiceReminder(event),
        };
        self.event_bus.publish(live);
        if let Ok(doc) = stored.to_document() {
            self.event_bus.publish(CrmEvent::Notification(doc));
        }

        let mut mail_failed = 0;
        for email in draft.emails {
            let result = match email {
                Ok(email) => self.mailer.send(email).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                mail_failed += 1;
                tracing::warn!(
                    reference_type = draft.reference_type,
                    reference_id = %draft.reference_id,
                    error = %e,
                    "reminder email not sent"
                );
            }
        }

        Delivery::Fired { mail_failed }
    }
}

impl RunReport {
    pub(crate) fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Fired { mail_failed } => {
                self.fired += 1;
                self.mail_failed += mail_failed;
            }
            Delivery::Duplicate => self.skipped += 1,
            Delivery::Failed => self.failed += 1,
        }
    }
}

/// Owner of the two reminder jobs
#[derive(Clone)]
pub struct ReminderScheduler {
    context: Arc<ReminderContext>,
    calendar_interval: Duration,
    invoice_at: NaiveTime,
}

impl ReminderScheduler {
    pub fn new(context: ReminderContext, config: &SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            context: Arc::new(context),
            calendar_interval: Duration::from_secs(config.calendar_interval_secs.max(1)),
            invoice_at: config.invoice_time()?,
        })
    }

    /// Build from the stores, bus and mailer the server uses
    pub fn from_host(host: &ServerHost) -> Result<Self, ConfigError> {
        let context = ReminderContext {
            stores: host.stores.clone(),
            event_bus: host.event_bus.clone(),
            mailer: host.mailer.clone(),
            timezone: host.timezone,
            default_recipient: host.config.mail.default_recipient.clone(),
        };
        Self::new(context, &host.config.scheduler)
    }

    pub fn context(&self) -> &ReminderContext {
        &self.context
    }

    /// Run the calendar job once as of `now`
    pub async fn run_calendar_once(&self, now: DateTime<Utc>) -> Result<RunReport> {
        calendar::run(&self.context, now).await
    }

    /// Run the invoice job once as of `now`
    pub async fn run_invoice_once(&self, now: DateTime<Utc>) -> Result<RunReport> {
        invoice::run(&self.context, now).await
    }

    /// Spawn both jobs
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let calendar = {
            let scheduler = self.clone();
            let mut shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(scheduler.calendar_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match scheduler.run_calendar_once(Utc::now()).await {
                                Ok(report) if report.fired > 0 || report.failed > 0 => {
                                    tracing::info!(job = "calendar", ?report, "reminder run finished");
                                }
                                Ok(report) => tracing::debug!(job = "calendar", ?report, "reminder run finished"),
                                Err(e) => tracing::error!(job = "calendar", error = %e, "reminder run failed"),
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                tracing::debug!(job = "calendar", "reminder job stopped");
            })
        };

        let invoice = {
            let scheduler = self.clone();
            let mut shutdown = shutdown_rx;
            tokio::spawn(async move {
                loop {
                    let now = Utc::now();
                    let next = next_daily_run(now, scheduler.context.timezone, scheduler.invoice_at);
                    let wait = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                    tracing::debug!(job = "invoice", next_run = %next, "waiting for next run");

                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {
                            match scheduler.run_invoice_once(Utc::now()).await {
                                Ok(report) => tracing::info!(job = "invoice", ?report, "reminder run finished"),
                                Err(e) => tracing::error!(job = "invoice", error = %e, "reminder run failed"),
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                tracing::debug!(job = "invoice", "reminder job stopped");
            })
        };

        tracing::info!(
            timezone = %self.context.timezone,
            calendar_interval_secs = self.calendar_interval.as_secs(),
            invoice_run_at = %self.invoice_at,
            "reminder scheduler started"
        );

        SchedulerHandle {
            shutdown: shutdown_tx,
            tasks: vec![calendar, invoice],
        }
    }
}

/// Running jobs; dropping the handle leaves them running
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal both jobs and wait for them to stop. A run in progress finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "reminder job ended abnormally");
            }
        }
        tracing::info!("reminder scheduler stopped");
    }
}
