//! Invoice job: remind customers about unpaid invoices close to their due date

use super::{ReminderContext, ReminderDraft, ReminderKind, RunReport, local_day};
use crate::entities::InvoiceStatus;
use crate::mail::templates;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

/// Reminder label for a due day seen from `today`, if any applies.
pub fn reminder_label(due: NaiveDate, today: NaiveDate) -> Option<ReminderKind> {
    match (due - today).num_days() {
        3 => Some(ReminderKind::ThreeDaysBefore),
        1 => Some(ReminderKind::OneDayBefore),
        0 => Some(ReminderKind::OnDueDate),
        _ => None,
    }
}

pub(crate) async fn run(ctx: &ReminderContext, now: DateTime<Utc>) -> Result<RunReport> {
    let today = local_day(now, ctx.timezone);
    let invoices = ctx.stores.invoices.list().await?;
    let mut fired = ctx.fired_keys(today).await?;
    let mut report = RunReport::default();

    for invoice in invoices.into_iter().filter(|i| i.status == InvoiceStatus::Unpaid) {
        report.scanned += 1;
        let Some(end_date) = invoice.end_date else {
            report.skipped += 1;
            continue;
        };
        let due = end_date.local_day(ctx.timezone);
        let Some(kind) = reminder_label(due, today) else {
            continue;
        };

        let who = if invoice.customer_name.trim().is_empty() {
            invoice.company_name.clone()
        } else {
            invoice.customer_name.clone()
        };
        let draft = ReminderDraft {
            reference_type: "invoice",
            reference_id: invoice.id,
            title: "Invoice Reminder".to_string(),
            message: format!(
                "Invoice for {} ({}) is due on {}: {} remaining",
                who,
                invoice.product_name,
                due.format("%d %b %Y"),
                invoice.remaining_amount
            ),
            kind,
            due_date: end_date.instant(ctx.timezone),
            emails: vec![templates::invoice_reminder(&invoice, kind.label(), due)],
        };
        report.record(ctx.deliver(draft, now, &mut fired).await);
    }

    Ok(report)
}
