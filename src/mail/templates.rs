//! Email bodies rendered with Tera

use super::{Email, MailError};
use crate::entities::{Invoice, ScheduledEvent};
use chrono::NaiveDate;
use tera::{Context, Tera};

const INVOICE_REMINDER_TEXT: &str = "\
Dear {{ customer_name | default(value=\"Customer\") }},

This is a reminder ({{ reminder_type }}) that invoice for {{ product_name }} \
from {{ company_name }} is due on {{ due_date }}.

Total: {{ total_with_gst }}
Paid: {{ paid_amount }}
Remaining: {{ remaining_amount }}
";

const INVOICE_REMINDER_HTML: &str = "\
<p>Dear {{ customer_name | default(value=\"Customer\") }},</p>
<p>This is a reminder (<strong>{{ reminder_type }}</strong>) that the invoice for \
{{ product_name }} from {{ company_name }} is due on <strong>{{ due_date }}</strong>.</p>
<table>
  <tr><td>Total</td><td>{{ total_with_gst }}</td></tr>
  <tr><td>Paid</td><td>{{ paid_amount }}</td></tr>
  <tr><td>Remaining</td><td>{{ remaining_amount }}</td></tr>
</table>
";

const CALENDAR_REMINDER_TEXT: &str = "\
Reminder: {{ title }} is scheduled for today ({{ date }}).
{% if location %}Location: {{ location }}
{% endif %}{% if description %}
{{ description }}
{% endif %}";

const CALENDAR_REMINDER_HTML: &str = "\
<p>Reminder: <strong>{{ title }}</strong> is scheduled for today ({{ date }}).</p>
{% if location %}<p>Location: {{ location }}</p>{% endif %}
{% if description %}<p>{{ description }}</p>{% endif %}
";

const PASSWORD_RESET_TEXT: &str = "\
Hello {{ name }},

Use the link below to reset your password. It expires in {{ ttl_minutes }} minutes.

{{ link }}
";

const PASSWORD_RESET_HTML: &str = "\
<p>Hello {{ name }},</p>
<p>Use the link below to reset your password. It expires in {{ ttl_minutes }} minutes.</p>
<p><a href=\"{{ link | safe }}\">Reset password</a></p>
";

const VERIFICATION_TEXT: &str = "\
Hello {{ name }},

Confirm your email address by opening:

{{ link }}
";

const VERIFICATION_HTML: &str = "\
<p>Hello {{ name }},</p>
<p><a href=\"{{ link | safe }}\">Confirm your email address</a></p>
";

fn render(name: &str, template: &str, context: &Context, autoescape: bool) -> Result<String, MailError> {
    Tera::one_off(template, context, autoescape).map_err(|e| MailError::Template {
        template: name.to_string(),
        message: e.to_string(),
    })
}

fn build(
    name: &str,
    to: &str,
    subject: String,
    text: &str,
    html: &str,
    context: &Context,
) -> Result<Email, MailError> {
    if to.trim().is_empty() {
        return Err(MailError::MissingRecipient);
    }
    Ok(Email {
        to: to.trim().to_string(),
        subject,
        text: render(name, text, context, false)?,
        html: render(name, html, context, true)?,
    })
}

pub fn invoice_reminder(
    invoice: &Invoice,
    reminder_type: &str,
    due_date: NaiveDate,
) -> Result<Email, MailError> {
    let mut context = Context::new();
    // blank names are left undefined so the template falls back to "Customer"
    let customer_name = invoice.customer_name.trim();
    if !customer_name.is_empty() {
        context.insert("customer_name", customer_name);
    }
    context.insert("company_name", &invoice.company_name);
    context.insert("product_name", &invoice.product_name);
    context.insert("reminder_type", reminder_type);
    context.insert("due_date", &due_date.format("%d %b %Y").to_string());
    context.insert("total_with_gst", &invoice.total_with_gst);
    context.insert("paid_amount", &invoice.paid_amount);
    context.insert("remaining_amount", &invoice.remaining_amount);

    build(
        "invoice_reminder",
        &invoice.email_address,
        format!("Invoice reminder: {}", reminder_type),
        INVOICE_REMINDER_TEXT,
        INVOICE_REMINDER_HTML,
        &context,
    )
}

pub fn calendar_reminder(
    to: &str,
    event: &ScheduledEvent,
    date: NaiveDate,
) -> Result<Email, MailError> {
    let mut context = Context::new();
    context.insert("title", &event.title);
    context.insert("description", &event.description);
    context.insert("location", &event.location);
    context.insert("date", &date.format("%d %b %Y").to_string());

    build(
        "calendar_reminder",
        to,
        format!("Today: {}", event.title),
        CALENDAR_REMINDER_TEXT,
        CALENDAR_REMINDER_HTML,
        &context,
    )
}

pub fn password_reset(to: &str, name: &str, link: &str, ttl_minutes: i64) -> Result<Email, MailError> {
    let mut context = Context::new();
    context.insert("name", name);
    context.insert("link", link);
    context.insert("ttl_minutes", &ttl_minutes);

    build(
        "password_reset",
        to,
        "Reset your password".to_string(),
        PASSWORD_RESET_TEXT,
        PASSWORD_RESET_HTML,
        &context,
    )
}

pub fn verification(to: &str, name: &str, link: &str) -> Result<Email, MailError> {
    let mut context = Context::new();
    context.insert("name", name);
    context.insert("link", link);

    build(
        "verification",
        to,
        "Verify your email address".to_string(),
        VERIFICATION_TEXT,
        VERIFICATION_HTML,
        &context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Record;
    use serde_json::json;

    #[test]
    fn test_invoice_reminder_body() {
        let invoice = Invoice::from_payload(json!({
            "customerName": "Meera",
            "companyName": "Acme & Sons",
            "productName": "Widgets",
            "emailAddress": "meera@example.com",
            "amount": 1000,
            "discount": 10,
            "gstRate": 18,
            "paidAmount": 500
        }))
        .unwrap();

        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let email = invoice_reminder(&invoice, "1 Day Before", due).unwrap();

        assert_eq!(email.to, "meera@example.com");
        assert!(email.text.starts_with("Dear Meera,"));
        assert_eq!(email.subject, "Invoice reminder: 1 Day Before");
        assert!(email.text.contains("Acme & Sons"));
        assert!(email.text.contains("10 Apr 2025"));
        assert!(email.text.contains("562"));
        assert!(email.html.contains("Acme &amp; Sons"));
    }

    #[test]
    fn test_blank_customer_name_greets_customer() {
        let invoice = Invoice::from_payload(json!({
            "customerName": "  ",
            "emailAddress": "billing@example.com"
        }))
        .unwrap();
        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let email = invoice_reminder(&invoice, "On Due Date", due).unwrap();

        assert!(email.text.starts_with("Dear Customer,"));
        assert!(email.html.contains("<p>Dear Customer,</p>"));
        assert!(!email.text.contains("Dear ,"));
    }

    #[test]
    fn test_invoice_without_email_is_missing_recipient() {
        let invoice = Invoice::default();
        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let err = invoice_reminder(&invoice, "On Due Date", due).unwrap_err();
        assert!(matches!(err, MailError::MissingRecipient));
    }

    #[test]
    fn test_calendar_reminder_skips_empty_location() {
        let event = ScheduledEvent {
            title: "Quarterly review".to_string(),
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let email = calendar_reminder("ops@example.com", &event, date).unwrap();
        assert!(email.text.contains("Quarterly review"));
        assert!(!email.text.contains("Location"));
    }

    #[test]
    fn test_password_reset_contains_link() {
        let email = password_reset(
            "u@example.com",
            "Ravi",
            "http://localhost:3000/reset-password/abc",
            60,
        )
        .unwrap();
        assert!(email.text.contains("/reset-password/abc"));
        assert!(email.html.contains("href=\"http://localhost:3000/reset-password/abc\""));
    }
}
