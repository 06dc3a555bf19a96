//! CRM record types

pub mod macros;

pub mod account;
pub mod complaint;
pub mod contact;
pub mod invoice;
pub mod lead;
pub mod notification;
pub mod owner;
pub mod scheduled_event;
pub mod task;
pub mod user;

pub use account::Account;
pub use complaint::Complaint;
pub use contact::Contact;
pub use invoice::{Invoice, InvoiceStatus, InvoiceTotals};
pub use lead::{Deal, Lead};
pub use notification::{Notification, ReminderKey};
pub use owner::Owner;
pub use scheduled_event::ScheduledEvent;
pub use task::Task;
pub use user::{User, UserView};
