//! Services behind the HTTP handlers

pub mod attendance_batch;
pub mod mailer;
pub mod notifier;

pub use attendance_batch::{BatchAttendanceWriter, BatchError};
pub use mailer::{LogMailer, Mailer, WebhookMailer};
pub use notifier::Notifier;
