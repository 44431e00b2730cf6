//! Notification fan-out
//!
//! Notifications are written inside the caller's transaction so they
//! commit or roll back with the change that caused them. Once the caller
//! has committed, [`Notifier::publish`] pushes them to SSE subscribers and
//! queues e-mail; neither step can fail the committed change.

use chrono::{DateTime, NaiveDate, Utc};
use classhub_common::db::NotificationType;
use classhub_common::events::{ClassHubEvent, EventBus};
use classhub_common::time::format_long_date;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{debug, warn};

use super::mailer::{Mailer, OutgoingMail};
use crate::db::{self, notifications::CreatedNotification};

/// Writes notifications and delivers them after commit
#[derive(Clone)]
pub struct Notifier {
    db: SqlitePool,
    events: EventBus,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(db: SqlitePool, events: EventBus, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, events, mailer }
    }

    /// Create one notification addressed to `recipients` inside `tx`
    pub async fn notify_tx(
        tx: &mut Transaction<'_, Sqlite>,
        kind: NotificationType,
        message: &str,
        recipients: &[String],
    ) -> Result<CreatedNotification, sqlx::Error> {
        db::notifications::insert_notification_tx(tx, kind, message, recipients).await
    }

    /// Broadcast committed notifications and queue their e-mail
    pub fn publish(&self, created: &[CreatedNotification]) {
        if created.is_empty() {
            return;
        }

        for notification in created {
            self.events.emit_lossy(ClassHubEvent::NotificationCreated {
                notification_id: notification.id.clone(),
                kind: notification.kind,
                message: notification.message.clone(),
                recipients: notification.recipients.clone(),
                timestamp: notification.created_at,
            });
        }

        let db = self.db.clone();
        let mailer = Arc::clone(&self.mailer);
        let created = created.to_vec();
        tokio::spawn(async move {
            deliver_mail(&db, mailer.as_ref(), &created).await;
        });
    }
}

async fn deliver_mail(db: &SqlitePool, mailer: &dyn Mailer, created: &[CreatedNotification]) {
    for notification in created {
        let addresses = match db::users::emails_for(db, &notification.recipients).await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(notification_id = %notification.id, "Could not look up mail recipients: {}", e);
                continue;
            }
        };

        for (user_id, email) in addresses {
            let mail = OutgoingMail {
                to: email,
                subject: mail_subject(notification.kind),
                body: notification.message.clone(),
            };
            match mailer.send(&mail).await {
                Ok(()) => debug!(
                    notification_id = %notification.id,
                    user_id = %user_id,
                    mailer = mailer.name(),
                    "Notification mail sent"
                ),
                Err(e) => warn!(
                    notification_id = %notification.id,
                    user_id = %user_id,
                    mailer = mailer.name(),
                    "Notification mail failed: {}",
                    e
                ),
            }
        }
    }
}

fn mail_subject(kind: NotificationType) -> String {
    let topic = match kind {
        NotificationType::Assignment => "Assignment update",
        NotificationType::Attendance => "Attendance update",
        NotificationType::Membership => "Classroom membership",
        NotificationType::Resource => "New resource",
    };
    format!("ClassHub: {}", topic)
}

/// "present"/"absent" wording used in attendance messages
pub fn presence_word(is_present: bool) -> &'static str {
    if is_present {
        "present"
    } else {
        "absent"
    }
}

pub fn attendance_message(course_name: &str, date: NaiveDate, is_present: bool) -> String {
    format!(
        "Your attendance for {} on {} has been marked as {}.",
        course_name,
        format_long_date(date),
        presence_word(is_present)
    )
}

pub fn assignment_posted_message(title: &str, course_name: &str, deadline: DateTime<Utc>) -> String {
    format!(
        "New assignment \"{}\" has been posted in {}. Due {}.",
        title,
        course_name,
        format_long_date(deadline.date_naive())
    )
}

pub fn graded_message(title: &str, course_name: &str, marks: f64, max_marks: f64) -> String {
    format!(
        "Your submission for \"{}\" in {} has been graded: {}/{}.",
        title, course_name, marks, max_marks
    )
}

pub fn resource_shared_message(title: &str, course_name: &str) -> String {
    format!("New resource \"{}\" has been shared in {}.", title, course_name)
}

pub fn member_joined_message(student_name: &str, course_name: &str) -> String {
    format!("{} has joined {}.", student_name, course_name)
}
