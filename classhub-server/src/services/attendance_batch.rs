//! Batch attendance writer
//!
//! Persists one day's presence decisions for a classroom in bounded
//! chunks. Each chunk is its own transaction holding the attendance
//! upserts and one ATTENDANCE notification per student. A failing chunk
//! rolls back alone: earlier chunks stay committed and later chunks are
//! not attempted.

use chrono::NaiveDate;
use classhub_common::db::{
    get_setting, Attendance, Classroom, NotificationType, DEFAULT_ATTENDANCE_CHUNK_SIZE,
    DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS,
};
use classhub_common::time::{millis_to_duration, parse_calendar_date};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::notifier::{attendance_message, Notifier};
use crate::db::{self, attendance::upsert_attendance_tx};
use crate::db::notifications::CreatedNotification;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn is_present(self) -> bool {
        self == AttendanceStatus::Present
    }
}

/// One student's decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    pub user_id: String,
    pub status: AttendanceStatus,
}

/// Request body; both fields are optional here so that a missing field is
/// reported as a validation error rather than a deserialization failure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchAttendanceRequest {
    pub date: Option<String>,
    pub updates: Option<Vec<AttendanceUpdate>>,
}

/// What one committed chunk wrote
#[derive(Debug, Clone, Serialize)]
pub struct ChunkResult {
    /// 1-based chunk number
    pub chunk: usize,
    pub attendance: Vec<Attendance>,
    pub notifications: Vec<CreatedNotification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<ChunkResult>,
}

/// Why a batch did not complete
#[derive(Debug)]
pub enum BatchError {
    /// Rejected before any write
    Invalid(String),
    /// Chunk `failed_chunk` failed; `committed` holds the chunks before it
    ChunkFailed {
        committed: Vec<ChunkResult>,
        failed_chunk: usize,
        total_chunks: usize,
        reason: String,
    },
    /// Settings could not be read
    Setup(classhub_common::Error),
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Invalid(msg) => ApiError::BadRequest(msg),
            BatchError::ChunkFailed {
                committed,
                failed_chunk,
                total_chunks,
                reason,
            } => ApiError::PartialFailure {
                committed_chunks: committed.len(),
                total_chunks,
                message: format!("Attendance chunk {} failed: {}", failed_chunk, reason),
            },
            BatchError::Setup(e) => ApiError::Common(e),
        }
    }
}

/// Validated input ready to write
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    pub date: NaiveDate,
    pub updates: Vec<AttendanceUpdate>,
}

/// Check the request without touching the store.
///
/// The date is normalized to a calendar day; any time of day is dropped.
pub fn validate(request: BatchAttendanceRequest) -> Result<ValidatedBatch, BatchError> {
    let raw_date = request
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| BatchError::Invalid("Missing date".to_string()))?;
    let date = parse_calendar_date(&raw_date).map_err(|e| BatchError::Invalid(e.to_string()))?;

    let updates = request
        .updates
        .filter(|u| !u.is_empty())
        .ok_or_else(|| BatchError::Invalid("Missing or empty updates".to_string()))?;

    if let Some(pos) = updates.iter().position(|u| u.user_id.trim().is_empty()) {
        return Err(BatchError::Invalid(format!(
            "Update {} has an empty userId",
            pos + 1
        )));
    }

    Ok(ValidatedBatch { date, updates })
}

/// Every update must name a member of the classroom
pub fn check_members(batch: &ValidatedBatch, members: &HashSet<String>) -> Result<(), BatchError> {
    let mut outsiders: Vec<&str> = batch
        .updates
        .iter()
        .map(|u| u.user_id.as_str())
        .filter(|id| !members.contains(*id))
        .collect();
    if outsiders.is_empty() {
        return Ok(());
    }

    outsiders.sort_unstable();
    outsiders.dedup();
    Err(BatchError::Invalid(format!(
        "Not members of this classroom: {}",
        outsiders.join(", ")
    )))
}

/// Chunked attendance writer
pub struct BatchAttendanceWriter {
    db: SqlitePool,
    notifier: Notifier,
    chunk_size: usize,
    chunk_timeout: Duration,
}

impl BatchAttendanceWriter {
    pub fn new(db: SqlitePool, notifier: Notifier, chunk_size: usize, chunk_timeout: Duration) -> Self {
        Self {
            db,
            notifier,
            chunk_size: chunk_size.max(1),
            chunk_timeout,
        }
    }

    /// Build a writer using the chunk size and timeout from `settings`
    pub async fn from_settings(db: SqlitePool, notifier: Notifier) -> Result<Self, BatchError> {
        let chunk_size: usize =
            get_setting(&db, "attendance_chunk_size", DEFAULT_ATTENDANCE_CHUNK_SIZE)
                .await
                .map_err(BatchError::Setup)?;
        let timeout_ms: u64 = get_setting(
            &db,
            "attendance_chunk_timeout_ms",
            DEFAULT_ATTENDANCE_CHUNK_TIMEOUT_MS,
        )
        .await
        .map_err(BatchError::Setup)?;

        if chunk_size == 0 {
            warn!("attendance_chunk_size is 0, using {}", DEFAULT_ATTENDANCE_CHUNK_SIZE);
        }
        let chunk_size = if chunk_size == 0 {
            DEFAULT_ATTENDANCE_CHUNK_SIZE
        } else {
            chunk_size
        };

        Ok(Self::new(db, notifier, chunk_size, millis_to_duration(timeout_ms)))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Write every chunk in order, stopping at the first failure.
    ///
    /// Updates naming non-members are rejected before the first chunk.
    /// Notifications of each chunk are published as soon as that chunk
    /// commits, so a later failure does not hide them.
    pub async fn write(
        &self,
        classroom: &Classroom,
        batch: &ValidatedBatch,
    ) -> Result<BatchOutcome, BatchError> {
        let members: HashSet<String> = db::classrooms::member_ids(&self.db, &classroom.id)
            .await
            .map_err(BatchError::Setup)?
            .into_iter()
            .collect();
        check_members(batch, &members)?;

        let total_chunks = batch.updates.len().div_ceil(self.chunk_size);
        info!(
            classroom_id = %classroom.id,
            date = %batch.date,
            updates = batch.updates.len(),
            chunks = total_chunks,
            "Writing attendance batch"
        );

        let mut results = Vec::with_capacity(total_chunks);

        for (index, chunk) in batch.updates.chunks(self.chunk_size).enumerate() {
            let chunk_no = index + 1;
            let attempt = tokio::time::timeout(
                self.chunk_timeout,
                self.write_chunk(classroom, batch.date, chunk),
            )
            .await;

            let reason = match attempt {
                Ok(Ok((attendance, notifications))) => {
                    debug!(
                        classroom_id = %classroom.id,
                        chunk = chunk_no,
                        rows = attendance.len(),
                        "Attendance chunk committed"
                    );
                    self.notifier.publish(&notifications);
                    results.push(ChunkResult {
                        chunk: chunk_no,
                        attendance,
                        notifications,
                    });
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!(
                    "timed out after {} ms",
                    self.chunk_timeout.as_millis()
                ),
            };

            error!(
                classroom_id = %classroom.id,
                chunk = chunk_no,
                total_chunks,
                committed_chunks = results.len(),
                "Attendance chunk failed: {}",
                reason
            );
            return Err(BatchError::ChunkFailed {
                committed: results,
                failed_chunk: chunk_no,
                total_chunks,
                reason,
            });
        }

        info!(
            classroom_id = %classroom.id,
            chunks = results.len(),
            "Attendance batch complete"
        );
        Ok(BatchOutcome { results })
    }

    /// One chunk in one transaction. Dropping the future (timeout) drops the
    /// transaction, which rolls it back.
    async fn write_chunk(
        &self,
        classroom: &Classroom,
        date: NaiveDate,
        chunk: &[AttendanceUpdate],
    ) -> Result<(Vec<Attendance>, Vec<CreatedNotification>), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let mut attendance = Vec::with_capacity(chunk.len());
        for update in chunk {
            let row = upsert_attendance_tx(
                &mut tx,
                &update.user_id,
                &classroom.id,
                date,
                update.status.is_present(),
            )
            .await?;
            attendance.push(row);
        }

        let mut notifications = Vec::with_capacity(chunk.len());
        for update in chunk {
            let message =
                attendance_message(&classroom.course_name, date, update.status.is_present());
            let created = Notifier::notify_tx(
                &mut tx,
                NotificationType::Attendance,
                &message,
                std::slice::from_ref(&update.user_id),
            )
            .await?;
            notifications.push(created);
        }

        tx.commit().await?;
        Ok((attendance, notifications))
    }
}
