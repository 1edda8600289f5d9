//! Core types for pgwq: record status and the persisted queue record.
//!
//! ## What
//!
//! - [`Status`] is the processing state of a queue record.
//! - [`QueueRecord`] is one persisted row of a queue table, with the payload
//!   kept in its stored text form.
//!
//! ## How
//!
//! [`QueueRecord`] is returned by [`crate::WorkQueue::record`] for inspection;
//! decoding `data` into the element type is the codec's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing state of a queue record.
///
/// Stored as `SMALLINT`. Transitions are ToProcess → Processing (claim) and
/// Processing/ToProcess → ToProcess (reset); there is no automatic reverse
/// transition, a stuck claim requires an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum Status {
    /// Waiting to be claimed by a consumer
    ToProcess = 0,
    /// Claimed by a consumer, awaiting dequeue or reset
    Processing = 1,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::ToProcess => write!(f, "to_process"),
            Status::Processing => write!(f, "processing"),
        }
    }
}

/// One row of a queue table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueueRecord {
    /// Store-assigned identity, unique within the table, never reused
    pub id: i64,
    /// Timestamp set at insertion, never modified afterward
    pub enqueued_at: DateTime<Utc>,
    /// Current processing state
    pub status: Status,
    /// Timestamp of the last status change
    pub last_operation_at: DateTime<Utc>,
    /// Codec-encoded payload, opaque to the queue
    pub data: String,
}

impl fmt::Display for QueueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueRecord {{ id: {}, enqueued_at: {}, status: {}, last_operation_at: {}, data: {} }}",
            self.id, self.enqueued_at, self.status, self.last_operation_at, self.data
        )
    }
}
