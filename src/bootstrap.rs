//! Schema bootstrap and per-process memoization.
//!
//! ## What
//!
//! - [`QueueIdentity`] names one physical queue table: (DSN, schema, queue
//!   name).
//! - [`BootstrapRegistry`] remembers which identities have already had their
//!   table created during this process's lifetime, so repeated handle
//!   construction does not re-issue DDL.
//!
//! ## How
//!
//! The hosting application owns one registry and passes it to every
//! [`crate::WorkQueue`] constructor. Cloning the registry is cheap and all
//! clones share the same memo.
//!
//! Cross-process creation races are left to PostgreSQL: the DDL is
//! `CREATE ... IF NOT EXISTS`, so whichever process wins, the others observe
//! the existing table. The registry is never invalidated; if the table is
//! dropped externally, a handle constructed from a stale memo entry fails at
//! its first operation.

use crate::error::Result;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Identity of one physical queue table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueIdentity {
    /// PostgreSQL connection string
    pub dsn: String,
    /// Schema holding the table
    pub schema: String,
    /// Logical queue name
    pub queue_name: String,
}

impl QueueIdentity {
    pub fn new(dsn: &str, schema: &str, queue_name: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            schema: schema.to_string(),
            queue_name: queue_name.to_string(),
        }
    }
}

/// Host-owned memo of bootstrapped queue identities.
///
/// Entries live for the lifetime of the registry and are never invalidated.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRegistry {
    inner: Arc<Mutex<HashSet<QueueIdentity>>>,
}

impl BootstrapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table for this identity has already been created through
    /// this registry.
    pub fn is_ready(&self, identity: &QueueIdentity) -> bool {
        self.lock().contains(identity)
    }

    pub(crate) fn mark_ready(&self, identity: QueueIdentity) {
        self.lock().insert(identity);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<QueueIdentity>> {
        self.inner.lock().expect("bootstrap registry lock poisoned")
    }
}

/// Ensure the backing table for `identity` exists, consulting the registry
/// first.
///
/// The registry lock is taken for the lookup, released across the DDL await,
/// and re-taken to record completion; the DDL itself is idempotent, so two
/// handles racing past the lookup both succeed. Any DDL failure propagates
/// and the identity is not marked.
pub(crate) async fn ensure_created(
    pool: &PgPool,
    registry: &BootstrapRegistry,
    identity: QueueIdentity,
    statements: &[String],
) -> Result<()> {
    if registry.is_ready(&identity) {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for statement in statements {
        tracing::debug!("Executing bootstrap statement: {}", statement);
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    registry.mark_ready(identity);
    Ok(())
}
