//! Queue operations for pgwq.
//!
//! This module defines the [`WorkQueue`] struct, which provides methods for
//! enqueuing, claiming, and removing work items in a PostgreSQL-backed queue.
//!
//! ## What
//!
//! - [`WorkQueue`] is the handle for one queue: adding items, claiming items
//!   for exclusive processing, removing them, and resetting claims.
//! - Every mutation exists in two forms: a standalone form that runs in its
//!   own transaction and commits on success, and a `*_in` form that joins a
//!   caller-supplied transaction and leaves commit/rollback to the caller.
//!
//! ## How
//!
//! Construct a [`WorkQueue`] with [`WorkQueue::connect`], then use its
//! methods to produce and consume items. Claiming relies on PostgreSQL's
//! `FOR UPDATE SKIP LOCKED`, so concurrent consumers never block each other
//! and never receive the same item.
//!
//! ### Example
//!
//! ```rust,no_run
//! # use pgwq::{BootstrapRegistry, Config, WorkQueue};
//! # async fn example() -> pgwq::Result<()> {
//! let config = Config::from_dsn("postgresql://localhost/db");
//! let registry = BootstrapRegistry::new();
//! let queue: WorkQueue<String> = WorkQueue::connect(&config, "emails", &registry).await?;
//! queue.enqueue(&"welcome".to_string()).await?;
//! # Ok(())
//! # }
//! ```
use crate::bootstrap::{self, BootstrapRegistry, QueueIdentity};
use crate::codec::{Codec, JsonCodec};
use crate::config::{validate_identifier, Config};
use crate::constants::{
    CLAIM_RECORD, COUNT_RECORDS, CREATE_QUEUE_TABLE, CREATE_STATUS_INDEX, DELETE_RECORD,
    INSERT_RECORD, RESET_ALL_STATUSES, RESET_STATUSES_AT, SELECT_RECORD_BY_ID, TABLE_PREFIX,
};
use crate::error::{Error, Result};
use crate::types::{QueueRecord, Status};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::marker::PhantomData;
use std::time::Duration;

/// Expand a SQL template with the schema and queue name.
///
/// Both identifiers are validated at construction; runtime values are always
/// bound as parameters, never spliced.
fn expand(template: &str, schema: &str, queue_name: &str) -> String {
    template
        .replace("{schema}", schema)
        .replace("{TABLE_PREFIX}", TABLE_PREFIX)
        .replace("{queue_name}", queue_name)
}

/// Reject payloads that carry no element.
pub(crate) fn validate_payload(raw: &str) -> Result<()> {
    if raw.trim().is_empty() || raw == "null" {
        return Err(Error::InvalidPayload {
            message: "cannot enqueue an empty element".to_string(),
        });
    }
    Ok(())
}

async fn create_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .connect(&config.dsn)
        .await
        .map_err(Error::from)
}

/// Producer and consumer handle for one queue.
///
/// A `WorkQueue` corresponds to one table in the database, named
/// `{schema}.wq_{queue_name}`. The element type `T` is mapped to the stored
/// text payload by the codec `C`.
pub struct WorkQueue<T, C = JsonCodec> {
    /// Connection pool for PostgreSQL
    pub pool: PgPool,
    /// Logical name of the queue
    pub queue_name: String,
    /// Table name in the database for this queue
    pub table_name: String,
    insert_sql: String,
    claim_sql: String,
    delete_sql: String,
    count_sql: String,
    reset_all_sql: String,
    reset_at_sql: String,
    select_by_id_sql: String,
    codec: C,
    _element: PhantomData<fn() -> T>,
}

impl<T> WorkQueue<T, JsonCodec>
where
    T: Serialize + DeserializeOwned,
{
    /// Connect to a queue with the default JSON codec, creating the backing
    /// table if this registry has not seen it yet.
    ///
    /// # Arguments
    /// * `config` - Database connection settings
    /// * `queue_name` - Logical queue name (forms the table name)
    /// * `registry` - Host-owned bootstrap memo shared across handles
    pub async fn connect(
        config: &Config,
        queue_name: &str,
        registry: &BootstrapRegistry,
    ) -> Result<Self> {
        Self::connect_with_codec(config, queue_name, registry, JsonCodec).await
    }

    /// Connect to a queue whose table is managed externally. No DDL is issued.
    pub async fn connect_existing(config: &Config, queue_name: &str) -> Result<Self> {
        config.validate()?;
        validate_identifier("queue_name", queue_name)?;
        let pool = create_pool(config).await?;
        Ok(Self::build(pool, &config.schema, queue_name, JsonCodec))
    }
}

impl<T, C> WorkQueue<T, C>
where
    C: Codec<T>,
{
    /// Connect to a queue with a custom codec, creating the backing table if
    /// this registry has not seen it yet.
    ///
    /// # Arguments
    /// * `config` - Database connection settings
    /// * `queue_name` - Logical queue name (forms the table name)
    /// * `registry` - Host-owned bootstrap memo shared across handles
    /// * `codec` - Payload codec for the element type
    pub async fn connect_with_codec(
        config: &Config,
        queue_name: &str,
        registry: &BootstrapRegistry,
        codec: C,
    ) -> Result<Self> {
        config.validate()?;
        validate_identifier("queue_name", queue_name)?;
        let pool = create_pool(config).await?;
        Self::with_pool(pool, config, queue_name, registry, codec).await
    }

    /// Build a queue handle on an existing pool, creating the backing table
    /// if this registry has not seen it yet.
    ///
    /// Useful when several queues share one pool. A DDL failure is fatal: no
    /// handle is produced.
    pub async fn with_pool(
        pool: PgPool,
        config: &Config,
        queue_name: &str,
        registry: &BootstrapRegistry,
        codec: C,
    ) -> Result<Self> {
        config.validate()?;
        validate_identifier("queue_name", queue_name)?;

        let identity = QueueIdentity::new(&config.dsn, &config.schema, queue_name);
        let statements = [
            expand(CREATE_QUEUE_TABLE, &config.schema, queue_name),
            expand(CREATE_STATUS_INDEX, &config.schema, queue_name),
        ];
        bootstrap::ensure_created(&pool, registry, identity, &statements).await?;

        Ok(Self::build(pool, &config.schema, queue_name, codec))
    }

    fn build(pool: PgPool, schema: &str, queue_name: &str, codec: C) -> Self {
        Self {
            pool,
            queue_name: queue_name.to_string(),
            table_name: format!("{}.{}_{}", schema, TABLE_PREFIX, queue_name),
            insert_sql: expand(INSERT_RECORD, schema, queue_name),
            claim_sql: expand(CLAIM_RECORD, schema, queue_name),
            delete_sql: expand(DELETE_RECORD, schema, queue_name),
            count_sql: expand(COUNT_RECORDS, schema, queue_name),
            reset_all_sql: expand(RESET_ALL_STATUSES, schema, queue_name),
            reset_at_sql: expand(RESET_STATUSES_AT, schema, queue_name),
            select_by_id_sql: expand(SELECT_RECORD_BY_ID, schema, queue_name),
            codec,
            _element: PhantomData,
        }
    }

    /// Add one item to the queue in its own transaction.
    ///
    /// The new record starts as [`Status::ToProcess`] with both timestamps
    /// set to the store's current time.
    ///
    /// # Arguments
    /// * `element` - Item to enqueue; rejected before any I/O if it encodes
    ///   to an empty payload
    pub async fn enqueue(&self, element: &T) -> Result<()> {
        let payload = self.encode_payload(element)?;
        let mut tx = self.pool.begin().await?;
        self.insert_payload(&payload, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Add one item to the queue inside a caller-supplied transaction.
    ///
    /// The insert is visible only inside the transaction until the caller
    /// commits; on rollback the item is never persisted.
    pub async fn enqueue_in(
        &self,
        element: &T,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        let payload = self.encode_payload(element)?;
        self.insert_payload(&payload, tx).await
    }

    fn encode_payload(&self, element: &T) -> Result<String> {
        let payload = self.codec.encode(element)?;
        validate_payload(&payload)?;
        Ok(payload)
    }

    async fn insert_payload(
        &self,
        payload: &str,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        sqlx::query(&self.insert_sql)
            .bind(Status::ToProcess)
            .bind(payload)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Claim one item for exclusive processing.
    ///
    /// Atomically selects one [`Status::ToProcess`] record, marks it
    /// [`Status::Processing`] and returns its id and decoded element. Rows
    /// locked by other in-flight claimants are skipped, so concurrent
    /// consumers each land on a different record. Selection among eligible
    /// rows is unordered; no delivery order is guaranteed.
    ///
    /// The claim commits before decoding: if the codec cannot parse the
    /// stored payload the error propagates while the record stays
    /// [`Status::Processing`]. Recovery from an orphaned claim is
    /// [`WorkQueue::reset_all_statuses`].
    ///
    /// # Returns
    /// The claimed record's id and element, or `None` if no eligible record
    /// exists (no side effect in that case).
    pub async fn peek(&self) -> Result<Option<(i64, T)>> {
        let mut tx = self.pool.begin().await?;
        let claimed = self.claim_in(&mut tx).await?;
        tx.commit().await?;
        self.decode_claimed(claimed)
    }

    /// Claim one item inside a caller-supplied transaction.
    ///
    /// The [`Status::Processing`] mark is visible only inside the transaction
    /// until commit; on rollback the record reverts to
    /// [`Status::ToProcess`] and becomes claimable again.
    pub async fn peek_in(&self, tx: &mut Transaction<'_, Postgres>) -> Result<Option<(i64, T)>> {
        let claimed = self.claim_in(tx).await?;
        self.decode_claimed(claimed)
    }

    async fn claim_in(&self, tx: &mut Transaction<'_, Postgres>) -> Result<Option<(i64, String)>> {
        let row = sqlx::query_as::<_, (i64, String)>(&self.claim_sql)
            .bind(Status::Processing)
            .bind(Status::ToProcess)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    fn decode_claimed(&self, claimed: Option<(i64, String)>) -> Result<Option<(i64, T)>> {
        match claimed {
            Some((id, raw)) => Ok(Some((id, self.codec.decode(&raw)?))),
            None => Ok(None),
        }
    }

    /// Remove a record from the queue in its own transaction.
    ///
    /// Idempotent: deleting an id that does not exist is a no-op, not an
    /// error.
    pub async fn dequeue(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.dequeue_in(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Remove a record inside a caller-supplied transaction.
    ///
    /// On rollback the deleted record is restored.
    pub async fn dequeue_in(&self, id: i64, tx: &mut Transaction<'_, Postgres>) -> Result<()> {
        sqlx::query(&self.delete_sql)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Count all records regardless of status.
    ///
    /// Read directly from the pool under the default read-committed snapshot:
    /// the value is approximate, tolerates claims and deletes still in
    /// flight, and never blocks behind them. It is not transactionally exact.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&self.count_sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Reset record statuses to [`Status::ToProcess`].
    ///
    /// With `None`, every record is reset unconditionally. With `Some(ts)`,
    /// only records whose `last_operation_at` is exactly equal to `ts` are
    /// reset; a record merely older than `ts` does not match. Matched records
    /// get a fresh `last_operation_at`.
    pub async fn reset_all_statuses(&self, from: Option<DateTime<Utc>>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        match from {
            None => {
                tracing::debug!("Resetting all statuses on {}", self.table_name);
                sqlx::query(&self.reset_all_sql)
                    .bind(Status::ToProcess)
                    .execute(&mut *tx)
                    .await?;
            }
            Some(ts) => {
                tracing::debug!("Resetting statuses at {} on {}", ts, self.table_name);
                sqlx::query(&self.reset_at_sql)
                    .bind(Status::ToProcess)
                    .bind(ts)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Retrieve a record by its id, payload left in stored form.
    ///
    /// # Returns
    /// The record if present, `None` otherwise.
    pub async fn record(&self, id: i64) -> Result<Option<QueueRecord>> {
        let record = sqlx::query_as::<_, QueueRecord>(&self.select_by_id_sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}
