//! SQL constants for pgwq.
//!
//! This module contains all SQL statement templates and schema constants used
//! throughout the crate.
//!
//! ## What
//!
//! - Table naming convention for queue tables
//! - SQL statement templates for queue operations
//!
//! ## How
//!
//! These constants are used internally by the bootstrap and queue modules to
//! generate statements with proper schema and table names. Placeholders
//! (`{schema}`, `{queue_name}`) are expanded once at handle construction;
//! runtime values are always bound as parameters.

/// Prefix for queue table names in the database
pub const TABLE_PREFIX: &str = "wq";

/// Default schema for queue tables
pub const DEFAULT_SCHEMA: &str = "public";

pub const CREATE_QUEUE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS {schema}.{TABLE_PREFIX}_{queue_name} (
        id BIGINT PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
        enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        status SMALLINT NOT NULL DEFAULT 0,
        last_operation_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        data TEXT NOT NULL
    );
"#;

pub const CREATE_STATUS_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_{TABLE_PREFIX}_{queue_name}_status
    ON {schema}.{TABLE_PREFIX}_{queue_name} (status);
"#;

pub const INSERT_RECORD: &str = r#"
    INSERT INTO {schema}.{TABLE_PREFIX}_{queue_name} (enqueued_at, status, last_operation_at, data)
    VALUES (now(), $1, now(), $2);
"#;

/// Claim statement: select one unclaimed row and mark it in a single atomic
/// statement. `SKIP LOCKED` makes concurrent claimants land on different
/// rows instead of queuing behind one row lock. The subquery has no ORDER BY:
/// selection among eligible rows is unordered, only exclusivity is guaranteed.
pub const CLAIM_RECORD: &str = r#"
    UPDATE {schema}.{TABLE_PREFIX}_{queue_name} AS t
    SET status = $1, last_operation_at = now()
    FROM (
        SELECT id
        FROM {schema}.{TABLE_PREFIX}_{queue_name}
        WHERE status = $2
        LIMIT 1
        FOR UPDATE SKIP LOCKED
    ) AS claimed
    WHERE t.id = claimed.id
    RETURNING t.id, t.data;
"#;

pub const DELETE_RECORD: &str = r#"
    DELETE FROM {schema}.{TABLE_PREFIX}_{queue_name}
    WHERE id = $1;
"#;

pub const COUNT_RECORDS: &str = r#"
    SELECT COUNT(*)
    FROM {schema}.{TABLE_PREFIX}_{queue_name};
"#;

pub const RESET_ALL_STATUSES: &str = r#"
    UPDATE {schema}.{TABLE_PREFIX}_{queue_name}
    SET status = $1, last_operation_at = now();
"#;

/// Matches rows whose last operation time is exactly equal to the bound
/// timestamp, not older than it.
pub const RESET_STATUSES_AT: &str = r#"
    UPDATE {schema}.{TABLE_PREFIX}_{queue_name}
    SET status = $1, last_operation_at = now()
    WHERE last_operation_at = $2;
"#;

pub const SELECT_RECORD_BY_ID: &str = r#"
    SELECT id, enqueued_at, status, last_operation_at, data
    FROM {schema}.{TABLE_PREFIX}_{queue_name}
    WHERE id = $1;
"#;
