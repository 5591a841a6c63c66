//! Versioned SQLite schema.
//!
//! `MIGRATIONS[i]` moves the schema from version `i` to `i + 1`. Applied
//! versions are recorded in `schema_migrations`, and pending ones run in a
//! single transaction on open.

use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::{Result, StoreError};

/// Schema steps in order.
const MIGRATIONS: &[&str] = &[V1_INITIAL];

/// Version a fully migrated database reports.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring `conn` up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
    )?;

    let applied: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema version {} is newer than this build supports ({})",
            applied, CURRENT_VERSION
        )));
    }

    let pending = &MIGRATIONS[applied as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (offset, sql) in pending.iter().enumerate() {
        let version = applied + offset as u32 + 1;
        debug!(version, "applying schema migration");

        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, now_millis()],
        )?;
    }
    tx.commit()?;

    Ok(())
}

const V1_INITIAL: &str = r#"
    -- Signatures: one row per (document, user) acknowledgment
    CREATE TABLE signatures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
        doc_id TEXT NOT NULL,
        user_sub TEXT NOT NULL,
        user_email TEXT NOT NULL,
        user_name TEXT NOT NULL,
        signed_at INTEGER NOT NULL,            -- Unix ms
        doc_checksum TEXT,                     -- checksum bound into the signature
        payload_hash BLOB NOT NULL,            -- 32 bytes, SHA-256 of signed message
        signature BLOB NOT NULL,               -- 64 bytes, Ed25519
        nonce BLOB NOT NULL,                   -- 32 bytes
        referer TEXT,
        prev_hash BLOB,                        -- 32 bytes, NULL for genesis
        created_at INTEGER NOT NULL,           -- local timestamp of insertion
        hash_version INTEGER NOT NULL,

        UNIQUE(doc_id, user_sub)
    );

    -- Document metadata consulted at signing time
    CREATE TABLE documents (
        doc_id TEXT PRIMARY KEY,
        url TEXT,
        checksum TEXT,
        checksum_algorithm TEXT,
        updated_at INTEGER NOT NULL
    );

    -- Checksum verification audit trail
    CREATE TABLE checksum_verifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        doc_id TEXT NOT NULL,
        verified_by TEXT NOT NULL,
        verified_at INTEGER NOT NULL,
        stored_checksum TEXT NOT NULL,
        calculated_checksum TEXT NOT NULL,
        algorithm TEXT NOT NULL,
        is_valid INTEGER NOT NULL,
        error_message TEXT
    );

    -- Indexes for common queries
    CREATE INDEX idx_signatures_doc ON signatures(doc_id, id);
    CREATE INDEX idx_signatures_user ON signatures(user_sub, id);
    CREATE INDEX idx_signatures_email ON signatures(lower(user_email));
    CREATE INDEX idx_verifications_doc ON checksum_verifications(doc_id, verified_at);

    -- Append-only enforcement
    CREATE TRIGGER signatures_no_delete
    BEFORE DELETE ON signatures
    BEGIN
        SELECT RAISE(ABORT, 'signatures are append-only');
    END;

    CREATE TRIGGER signatures_prev_hash_only
    BEFORE UPDATE ON signatures
    WHEN NEW.id IS NOT OLD.id
      OR NEW.doc_id IS NOT OLD.doc_id
      OR NEW.user_sub IS NOT OLD.user_sub
      OR NEW.user_email IS NOT OLD.user_email
      OR NEW.user_name IS NOT OLD.user_name
      OR NEW.signed_at IS NOT OLD.signed_at
      OR NEW.doc_checksum IS NOT OLD.doc_checksum
      OR NEW.payload_hash IS NOT OLD.payload_hash
      OR NEW.signature IS NOT OLD.signature
      OR NEW.nonce IS NOT OLD.nonce
      OR NEW.referer IS NOT OLD.referer
      OR NEW.created_at IS NOT OLD.created_at
      OR NEW.hash_version IS NOT OLD.hash_version
    BEGIN
        SELECT RAISE(ABORT, 'only prev_hash may be updated on signatures');
    END;

    CREATE TRIGGER checksum_verifications_no_update
    BEFORE UPDATE ON checksum_verifications
    BEGIN
        SELECT RAISE(ABORT, 'checksum verifications are append-only');
    END;

    CREATE TRIGGER checksum_verifications_no_delete
    BEFORE DELETE ON checksum_verifications
    BEGIN
        SELECT RAISE(ABORT, 'checksum verifications are append-only');
    END;
"#;

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
