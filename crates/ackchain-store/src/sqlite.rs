//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use ackchain_core::{
    ChecksumVerification, Document, Ed25519Signature, NewSignature, Nonce, Sha256Hash, Signature,
    SignatureId, UserIdentity,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DocumentLookup, SignatureStore, VerificationStore};

const SIGNATURE_COLUMNS: &str = "id, doc_id, user_sub, user_email, user_name, signed_at,
    doc_checksum, payload_hash, signature, nonce, referer, prev_hash, created_at, hash_version";

const VERIFICATION_COLUMNS: &str = "doc_id, verified_by, verified_at, stored_checksum,
    calculated_checksum, algorithm, is_valid, error_message";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or replace the metadata of a document.
    pub async fn upsert_document(&self, document: &Document) -> Result<()> {
        let document = document.clone();

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO documents (doc_id, url, checksum, checksum_algorithm, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(doc_id) DO UPDATE SET
                    url = excluded.url,
                    checksum = excluded.checksum,
                    checksum_algorithm = excluded.checksum_algorithm,
                    updated_at = excluded.updated_at",
                params![
                    document.doc_id,
                    document.url,
                    document.checksum,
                    document.checksum_algorithm,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Execute a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Read a fixed-size blob column.
fn blob<const N: usize>(row: &Row<'_>, column: &str) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(column)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Blob,
            format!("{}: expected {} bytes, got {}", column, N, len).into(),
        )
    })
}

// Helper to convert a row to Signature
fn row_to_signature(row: &Row<'_>) -> rusqlite::Result<Signature> {
    let prev_hash = match row.get::<_, Option<Vec<u8>>>("prev_hash")? {
        Some(_) => Some(Sha256Hash(blob::<32>(row, "prev_hash")?)),
        None => None,
    };

    Ok(Signature {
        id: SignatureId(row.get("id")?),
        doc_id: row.get("doc_id")?,
        user: UserIdentity {
            sub: row.get("user_sub")?,
            email: row.get("user_email")?,
            name: row.get("user_name")?,
        },
        signed_at: row.get("signed_at")?,
        doc_checksum: row.get("doc_checksum")?,
        payload_hash: Sha256Hash(blob::<32>(row, "payload_hash")?),
        signature: Ed25519Signature(blob::<64>(row, "signature")?),
        nonce: Nonce(blob::<32>(row, "nonce")?),
        referer: row.get("referer")?,
        prev_hash,
        created_at: row.get("created_at")?,
        hash_version: row.get("hash_version")?,
    })
}

fn row_to_verification(row: &Row<'_>) -> rusqlite::Result<ChecksumVerification> {
    Ok(ChecksumVerification {
        doc_id: row.get("doc_id")?,
        verified_by: row.get("verified_by")?,
        verified_at: row.get("verified_at")?,
        stored_checksum: row.get("stored_checksum")?,
        calculated_checksum: row.get("calculated_checksum")?,
        algorithm: row.get("algorithm")?,
        is_valid: row.get("is_valid")?,
        error_message: row.get("error_message")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn query_signatures(
    conn: &Connection,
    filter: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<Signature>> {
    let sql = format!(
        "SELECT {} FROM signatures {} ORDER BY id",
        SIGNATURE_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let signatures = stmt
        .query_map(args, row_to_signature)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(signatures)
}

#[async_trait]
impl SignatureStore for SqliteStore {
    async fn create(&self, signature: &NewSignature) -> Result<Signature> {
        let signature = signature.clone();

        self.run(move |conn| {
            let created_at = now_millis();

            let inserted = conn.execute(
                "INSERT INTO signatures (
                    doc_id, user_sub, user_email, user_name, signed_at, doc_checksum,
                    payload_hash, signature, nonce, referer, prev_hash, created_at, hash_version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    signature.doc_id,
                    signature.user.sub,
                    signature.user.email,
                    signature.user.name,
                    signature.signed_at,
                    signature.doc_checksum,
                    signature.payload_hash.0.as_slice(),
                    signature.signature.0.as_slice(),
                    signature.nonce.0.as_slice(),
                    signature.referer,
                    signature.prev_hash.as_ref().map(|h| h.0.as_slice()),
                    created_at,
                    signature.hash_version,
                ],
            );

            match inserted {
                Ok(_) => {
                    let id = SignatureId(conn.last_insert_rowid());
                    Ok(signature.into_stored(id, created_at))
                }
                Err(e) if is_unique_violation(&e) => Err(StoreError::UniqueViolation {
                    doc_id: signature.doc_id,
                    user_sub: signature.user.sub,
                }),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<Option<Signature>> {
        let doc_id = doc_id.to_string();
        let user_sub = user_sub.to_string();

        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM signatures WHERE doc_id = ?1 AND user_sub = ?2",
                SIGNATURE_COLUMNS
            );
            conn.query_row(&sql, params![doc_id, user_sub], row_to_signature)
                .optional()
                .map_err(StoreError::from)
        })
        .await
    }

    async fn get_by_doc(&self, doc_id: &str) -> Result<Vec<Signature>> {
        let doc_id = doc_id.to_string();
        self.run(move |conn| query_signatures(conn, "WHERE doc_id = ?1", params![doc_id]))
            .await
    }

    async fn get_by_user(&self, user_sub: &str) -> Result<Vec<Signature>> {
        let user_sub = user_sub.to_string();
        self.run(move |conn| query_signatures(conn, "WHERE user_sub = ?1", params![user_sub]))
            .await
    }

    async fn exists_by_doc_and_user(&self, doc_id: &str, user_sub: &str) -> Result<bool> {
        let doc_id = doc_id.to_string();
        let user_sub = user_sub.to_string();

        self.run(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM signatures WHERE doc_id = ?1 AND user_sub = ?2)",
                params![doc_id, user_sub],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn check_status_by_identifier(&self, doc_id: &str, identifier: &str) -> Result<bool> {
        let doc_id = doc_id.to_string();
        let identifier = identifier.to_string();

        self.run(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM signatures
                    WHERE doc_id = ?1 AND (user_sub = ?2 OR lower(user_email) = lower(?2))
                 )",
                params![doc_id, identifier],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn get_last_for_doc(&self, doc_id: &str) -> Result<Option<Signature>> {
        let doc_id = doc_id.to_string();

        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM signatures WHERE doc_id = ?1 ORDER BY id DESC LIMIT 1",
                SIGNATURE_COLUMNS
            );
            conn.query_row(&sql, params![doc_id], row_to_signature)
                .optional()
                .map_err(StoreError::from)
        })
        .await
    }

    async fn get_all_ordered(&self) -> Result<Vec<Signature>> {
        self.run(|conn| query_signatures(conn, "", [])).await
    }

    async fn update_prev_hash(&self, id: SignatureId, prev_hash: Option<Sha256Hash>) -> Result<()> {
        self.run(move |conn| {
            let updated = conn.execute(
                "UPDATE signatures SET prev_hash = ?1 WHERE id = ?2",
                params![prev_hash.as_ref().map(|h| h.0.as_slice()), id.get()],
            )?;

            if updated == 0 {
                return Err(StoreError::NotFound(format!("signature {}", id)));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl DocumentLookup for SqliteStore {
    async fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let doc_id = doc_id.to_string();

        self.run(move |conn| {
            conn.query_row(
                "SELECT doc_id, url, checksum, checksum_algorithm FROM documents WHERE doc_id = ?1",
                params![doc_id],
                |row| {
                    Ok(Document {
                        doc_id: row.get(0)?,
                        url: row.get(1)?,
                        checksum: row.get(2)?,
                        checksum_algorithm: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }
}

#[async_trait]
impl VerificationStore for SqliteStore {
    async fn record_verification(&self, verification: &ChecksumVerification) -> Result<()> {
        let v = verification.clone();

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO checksum_verifications (
                    doc_id, verified_by, verified_at, stored_checksum,
                    calculated_checksum, algorithm, is_valid, error_message
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    v.doc_id,
                    v.verified_by,
                    v.verified_at,
                    v.stored_checksum,
                    v.calculated_checksum,
                    v.algorithm,
                    v.is_valid,
                    v.error_message,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_verification_history(
        &self,
        doc_id: &str,
        limit: usize,
    ) -> Result<Vec<ChecksumVerification>> {
        let doc_id = doc_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM checksum_verifications WHERE doc_id = ?1
                 ORDER BY verified_at DESC, id DESC LIMIT ?2",
                VERIFICATION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let history = stmt
                .query_map(params![doc_id, limit], row_to_verification)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(history)
        })
        .await
    }

    async fn get_last_verification(&self, doc_id: &str) -> Result<Option<ChecksumVerification>> {
        Ok(self
            .get_verification_history(doc_id, 1)
            .await?
            .into_iter()
            .next())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
