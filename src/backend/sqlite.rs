use std::path::Path;
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use sha2::Sha256;

use super::{Authenticator, DocumentStore, SessionWatchers, new_document_id, validate_credentials};
use crate::error::{AuthError, StoreError};
use crate::model::{CREATED_AT, Document, Record, Session, UPDATED_AT};

const DEFAULT_PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

pub fn open(path: &Path) -> Result<(SqliteAuth, SqliteStore)> {
    let auth_conn = open_db(path)?;
    let store_conn = open_db(path)?;
    Ok((SqliteAuth::new(auth_conn), SqliteStore::new(store_conn)))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA busy_timeout = 5000;
        CREATE TABLE IF NOT EXISTS accounts (
            email TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            rounds INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(collection, created_at);
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

pub struct SqliteAuth {
    conn: Connection,
    rounds: u32,
    watchers: SessionWatchers,
}

impl SqliteAuth {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            rounds: DEFAULT_PBKDF2_ROUNDS,
            watchers: SessionWatchers::default(),
        }
    }

    /// Hashing cost for accounts created from now on; existing rows keep theirs.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    fn lookup(&self, email: &str) -> Result<Option<(String, String, u32)>, AuthError> {
        self.conn
            .query_row(
                "SELECT password_hash, salt, rounds FROM accounts WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|err| AuthError::Backend(err.to_string()))
    }
}

fn hash_password(password: &str, salt: &[u8], rounds: u32) -> String {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    BASE64.encode(out)
}

impl Authenticator for SqliteAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();
        let Some((stored_hash, salt_b64, rounds)) = self.lookup(&email)? else {
            return Err(AuthError::InvalidCredentials);
        };
        let salt = BASE64
            .decode(salt_b64.as_bytes())
            .map_err(|err| AuthError::Backend(format!("corrupt salt: {err}")))?;
        if hash_password(password, &salt, rounds) != stored_hash {
            return Err(AuthError::InvalidCredentials);
        }
        self.watchers.publish(Session::Authenticated { email });
        Ok(())
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        validate_credentials(email, password)?;
        let email = email.trim().to_lowercase();
        if self.lookup(&email)?.is_some() {
            return Err(AuthError::EmailExists);
        }
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill(&mut salt);
        let hash = hash_password(password, &salt, self.rounds);
        self.conn
            .execute(
                "INSERT INTO accounts (email, password_hash, salt, rounds, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    email,
                    hash,
                    BASE64.encode(salt),
                    self.rounds,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        self.watchers.publish(Session::Authenticated { email });
        Ok(())
    }

    fn sign_out(&mut self) {
        self.watchers.publish(Session::Anonymous);
    }

    fn subscribe(&mut self, listener: Sender<Session>) {
        self.watchers.subscribe(listener);
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts or replaces a document under a known id (used by seeding).
    pub fn put(&mut self, collection: &str, id: &str, record: &Record) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(record).map_err(|err| StoreError::Decode(err.to_string()))?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![collection, id, data, now],
        )?;
        Ok(())
    }

    fn load(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|raw| parse_record(&raw)).transpose()
    }
}

fn parse_record(raw: &str) -> Result<Record, StoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Decode("document is not an object".to_string())),
        Err(err) => Err(StoreError::Decode(err.to_string())),
    }
}

fn strip_timestamps(mut record: Record) -> Record {
    record.remove(CREATED_AT);
    record.remove(UPDATED_AT);
    record
}

impl DocumentStore for SqliteStore {
    fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, data, created_at, updated_at FROM documents
             WHERE collection = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, raw, created_at, updated_at) = row?;
            let mut data = parse_record(&raw)?;
            data.insert(CREATED_AT.to_string(), Value::from(created_at));
            data.insert(UPDATED_AT.to_string(), Value::from(updated_at));
            docs.push(Document::new(id, data));
        }
        Ok(docs)
    }

    fn add(&mut self, collection: &str, record: Record) -> Result<String, StoreError> {
        let id = new_document_id();
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&strip_timestamps(record))
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![collection, id, data, now],
        )?;
        Ok(id)
    }

    fn update(&mut self, collection: &str, id: &str, record: Record) -> Result<(), StoreError> {
        let Some(mut data) = self.load(collection, id)? else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };
        data.extend(strip_timestamps(record));
        let raw = serde_json::to_string(&data).map_err(|err| StoreError::Decode(err.to_string()))?;
        self.conn.execute(
            "UPDATE documents SET data = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
            params![collection, id, raw, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use rusqlite::Connection;
    use serde_json::json;

    use super::{SqliteAuth, SqliteStore, init_schema};
    use crate::backend::{Authenticator, DocumentStore};
    use crate::error::{AuthError, StoreError};
    use crate::model::{PLAYERS, Session};

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("schema");
        conn
    }

    #[test]
    fn accounts_store_hashes_and_verify_passwords() {
        let conn = memory_conn();
        let mut auth = SqliteAuth::new(conn).with_rounds(10);
        let (tx, rx) = mpsc::channel();
        auth.subscribe(tx);
        assert_eq!(rx.recv().ok(), Some(Session::Anonymous));

        auth.sign_up("Coach@Academy.test", "hunter22").expect("sign up");
        assert_eq!(
            rx.recv().ok().and_then(|s| s.email().map(str::to_string)).as_deref(),
            Some("coach@academy.test")
        );

        let stored: String = auth
            .conn
            .query_row("SELECT password_hash FROM accounts", [], |row| row.get(0))
            .expect("row");
        assert_ne!(stored, "hunter22");

        assert_eq!(
            auth.sign_up("coach@academy.test", "hunter22"),
            Err(AuthError::EmailExists)
        );
        assert_eq!(
            auth.sign_in("coach@academy.test", "wrong-pass"),
            Err(AuthError::InvalidCredentials)
        );
        auth.sign_in("coach@academy.test", "hunter22").expect("sign in");
    }

    #[test]
    fn documents_round_trip_with_timestamps() {
        let mut store = SqliteStore::new(memory_conn());
        let mut rec = serde_json::Map::new();
        rec.insert("fullName".into(), json!("Mia Lane"));
        rec.insert("photos".into(), json!(true));
        let id = store.add(PLAYERS, rec).expect("add");

        let docs = store.list_all(PLAYERS).expect("list");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert!(docs[0].data.contains_key("createdAt"));

        let mut patch = serde_json::Map::new();
        patch.insert("fullName".into(), json!("Mia Lane-Hart"));
        store.update(PLAYERS, &id, patch).expect("update");
        let doc = &store.list_all(PLAYERS).expect("list")[0];
        assert_eq!(doc.data["fullName"], json!("Mia Lane-Hart"));
        assert_eq!(doc.data["photos"], json!(true));

        store.delete(PLAYERS, &id).expect("delete");
        assert!(store.list_all(PLAYERS).expect("list").is_empty());
    }

    #[test]
    fn update_of_missing_document_is_not_found() {
        let mut store = SqliteStore::new(memory_conn());
        let err = store
            .update(PLAYERS, "missing", serde_json::Map::new())
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
