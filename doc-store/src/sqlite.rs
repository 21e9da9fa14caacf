//! SQLite-backed document store.
//!
//! A single `rusqlite::Connection` guarded by a std `Mutex`; every call
//! runs on `spawn_blocking` so the async runtime never blocks on disk I/O.
//! Chat turns carry an autoincrement `seq`, which defines log order.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use tracing::{debug, info};

use crate::{
    errors::StoreError,
    models::{ChatTurn, Document, Role, UserPlan},
    store::DocumentStore,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    download_url TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_turns (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('human', 'assistant')),
    message TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_turns_document ON chat_turns(document_id, seq);

CREATE TABLE IF NOT EXISTS user_plans (
    user_id TEXT PRIMARY KEY,
    has_active_membership INTEGER NOT NULL DEFAULT 0
);
";

#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "sqlite document store opened");
        Self::from_connection(conn)
    }

    /// Private in-memory database, handy for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Sets the membership flag returned by [`DocumentStore::user_plan`].
    pub async fn set_membership(&self, user_id: &str, active: bool) -> Result<(), StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_plans (user_id, has_active_membership) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET has_active_membership = excluded.has_active_membership",
                params![user_id, active],
            )?;
            Ok(())
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await?
    }
}

/* ---------------------------- row helpers ---------------------------- */

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ts_from_sql(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn turn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatTurn> {
    let role: String = row.get(0)?;
    let role = Role::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("unknown role {role:?}").into(),
        )
    })?;
    Ok(ChatTurn {
        role,
        message: row.get(1)?,
        created_at: ts_from_sql(2, row.get(2)?)?,
    })
}

fn ensure_owned(conn: &Connection, user_id: &str, document_id: &str) -> Result<Document, StoreError> {
    conn.query_row(
        "SELECT id, owner_id, name, download_url, created_at FROM documents
         WHERE id = ?1 AND owner_id = ?2",
        params![document_id, user_id],
        |row| {
            Ok(Document {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
                download_url: row.get(3)?,
                created_at: ts_from_sql(4, row.get(4)?)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found(document_id))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn register_document(
        &self,
        user_id: &str,
        name: &str,
        download_url: &str,
    ) -> Result<Document, StoreError> {
        let doc = Document {
            id: services::uuid::new_id(),
            owner_id: user_id.to_string(),
            name: name.to_string(),
            download_url: download_url.to_string(),
            created_at: Utc::now(),
        };
        let row = doc.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, owner_id, name, download_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.owner_id, row.name, row.download_url, ts_to_sql(&row.created_at)],
            )?;
            Ok(())
        })
        .await?;
        debug!(document_id = %doc.id, user_id, "document registered");
        Ok(doc)
    }

    async fn get_document(&self, user_id: &str, document_id: &str) -> Result<Document, StoreError> {
        let (user_id, document_id) = (user_id.to_string(), document_id.to_string());
        self.with_conn(move |conn| ensure_owned(conn, &user_id, &document_id))
            .await
    }

    async fn chat_turns(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let (user_id, document_id) = (user_id.to_string(), document_id.to_string());
        self.with_conn(move |conn| {
            ensure_owned(conn, &user_id, &document_id)?;
            let mut stmt = conn.prepare(
                "SELECT role, message, created_at FROM chat_turns
                 WHERE document_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![document_id], turn_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn recent_chat_turns(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let (user_id, document_id) = (user_id.to_string(), document_id.to_string());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            ensure_owned(conn, &user_id, &document_id)?;
            let mut stmt = conn.prepare(
                "SELECT role, message, created_at FROM chat_turns
                 WHERE document_id = ?1 ORDER BY seq DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![document_id, limit], turn_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn append_chat_turn(
        &self,
        user_id: &str,
        document_id: &str,
        mut turn: ChatTurn,
    ) -> Result<ChatTurn, StoreError> {
        let (user_id, document_id) = (user_id.to_string(), document_id.to_string());
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            ensure_owned(&tx, &user_id, &document_id)?;

            let last: Option<String> = tx
                .query_row(
                    "SELECT created_at FROM chat_turns WHERE document_id = ?1
                     ORDER BY seq DESC LIMIT 1",
                    params![document_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(raw) = last {
                let last = ts_from_sql(0, raw)?;
                if turn.created_at < last {
                    turn.created_at = last;
                }
            }

            tx.execute(
                "INSERT INTO chat_turns (document_id, role, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![document_id, turn.role.as_str(), turn.message, ts_to_sql(&turn.created_at)],
            )?;
            tx.commit()?;
            Ok(turn)
        })
        .await
    }

    async fn user_plan(&self, user_id: &str) -> Result<UserPlan, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let active: Option<bool> = conn
                .query_row(
                    "SELECT has_active_membership FROM user_plans WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(UserPlan {
                has_active_membership: active.unwrap_or(false),
            })
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
