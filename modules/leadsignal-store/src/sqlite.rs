use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use tokio::sync::Mutex;

use leadsignal_common::{
    now_iso, JobQuery, JobRecord, LeadPatch, LeadQuery, LeadRecord, LeadSignalError, LeadStatus,
};

use crate::backend::JobStore;

/// Embedded single-writer store. One connection behind an async mutex;
/// statements are short, so concurrent callers queue rather than contend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

const UPSERT_JOB_SQL: &str = "\
    INSERT INTO jobs (id, title, company, location, salary, tags, posted_at, url, source, collected_at, description)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        company = excluded.company,
        location = excluded.location,
        salary = excluded.salary,
        tags = excluded.tags,
        posted_at = excluded.posted_at,
        url = excluded.url,
        source = excluded.source,
        description = excluded.description";

const ENSURE_LEAD_SQL: &str =
    "INSERT OR IGNORE INTO leads (id, status, updated_at) VALUES (?1, 'new', ?2)";

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, LeadSignalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LeadSignalError::Storage(format!("create {}: {e}", parent.display()))
                })?;
            }
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, LeadSignalError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn init_schema(conn: &Connection) -> Result<(), LeadSignalError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 30000;

        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            company TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            salary TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '',
            posted_at TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '',
            collected_at TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'new',
            score INTEGER NOT NULL DEFAULT 0,
            favourite INTEGER NOT NULL DEFAULT 0,
            resume_url TEXT NOT NULL DEFAULT '',
            cover_letter_url TEXT NOT NULL DEFAULT '',
            next_action TEXT NOT NULL DEFAULT '',
            next_action_date TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source);
        CREATE INDEX IF NOT EXISTS idx_jobs_collected_at ON jobs(collected_at);
        CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
        "#,
    )
    .map_err(storage_err)
}

fn storage_err(e: rusqlite::Error) -> LeadSignalError {
    LeadSignalError::Storage(e.to_string())
}

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        salary: row.get(4)?,
        tags: row.get(5)?,
        posted_at: row.get(6)?,
        url: row.get(7)?,
        source: row.get(8)?,
        collected_at: row.get(9)?,
        description: row.get(10)?,
        score: 0,
    })
}

fn row_to_lead(row: &rusqlite::Row) -> rusqlite::Result<LeadRecord> {
    let status: String = row.get(1)?;
    Ok(LeadRecord {
        id: row.get(0)?,
        status: status.parse().unwrap_or_default(),
        score: row.get(2)?,
        favourite: row.get(3)?,
        resume_url: row.get(4)?,
        cover_letter_url: row.get(5)?,
        next_action: row.get(6)?,
        next_action_date: row.get(7)?,
        notes: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[async_trait]
impl JobStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert_jobs(&self, records: &[JobRecord]) -> Result<Vec<String>, LeadSignalError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(count = records.len(), "Upserting job records");

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare(UPSERT_JOB_SQL).map_err(storage_err)?;
            for record in records {
                stmt.execute(params![
                    record.id,
                    record.title,
                    record.company,
                    record.location,
                    record.salary,
                    record.tags,
                    record.posted_at,
                    record.url,
                    record.source,
                    record.collected_at,
                    record.description,
                ])
                .map_err(storage_err)?;
                ids.push(record.id.clone());
            }
        }
        tx.commit().map_err(storage_err)?;
        Ok(ids)
    }

    async fn ensure_leads(&self, ids: &[String]) -> Result<(), LeadSignalError> {
        if ids.is_empty() {
            return Ok(());
        }
        let now = now_iso();
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        {
            let mut stmt = tx.prepare(ENSURE_LEAD_SQL).map_err(storage_err)?;
            for id in ids {
                stmt.execute(params![id, now]).map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)
    }

    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>, LeadSignalError> {
        let mut found = HashSet::new();
        if ids.is_empty() {
            return Ok(found);
        }
        let conn = self.conn.lock().await;
        for chunk in ids.chunks(500) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!("SELECT id FROM jobs WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    row.get::<_, String>(0)
                })
                .map_err(storage_err)?;
            for id in rows {
                found.insert(id.map_err(storage_err)?);
            }
        }
        Ok(found)
    }

    async fn query_jobs(&self, query: &JobQuery) -> Result<Vec<JobRecord>, LeadSignalError> {
        let mut sql = String::from(
            "SELECT id, title, company, location, salary, tags, posted_at, url, source, collected_at, description \
             FROM jobs WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(text) = &query.text {
            let pattern = format!("%{}%", text.to_lowercase());
            sql.push_str(
                " AND (LOWER(title) LIKE ? OR LOWER(company) LIKE ? \
                 OR LOWER(tags) LIKE ? OR LOWER(description) LIKE ?)",
            );
            for _ in 0..4 {
                args.push(pattern.clone());
            }
        }
        if let Some(source) = &query.source {
            sql.push_str(" AND source = ?");
            args.push(source.clone());
        }
        if let Some(location) = &query.location {
            sql.push_str(" AND LOWER(location) LIKE ?");
            args.push(format!("%{}%", location.to_lowercase()));
        }
        if let Some(from) = &query.collected_from {
            sql.push_str(" AND collected_at >= ?");
            args.push(from.clone());
        }
        if let Some(to) = &query.collected_to {
            sql.push_str(" AND collected_at <= ?");
            args.push(to.clone());
        }
        sql.push_str(&format!(
            " ORDER BY collected_at DESC LIMIT {} OFFSET {}",
            query.limit, query.offset
        ));

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), row_to_job)
            .map_err(storage_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
    }

    async fn query_leads(&self, query: &LeadQuery) -> Result<Vec<LeadRecord>, LeadSignalError> {
        let mut sql = String::from(
            "SELECT id, status, score, favourite, resume_url, cover_letter_url, \
             next_action, next_action_date, notes, updated_at FROM leads",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(status) = query.status {
            sql.push_str(" WHERE status = ?");
            args.push(status.as_str().to_string());
        }
        sql.push_str(" ORDER BY updated_at DESC");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), row_to_lead)
            .map_err(storage_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
    }

    async fn set_lead_fields(&self, id: &str, patch: &LeadPatch) -> Result<(), LeadSignalError> {
        let now = now_iso();
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute(ENSURE_LEAD_SQL, params![id, now])
            .map_err(storage_err)?;

        let mut sets: Vec<String> = Vec::new();
        let mut args: Vec<SqlValue> = Vec::new();
        if let Some(status) = patch.status {
            sets.push("status = ?".to_string());
            args.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(score) = patch.score {
            sets.push("score = ?".to_string());
            args.push(SqlValue::Integer(score));
        }
        if let Some(favourite) = patch.favourite {
            sets.push("favourite = ?".to_string());
            args.push(SqlValue::Integer(i64::from(favourite)));
        }
        let text_fields = [
            ("resume_url", &patch.resume_url),
            ("cover_letter_url", &patch.cover_letter_url),
            ("next_action", &patch.next_action),
            ("next_action_date", &patch.next_action_date),
            ("notes", &patch.notes),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                sets.push(format!("{column} = ?"));
                args.push(SqlValue::Text(value.clone()));
            }
        }
        sets.push("updated_at = ?".to_string());
        args.push(SqlValue::Text(now));
        args.push(SqlValue::Text(id.to_string()));

        let sql = format!("UPDATE leads SET {} WHERE id = ?", sets.join(", "));
        tx.execute(&sql, params_from_iter(args)).map_err(storage_err)?;
        tx.commit().map_err(storage_err)
    }

    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: LeadStatus,
    ) -> Result<usize, LeadSignalError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = now_iso();
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        {
            let mut stmt = tx.prepare(ENSURE_LEAD_SQL).map_err(storage_err)?;
            for id in ids {
                stmt.execute(params![id, now]).map_err(storage_err)?;
            }
        }
        let mut count = 0;
        for chunk in ids.chunks(500) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "UPDATE leads SET status = ?, updated_at = ? WHERE id IN ({placeholders})"
            );
            let mut args: Vec<SqlValue> =
                vec![SqlValue::Text(status.as_str().to_string()), SqlValue::Text(now.clone())];
            args.extend(chunk.iter().map(|id| SqlValue::Text(id.clone())));
            count += tx.execute(&sql, params_from_iter(args)).map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;
        Ok(count)
    }

    async fn bulk_set_scores(
        &self,
        scores: &HashMap<String, i64>,
    ) -> Result<usize, LeadSignalError> {
        if scores.is_empty() {
            return Ok(0);
        }
        let now = now_iso();
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage_err)?;
        {
            let mut stmt = tx.prepare(ENSURE_LEAD_SQL).map_err(storage_err)?;
            for id in scores.keys() {
                stmt.execute(params![id, now]).map_err(storage_err)?;
            }
        }
        let mut count = 0;
        {
            let mut stmt = tx
                .prepare("UPDATE leads SET score = ?1, updated_at = ?2 WHERE id = ?3")
                .map_err(storage_err)?;
            for (id, score) in scores {
                count += stmt.execute(params![score, now, id]).map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)?;
        Ok(count)
    }
}
