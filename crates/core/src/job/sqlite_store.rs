//! SQLite-backed job store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{CreateJobRequest, JobError, JobFilter, JobStore};
use super::types::{Job, JobState};

/// SQLite-backed job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Create a new SQLite job store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, JobError> {
        let conn = Connection::open(path).map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite job store (useful for testing).
    pub fn in_memory() -> Result<Self, JobError> {
        let conn = Connection::open_in_memory().map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), JobError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                source_url TEXT NOT NULL,
                cookies_file TEXT,
                title_prefix TEXT,
                description TEXT,
                upload INTEGER NOT NULL DEFAULT 1,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_updated_at ON jobs(updated_at);
            "#,
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &JobFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref state) = filter.state {
            // The state column holds tagged JSON; filter on its type field.
            conditions.push("json_extract(state, '$.type') = ?");
            params.push(Box::new(state.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let id: String = row.get(0)?;
        let created_at_str: String = row.get(1)?;
        let source_url: String = row.get(2)?;
        let cookies_file: Option<String> = row.get(3)?;
        let title_prefix: Option<String> = row.get(4)?;
        let description: Option<String> = row.get(5)?;
        let upload: bool = row.get(6)?;
        let state_json: String = row.get(7)?;
        let updated_at_str: String = row.get(8)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let state: JobState = serde_json::from_str(&state_json).unwrap_or(JobState::Pending);

        Ok(Job {
            id,
            created_at,
            source_url,
            cookies_file: cookies_file.map(Into::into),
            title_prefix,
            description,
            upload,
            state,
            updated_at,
        })
    }
}

impl JobStore for SqliteJobStore {
    fn create(&self, request: CreateJobRequest) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = JobState::Pending;

        let state_json =
            serde_json::to_string(&state).map_err(|e| JobError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO jobs (id, created_at, source_url, cookies_file, title_prefix, description, upload, state, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                now.to_rfc3339(),
                request.source_url,
                request
                    .cookies_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                request.title_prefix,
                request.description,
                request.upload,
                state_json,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(Job {
            id,
            created_at: now,
            source_url: request.source_url,
            cookies_file: request.cookies_file,
            title_prefix: request.title_prefix,
            description: request.description,
            upload: request.upload,
            state,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Job>, JobError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, created_at, source_url, cookies_file, title_prefix, description, upload, state, updated_at FROM jobs WHERE id = ?",
            )
            .map_err(|e| JobError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![id], Self::row_to_job)
            .map_err(|e| JobError::Database(e.to_string()))?;

        match rows.next() {
            Some(Ok(job)) => Ok(Some(job)),
            Some(Err(e)) => Err(JobError::Database(e.to_string())),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, mut sql_params) = Self::build_where_clause(filter);
        sql_params.push(Box::new(filter.limit));
        sql_params.push(Box::new(filter.offset));

        let query = format!(
            "SELECT id, created_at, source_url, cookies_file, title_prefix, description, upload, state, updated_at FROM jobs {} ORDER BY updated_at DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), Self::row_to_job)
            .map_err(|e| JobError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| JobError::Database(e.to_string()))
    }

    fn count(&self, filter: &JobFilter) -> Result<i64, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, sql_params) = Self::build_where_clause(filter);
        let query = format!("SELECT COUNT(*) FROM jobs {}", where_clause);

        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p.as_ref()).collect();

        stmt.query_row(params_refs.as_slice(), |row| row.get(0))
            .map_err(|e| JobError::Database(e.to_string()))
    }

    fn update_state(&self, id: &str, new_state: JobState) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let state_json =
            serde_json::to_string(&new_state).map_err(|e| JobError::Database(e.to_string()))?;

        let now = Utc::now();
        let updated = conn
            .execute(
                "UPDATE jobs SET state = ?, updated_at = ? WHERE id = ?",
                params![state_json, now.to_rfc3339(), id],
            )
            .map_err(|e| JobError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(JobError::NotFound(id.to_string()));
        }

        drop(conn);
        self.get(id)?.ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<Job, JobError> {
        let job = self.get(id)?.ok_or_else(|| JobError::NotFound(id.to_string()))?;

        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM jobs WHERE id = ?", params![id])
            .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(job)
    }
}
