use crate::models::feedback::{FeedbackItem, NewFeedback, Owner, RationaleEntry, Sentiment, RESERVED_SIGNAL};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const DB_SCHEMA_VERSION: i64 = 2;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const FEEDBACK_COLUMNS: &str =
    "id, title, text, source, sentiment, urgency, impact, priority, owner, rationale, status, created_at";

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("database schema version {version} is newer than supported {DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            source TEXT NOT NULL,
            sentiment TEXT NOT NULL CHECK(sentiment IN ('Positive', 'Neutral', 'Negative')),
            urgency INTEGER NOT NULL DEFAULT 4,
            impact INTEGER NOT NULL DEFAULT 4,
            priority INTEGER NOT NULL,
            owner TEXT NOT NULL,
            rationale TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'NEW',
            created_at INTEGER NOT NULL
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_feedback_priority_created ON feedback(priority DESC, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_feedback_status ON feedback(status);
        CREATE INDEX IF NOT EXISTS idx_feedback_owner ON feedback(owner);
        ",
    )
}

pub fn get_db_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// Inserts a scored record and returns the id the store assigned.
pub fn insert_feedback(conn: &Connection, item: &NewFeedback, created_at: i64) -> Result<i64> {
    let rationale_json = serde_json::to_string(&item.rationale).unwrap_or_else(|_| "[]".to_string());

    conn.execute(
        "
        INSERT INTO feedback (
            title,
            text,
            source,
            sentiment,
            urgency,
            impact,
            priority,
            owner,
            rationale,
            status,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ",
        params![
            item.title,
            item.text,
            item.source,
            item.sentiment.as_str(),
            RESERVED_SIGNAL,
            RESERVED_SIGNAL,
            item.priority,
            item.owner.as_str(),
            rationale_json,
            item.status,
            created_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Returns false when no record has this id.
pub fn update_feedback_status(conn: &Connection, id: i64, status: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE feedback SET status = ?2 WHERE id = ?1",
        params![id, status],
    )?;
    Ok(changed > 0)
}

pub fn list_feedback(conn: &Connection) -> Result<Vec<FeedbackItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback ORDER BY priority DESC, created_at DESC, id DESC"
    ))?;

    let items = stmt
        .query_map([], feedback_from_row)?
        .collect::<Result<Vec<_>>>()?;

    Ok(items)
}

pub fn get_feedback(conn: &Connection, id: i64) -> Result<Option<FeedbackItem>> {
    conn.query_row(
        &format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?1"),
        params![id],
        feedback_from_row,
    )
    .optional()
}

/// Returns false when no record has this id.
pub fn delete_feedback(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM feedback WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_feedback(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))
}

pub fn count_priority_at_least(conn: &Connection, threshold: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM feedback WHERE priority >= ?1",
        params![threshold],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupColumn {
    Status,
    Owner,
    Sentiment,
}

impl GroupColumn {
    fn column(&self) -> &'static str {
        match self {
            GroupColumn::Status => "status",
            GroupColumn::Owner => "owner",
            GroupColumn::Sentiment => "sentiment",
        }
    }
}

pub fn count_grouped_by(conn: &Connection, group: GroupColumn) -> Result<BTreeMap<String, i64>> {
    let column = group.column();
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM feedback GROUP BY {column}"
    ))?;

    let counts = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(counts)
}

fn feedback_from_row(row: &Row<'_>) -> Result<FeedbackItem> {
    let sentiment_label: String = row.get(4)?;
    let sentiment = sentiment_label
        .parse::<Sentiment>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let owner_label: String = row.get(8)?;
    let rationale_json: String = row.get(9)?;

    Ok(FeedbackItem {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        source: row.get(3)?,
        sentiment,
        urgency: row.get(5)?,
        impact: row.get(6)?,
        priority: row.get(7)?,
        owner: Owner::from_label(&owner_label),
        rationale: parse_rationale(&rationale_json),
        status: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Unreadable payloads degrade to an empty trail instead of failing the read.
fn parse_rationale(raw: &str) -> Vec<RationaleEntry> {
    serde_json::from_str(raw).unwrap_or_default()
}
