//! SQLite link sink

use crate::classify::LinkCategory;
use crate::crawler::LinkRecord;
use crate::sink::schema::initialize_schema;
use crate::sink::{ResultSink, SinkResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// SQLite-backed sink, one database file per category
pub struct SqliteSink {
    conn: Connection,
    path: PathBuf,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// All stored records in insertion order
    pub fn load_records(&self) -> SinkResult<Vec<LinkRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, url, category, summary, score FROM links ORDER BY id")?;

        let records = stmt
            .query_map([], |row| {
                Ok(LinkRecord {
                    title: row.get(0)?,
                    url: row.get(1)?,
                    category: LinkCategory::from_str_opt(&row.get::<_, String>(2)?)
                        .unwrap_or(LinkCategory::Open),
                    summary: row.get(3)?,
                    score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

impl ResultSink for SqliteSink {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn existing_keys(&self) -> SinkResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM links")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    fn append(&mut self, records: &[LinkRecord]) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO links (title, url, category, summary, score, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.title,
                    record.url,
                    record.category.as_str(),
                    record.summary,
                    record.score,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
