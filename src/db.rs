//! Persistence: the usage-stats singleton and the append-only feedback log.
//!
//! Stats is a single row (`id = 1`) holding the all-time translation total
//! and a JSON-encoded per-language counter map. `record_translation` is an
//! explicit load/save pair, not an atomic increment: two handlers recording
//! at the same time can lose an increment. Known limitation, acceptable at
//! this throughput.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The all-time usage aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub total_translations: i64,
    pub language_counts: HashMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub id: i64,
    pub username: Option<String>,
    pub message: String,
    pub created_at: String,
}

#[derive(Clone, Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database file and create tables if they don't exist yet.
    pub fn open(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .with_context(|| format!("Failed to open database at {}", database_path))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_translations INTEGER NOT NULL,
                language_counts TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create stats table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create feedback table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fetch the stats singleton, or `None` if no translation has ever been
    /// recorded.
    pub fn load_stats(&self) -> Result<Option<Stats>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT total_translations, language_counts FROM stats WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to load stats")?;

        match row {
            Some((total_translations, counts_json)) => {
                let language_counts: HashMap<String, i64> =
                    serde_json::from_str(&counts_json)
                        .context("Stats row holds invalid language_counts JSON")?;
                Ok(Some(Stats {
                    total_translations,
                    language_counts,
                }))
            }
            None => Ok(None),
        }
    }

    /// Upsert the stats singleton row.
    pub fn save_stats(&self, stats: &Stats) -> Result<()> {
        let counts_json = serde_json::to_string(&stats.language_counts)
            .context("Failed to encode language counts")?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO stats (id, total_translations, language_counts)
             VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET
                 total_translations = excluded.total_translations,
                 language_counts = excluded.language_counts",
            params![stats.total_translations, counts_json],
        )
        .context("Failed to save stats")?;

        Ok(())
    }

    /// Record one successful translation: bump the total and both language
    /// counters. Source and target are incremented independently, so
    /// translating en -> en counts "en" twice. That matches the counting
    /// policy this bot has always had.
    pub fn record_translation(&self, from: &str, to: &str) -> Result<()> {
        let mut stats = self.load_stats()?.unwrap_or_default();
        stats.total_translations += 1;
        *stats.language_counts.entry(from.to_string()).or_insert(0) += 1;
        *stats.language_counts.entry(to.to_string()).or_insert(0) += 1;
        self.save_stats(&stats)
    }

    /// Append one feedback record with a server-assigned timestamp.
    pub fn record_feedback(&self, username: Option<&str>, message: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO feedback (username, message, created_at) VALUES (?1, ?2, ?3)",
            params![username, message, created_at],
        )
        .context("Failed to record feedback")?;
        Ok(())
    }

    /// List feedback, newest first. The bot never reads this; it exists for
    /// operators poking at the database and for tests.
    pub fn list_feedback(&self) -> Result<Vec<FeedbackEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, username, message, created_at FROM feedback ORDER BY id DESC",
        )?;

        let entries = stmt
            .query_map([], |row| {
                Ok(FeedbackEntry {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    message: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list feedback")?;

        Ok(entries)
    }
}
