pub mod models;

use models::AnalysisRecord;
use rusqlite::{params, Connection, Result};
use std::sync::Mutex;

/// Storage key for the serialized analysis history list.
const HISTORY_KEY: &str = "video_analysis_history";

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).ok();
        let db_path = app_dir.join("market-mentor.db");
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Analysis history ──

    /// Read and parse the stored history list. An unparseable value is
    /// treated as empty history; the failure is logged, not surfaced.
    pub fn load_history(&self) -> Result<Vec<AnalysisRecord>> {
        let Some(raw) = self.get_setting(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                log::warn!("stored analysis history is unreadable, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Prepend the record and rewrite the whole serialized list. The full
    /// overwrite keeps the stored value a single consistent snapshot.
    pub fn append_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        let mut history = self.load_history()?;
        history.insert(0, record.clone());
        let serialized = serde_json::to_string(&history)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.set_setting(HISTORY_KEY, &serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str) -> AnalysisRecord {
        AnalysisRecord {
            id: id.to_string(),
            video_url: "https://www.youtube.com/watch?v=abc12345678".to_string(),
            title: title.to_string(),
            timestamp: "2026-01-01 10:00:00".to_string(),
            report: format!("# {}\nBody", title),
        }
    }

    #[test]
    fn settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();

        assert_eq!(db.get_setting("gemini_api_key").unwrap(), None);
        db.set_setting("gemini_api_key", "secret").unwrap();
        assert_eq!(
            db.get_setting("gemini_api_key").unwrap().as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn history_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let rec = record("2026-01-01T10:00:00Z", "First");
        {
            let db = Database::new(dir.path()).unwrap();
            db.append_analysis(&rec).unwrap();
        }
        let db = Database::new(dir.path()).unwrap();
        let history = db.load_history().unwrap();
        assert_eq!(history.first(), Some(&rec));
    }

    #[test]
    fn history_keeps_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        let r1 = record("2026-01-01T10:00:00Z", "First");
        let r2 = record("2026-01-02T10:00:00Z", "Second");

        db.append_analysis(&r1).unwrap();
        db.append_analysis(&r2).unwrap();

        let history = db.load_history().unwrap();
        assert_eq!(history, vec![r2, r1]);
    }

    #[test]
    fn unreadable_history_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        db.set_setting(HISTORY_KEY, "{not json").unwrap();
        assert!(db.load_history().unwrap().is_empty());

        // The store recovers on the next append.
        db.append_analysis(&record("2026-01-01T10:00:00Z", "Fresh")).unwrap();
        assert_eq!(db.load_history().unwrap().len(), 1);
    }
}
