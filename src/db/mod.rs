pub mod schema;
pub mod migrations;
pub mod helpers;
pub use helpers::{safe_lock, with_connection};

use rusqlite::{Connection, Result};
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_opens() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let _db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_all_tables_created() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        migrations::run(db.connection()).unwrap();

        let expected_tables = ["habits", "habit_completions", "site_rules", "usage_logs"];
        for table in &expected_tables {
            let count: i32 = db.connection()
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0)
                ).unwrap();
            assert_eq!(count, 1, "Table {table} should exist");
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();

        migrations::run(db.connection()).unwrap();
        db.connection()
            .execute(
                "INSERT INTO site_rules (user_id, site_url, site_category)
                 VALUES ('u', 'reddit.com', 'distracting')",
                [],
            )
            .unwrap();
        migrations::run(db.connection()).unwrap();

        let count: i32 = db.connection()
            .query_row("SELECT COUNT(*) FROM site_rules", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1, "Running migrations twice should keep existing rows");
    }

    #[test]
    fn test_negative_usage_rejected_by_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        migrations::run(db.connection()).unwrap();

        let result = db.connection().execute(
            "INSERT INTO usage_logs
                 (site_url, site_category, time_spent_seconds, user_id, logged_date)
             VALUES ('reddit.com', 'neutral', -1, 'u', '2025-04-15')",
            [],
        );
        assert!(result.is_err());
    }
}
