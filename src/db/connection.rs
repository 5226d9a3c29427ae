use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::{debug, info};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".career-council";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "career_counseling.db";
/// Reference exams inserted the first time the database is created.
pub const SEED_EXAMS: [&str; 4] = ["JEE Main", "JEE Advanced", "NEET", "BITSAT"];

/// Handle to the on-disk database. It only remembers the path; every
/// operation opens its own connection and drops it when done.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create the parent directory if needed, then run the schema and seed
    /// step once so later connections can assume the tables exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let db = Self { path };
        let conn = db.connect()?;
        ensure_schema(&conn)?;
        info!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign key enforcement turned on.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).context("failed to open SQLite database")?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("failed to enable foreign keys")?;
        Ok(conn)
    }
}

/// Create the three tables if they are missing and seed the exam list when it
/// is empty. Safe to run on every start.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS exams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )
    .context("failed to create exams table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS colleges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            location TEXT NOT NULL,
            field TEXT NOT NULL,
            tuition_fee REAL NOT NULL,
            UNIQUE (name, location)
        )",
        [],
    )
    .context("failed to create colleges table")?;

    // No ON DELETE CASCADE: deleting a college removes its cutoffs explicitly.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cutoffs (
            college_id INTEGER NOT NULL,
            exam_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            cutoff_score REAL NOT NULL,
            UNIQUE (college_id, exam_id, category),
            FOREIGN KEY(college_id) REFERENCES colleges(id),
            FOREIGN KEY(exam_id) REFERENCES exams(id)
        )",
        [],
    )
    .context("failed to create cutoffs table")?;

    let exam_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM exams", [], |row| row.get(0))
        .context("failed to count exams")?;

    if exam_count == 0 {
        for name in SEED_EXAMS {
            conn.execute("INSERT INTO exams (name) VALUES (?1)", [name])
                .context("failed to seed exams")?;
        }
        debug!(count = SEED_EXAMS.len(), "seeded exam table");
    }

    Ok(())
}

/// Resolve the default database location inside the user's home directory.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn schema_is_idempotent_and_seeds_once() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM exams", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn open_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("test.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        // Reopening an existing file must not reseed.
        let again = Database::open(db.path()).unwrap();
        let conn = again.connect().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM exams", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 4);
    }
}
