//! Runtime settings resolved once in `main` and handed to whichever tool runs.

use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::db::default_db_path;

/// Environment variable that overrides the default database location.
pub const DB_ENV_VAR: &str = "CAREER_COUNCIL_DB";
/// Log file written next to the database; the TUI owns stdout.
const LOG_FILE_NAME: &str = "career-council.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Precedence: explicit `--db`, then the environment, then `~/.career-council`.
    pub fn resolve(db_override: Option<PathBuf>, log_level: Option<String>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => match env::var_os(DB_ENV_VAR) {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => default_db_path()?,
            },
        };
        Ok(Self { db_path, log_level })
    }

    pub fn log_path(&self) -> PathBuf {
        self.db_path.with_file_name(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_and_log_sits_beside_it() {
        let config =
            AppConfig::resolve(Some(PathBuf::from("/tmp/cc/test.db")), Some("debug".into()))
                .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/cc/test.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/cc/career-council.log"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }
}
