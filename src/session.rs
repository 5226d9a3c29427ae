//! Hand-off from the launcher to one of the two tools. Each tool runs as its
//! own process and receives a throwaway session token on the command line.

use std::env;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::AppConfig;

/// Static administrator password checked by the launcher.
pub const ADMIN_PASSWORD: &str = "admin123";
/// Printed by a tool started without a session token.
pub const ACCESS_DENIED: &str = "Access Denied: Please launch through the main app.";

/// Which tool the launcher should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// Subcommand the child process is started with.
    pub fn subcommand(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "recommend",
        }
    }
}

pub fn check_password(candidate: &str) -> bool {
    candidate == ADMIN_PASSWORD
}

/// Whether a tool was started with a session token. The value itself is not
/// checked; a blank argument counts as missing.
pub fn has_token(token: Option<&str>) -> bool {
    token.is_some_and(|t| !t.trim().is_empty())
}

/// 16 random bytes, hex encoded.
pub fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Build the command that re-runs this executable as the chosen tool.
pub fn tool_command(role: Role, config: &AppConfig, token: &str) -> Result<Command> {
    let exe = env::current_exe().context("failed to locate current executable")?;
    let mut command = Command::new(exe);
    command.arg("--db").arg(&config.db_path);
    if let Some(level) = &config.log_level {
        command.arg("--log-level").arg(level);
    }
    command.arg(role.subcommand()).arg(token);
    Ok(command)
}

/// Start the chosen tool and wait for it to exit.
pub fn spawn_tool(role: Role, config: &AppConfig) -> Result<ExitStatus> {
    let token = generate_token();
    info!(tool = role.subcommand(), "launching tool");
    tool_command(role, config, &token)?
        .status()
        .with_context(|| format!("failed to start {} tool", role.subcommand()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::PathBuf;

    #[test]
    fn password_is_exact_match() {
        assert!(check_password("admin123"));
        assert!(!check_password("admin123 "));
        assert!(!check_password("ADMIN123"));
        assert!(!check_password(""));
    }

    #[test]
    fn tools_require_a_non_blank_token() {
        assert!(!has_token(None));
        assert!(!has_token(Some("")));
        assert!(!has_token(Some("   ")));
        assert!(has_token(Some("abc")));
        assert!(has_token(Some(&generate_token())));
    }

    #[test]
    fn tokens_are_random_hex() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn command_forwards_database_and_token() {
        let config = AppConfig {
            db_path: PathBuf::from("/tmp/cc.db"),
            log_level: None,
        };
        let command = tool_command(Role::Student, &config, "abc").unwrap();
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("--db"),
                OsStr::new("/tmp/cc.db"),
                OsStr::new("recommend"),
                OsStr::new("abc"),
            ]
        );
    }
}
