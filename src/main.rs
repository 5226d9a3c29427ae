//! Binary entry point. Without a subcommand the login launcher runs; the
//! launcher re-runs this executable as `admin` or `recommend` with a session
//! token once the user has picked a tool.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use career_council::config::AppConfig;
use career_council::logging::init_logging;
use career_council::session::{has_token, spawn_tool, ACCESS_DENIED};
use career_council::{run_app, AdminApp, Database, LauncherApp, RecommenderApp};

#[derive(Parser)]
#[command(name = "career-council")]
#[command(about = "College admissions database and recommender")]
struct Cli {
    /// Database path (defaults to $CAREER_COUNCIL_DB or ~/.career-council)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level or filter directive, e.g. `debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the login launcher
    Login,
    /// Manage colleges and cutoff scores
    Admin {
        /// Session token issued by the launcher
        token: Option<String>,
    },
    /// Search colleges for a student's score and budget
    Recommend {
        /// Session token issued by the launcher
        token: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.db, cli.log_level)?;
    init_logging(config.log_level.as_deref(), &config.log_path())?;

    match cli.command.unwrap_or(Commands::Login) {
        Commands::Login => run_launcher(&config),
        Commands::Admin { token } => {
            if !has_token(token.as_deref()) {
                println!("{ACCESS_DENIED}");
                return Ok(());
            }
            let db = Database::open(&config.db_path)?;
            let mut app = AdminApp::load(db);
            run_app(&mut app)
        }
        Commands::Recommend { token } => {
            if !has_token(token.as_deref()) {
                println!("{ACCESS_DENIED}");
                return Ok(());
            }
            let db = Database::open(&config.db_path)?;
            let mut app = RecommenderApp::load(db);
            run_app(&mut app)
        }
    }
}

/// Show the launcher until the user quits it, running each chosen tool to
/// completion in between.
fn run_launcher(config: &AppConfig) -> anyhow::Result<()> {
    // Create and seed the database up front so both tools find it ready.
    Database::open(&config.db_path)?;

    loop {
        let mut launcher = LauncherApp::new();
        run_app(&mut launcher)?;

        let Some(role) = launcher.outcome() else {
            info!("launcher closed");
            return Ok(());
        };

        let status = spawn_tool(role, config)?;
        if !status.success() {
            warn!(tool = role.subcommand(), %status, "tool exited with failure");
        }
    }
}
