//! Core library for the Career Council college admissions tools.
//!
//! The binary wires these pieces together: `config` resolves where the
//! database lives, `db` owns the SQLite schema and queries, `session` handles
//! the launcher hand-off, and `ui` hosts the three terminal front-ends. The
//! re-exports below are the handful of names `main.rs` and the tests reach for
//! most often.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod session;
pub mod ui;

/// Resolved runtime settings (database path, log level).
pub use config::AppConfig;

/// Path handle every tool uses to open a fresh connection per operation.
pub use db::Database;

/// Domain types passed between the forms, the data layer and the result views.
pub use models::{College, CollegeDetails, ExamCutoffs, Recommendation, RecommendationQuery};

/// The three terminal front-ends and the event loop that drives them.
pub use ui::{run_app, AdminApp, LauncherApp, RecommenderApp};
