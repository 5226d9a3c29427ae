//! Persistence module split across logical submodules. Every query is a free
//! function over a borrowed `Connection`; `Database` only knows where the file
//! lives.

mod colleges;
mod columns;
mod connection;
mod exams;
mod recommend;

/// Admin-side college maintenance. Writes run in a single transaction.
pub use colleges::{
    create_college, delete_college, fetch_colleges, fetch_cutoffs_for_college, update_college,
};
/// Schema bootstrap and connection handling shared by all tools.
pub use connection::{default_db_path, ensure_schema, Database, SEED_EXAMS};
/// Read-only exam lookups backing both forms' exam selectors.
pub use exams::{exam_id_by_name, fetch_exam_names};
/// The student recommendation search.
pub use recommend::search_colleges;
