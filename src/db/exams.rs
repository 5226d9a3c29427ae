use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// Every exam name, alphabetically. Feeds the exam selectors in both tools.
pub fn fetch_exam_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM exams ORDER BY name")
        .context("failed to prepare exam query")?;

    let names = stmt
        .query_map([], |row| row.get(0))
        .context("failed to load exams")?
        .collect::<Result<Vec<String>, _>>()
        .context("failed to collect exams")?;

    Ok(names)
}

/// Look up the id behind an exam name.
pub fn exam_id_by_name(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM exams WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .optional()
    .context("failed to look up exam")?
    .ok_or_else(|| anyhow!("Unknown exam: {name}"))
}
