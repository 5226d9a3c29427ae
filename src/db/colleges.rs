use anyhow::{anyhow, Context, Result};
use rusqlite::{ffi, params, Connection, Error as SqlError};
use tracing::{debug, info};

use crate::models::{College, CollegeDetails, Cutoff, ExamCutoffs};

use super::exams::exam_id_by_name;

/// Every college, alphabetically by name. Backs the admin list.
pub fn fetch_colleges(conn: &Connection) -> Result<Vec<College>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, location, field, tuition_fee
             FROM colleges
             ORDER BY name COLLATE NOCASE, location COLLATE NOCASE",
        )
        .context("failed to prepare college query")?;

    let colleges = stmt
        .query_map([], |row| {
            Ok(College {
                id: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
                field: row.get(3)?,
                tuition_fee: row.get(4)?,
            })
        })
        .context("failed to load colleges")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect colleges")?;

    Ok(colleges)
}

/// Cutoffs recorded for a college across all exams, grouped by exam name and
/// listed in category order within each exam.
pub fn fetch_cutoffs_for_college(conn: &Connection, college_id: i64) -> Result<Vec<Cutoff>> {
    let mut stmt = conn
        .prepare(
            "SELECT ct.college_id, e.name, ct.category, ct.cutoff_score
             FROM cutoffs ct
             INNER JOIN exams e ON e.id = ct.exam_id
             WHERE ct.college_id = ?1
             ORDER BY e.name,
                 CASE ct.category
                     WHEN 'General' THEN 0
                     WHEN 'OBC' THEN 1
                     WHEN 'SC' THEN 2
                     ELSE 3
                 END",
        )
        .context("failed to prepare cutoff query")?;

    let cutoffs = stmt
        .query_map([college_id], |row| {
            Ok(Cutoff {
                college_id: row.get(0)?,
                exam: row.get(1)?,
                category: row.get(2)?,
                score: row.get(3)?,
            })
        })
        .context("failed to load cutoffs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect cutoffs")?;

    Ok(cutoffs)
}

/// Insert a college and, when an exam was chosen, its per-category cutoffs.
/// Both writes share one transaction so a bad cutoff leaves no half-created
/// college behind.
pub fn create_college(
    conn: &mut Connection,
    details: &CollegeDetails,
    cutoffs: Option<&ExamCutoffs>,
) -> Result<College> {
    let tx = conn.transaction().context("failed to start transaction")?;

    tx.execute(
        "INSERT INTO colleges (name, location, field, tuition_fee) VALUES (?1, ?2, ?3, ?4)",
        params![
            details.name,
            details.location,
            details.field,
            details.tuition_fee
        ],
    )
    .map_err(|err| map_unique_constraint(err, details))
    .context("failed to insert college")?;

    let id = tx.last_insert_rowid();

    if let Some(cutoffs) = cutoffs {
        insert_cutoffs(&tx, id, cutoffs)?;
    }

    tx.commit().context("failed to commit new college")?;
    info!(id, name = %details.name, "created college");

    Ok(College {
        id,
        name: details.name.clone(),
        location: details.location.clone(),
        field: details.field,
        tuition_fee: details.tuition_fee,
    })
}

/// Update a college row. When `cutoffs` is given, the college's existing
/// cutoffs for that exam are replaced; other exams stay untouched.
pub fn update_college(
    conn: &mut Connection,
    id: i64,
    details: &CollegeDetails,
    cutoffs: Option<&ExamCutoffs>,
) -> Result<()> {
    let tx = conn.transaction().context("failed to start transaction")?;

    let updated = tx
        .execute(
            "UPDATE colleges SET name = ?1, location = ?2, field = ?3, tuition_fee = ?4
             WHERE id = ?5",
            params![
                details.name,
                details.location,
                details.field,
                details.tuition_fee,
                id
            ],
        )
        .map_err(|err| map_unique_constraint(err, details))
        .context("failed to update college")?;

    if updated == 0 {
        return Err(anyhow!("College not found"));
    }

    if let Some(cutoffs) = cutoffs {
        let exam_id = exam_id_by_name(&tx, &cutoffs.exam)?;
        let cleared = tx
            .execute(
                "DELETE FROM cutoffs WHERE college_id = ?1 AND exam_id = ?2",
                params![id, exam_id],
            )
            .context("failed to clear previous cutoffs")?;
        debug!(id, exam = %cutoffs.exam, cleared, "replacing cutoffs");
        insert_cutoffs(&tx, id, cutoffs)?;
    }

    tx.commit().context("failed to commit college update")?;
    info!(id, name = %details.name, "updated college");
    Ok(())
}

/// Delete a college. Cutoffs go first because the schema does not cascade.
pub fn delete_college(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction().context("failed to start transaction")?;

    let cutoffs = tx
        .execute("DELETE FROM cutoffs WHERE college_id = ?1", params![id])
        .context("failed to delete cutoffs")?;

    let deleted = tx
        .execute("DELETE FROM colleges WHERE id = ?1", params![id])
        .context("failed to delete college")?;

    if deleted == 0 {
        return Err(anyhow!("College not found"));
    }

    tx.commit().context("failed to commit college deletion")?;
    info!(id, cutoffs, "deleted college");
    Ok(())
}

fn insert_cutoffs(conn: &Connection, college_id: i64, cutoffs: &ExamCutoffs) -> Result<()> {
    let exam_id = exam_id_by_name(conn, &cutoffs.exam)?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO cutoffs (college_id, exam_id, category, cutoff_score)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .context("failed to prepare cutoff insert")?;

    for (category, score) in cutoffs.entries() {
        stmt.execute(params![college_id, exam_id, category, score])
            .context("failed to insert cutoff")?;
    }

    Ok(())
}

/// Turn a (name, location) uniqueness violation into a readable message. Any
/// other failure passes through unchanged.
fn map_unique_constraint(err: SqlError, details: &CollegeDetails) -> anyhow::Error {
    match &err {
        SqlError::SqliteFailure(code, _) if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            anyhow!(
                "College {} ({}) already exists.",
                details.name,
                details.location
            )
        }
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::models::{Category, Field};
    use crate::ui::surface_error;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        conn
    }

    fn details(name: &str, location: &str, fee: f64) -> CollegeDetails {
        CollegeDetails {
            name: name.into(),
            location: location.into(),
            field: Field::Engineering,
            tuition_fee: fee,
        }
    }

    fn cutoff_rows(conn: &Connection, college_id: i64) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM cutoffs WHERE college_id = ?1",
            [college_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn create_and_list_colleges() {
        let mut conn = seeded();
        let cutoffs = ExamCutoffs::new("JEE Main")
            .with(Category::General, 95.0)
            .with(Category::Obc, 88.5);
        let college =
            create_college(&mut conn, &details("NIT Trichy", "Tiruchirappalli", 150000.0), Some(&cutoffs))
                .unwrap();
        create_college(&mut conn, &details("BITS Pilani", "Pilani", 500000.0), None).unwrap();

        let colleges = fetch_colleges(&conn).unwrap();
        let names: Vec<_> = colleges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["BITS Pilani", "NIT Trichy"]);

        let stored = fetch_cutoffs_for_college(&conn, college.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].category, Category::General);
        assert_eq!(stored[1].category, Category::Obc);
        assert_eq!(stored[1].score, 88.5);
        assert_eq!(stored[0].exam, "JEE Main");
    }

    #[test]
    fn duplicate_name_and_location_is_friendly() {
        let mut conn = seeded();
        create_college(&mut conn, &details("IIT Delhi", "Delhi", 220000.0), None).unwrap();
        let err =
            create_college(&mut conn, &details("IIT Delhi", "Delhi", 1.0), None).unwrap_err();
        assert_eq!(surface_error(&err), "College IIT Delhi (Delhi) already exists.");

        // Same name in a different city is a different college.
        create_college(&mut conn, &details("IIT Delhi", "Abu Dhabi", 1.0), None).unwrap();
    }

    #[test]
    fn unknown_exam_rolls_back_the_college() {
        let mut conn = seeded();
        let cutoffs = ExamCutoffs::new("GATE").with(Category::General, 50.0);
        assert!(create_college(&mut conn, &details("X", "Y", 1.0), Some(&cutoffs)).is_err());
        assert!(fetch_colleges(&conn).unwrap().is_empty());
    }

    #[test]
    fn update_replaces_only_the_chosen_exam() {
        let mut conn = seeded();
        let main = ExamCutoffs::new("JEE Main")
            .with(Category::General, 90.0)
            .with(Category::Sc, 70.0);
        let college =
            create_college(&mut conn, &details("IIIT Hyderabad", "Hyderabad", 300000.0), Some(&main))
                .unwrap();
        let bitsat = ExamCutoffs::new("BITSAT").with(Category::General, 310.0);
        update_college(&mut conn, college.id, &details("IIIT Hyderabad", "Hyderabad", 300000.0), Some(&bitsat))
            .unwrap();

        let replacement = ExamCutoffs::new("JEE Main").with(Category::General, 92.0);
        let mut renamed = details("IIIT-H", "Hyderabad", 320000.0);
        renamed.field = Field::Architecture;
        update_college(&mut conn, college.id, &renamed, Some(&replacement)).unwrap();

        let stored = fetch_cutoffs_for_college(&conn, college.id).unwrap();
        let summary: Vec<_> = stored
            .iter()
            .map(|c| (c.exam.as_str(), c.category, c.score))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("BITSAT", Category::General, 310.0),
                ("JEE Main", Category::General, 92.0),
            ]
        );

        let colleges = fetch_colleges(&conn).unwrap();
        assert_eq!(colleges[0].name, "IIIT-H");
        assert_eq!(colleges[0].field, Field::Architecture);
        assert_eq!(colleges[0].tuition_fee, 320000.0);
    }

    #[test]
    fn update_missing_college_fails() {
        let mut conn = seeded();
        let err = update_college(&mut conn, 42, &details("A", "B", 1.0), None).unwrap_err();
        assert_eq!(err.to_string(), "College not found");
    }

    #[test]
    fn delete_removes_cutoffs_first() {
        let mut conn = seeded();
        let cutoffs = ExamCutoffs::new("NEET")
            .with(Category::General, 650.0)
            .with(Category::St, 500.0);
        let college =
            create_college(&mut conn, &details("AIIMS", "New Delhi", 1500.0), Some(&cutoffs)).unwrap();
        assert_eq!(cutoff_rows(&conn, college.id), 2);

        delete_college(&mut conn, college.id).unwrap();

        assert_eq!(cutoff_rows(&conn, college.id), 0);
        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM cutoffs ct
                 LEFT JOIN colleges c ON c.id = ct.college_id
                 WHERE c.id IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
        assert!(fetch_colleges(&conn).unwrap().is_empty());
        assert_eq!(delete_college(&mut conn, college.id).unwrap_err().to_string(), "College not found");
    }
}
