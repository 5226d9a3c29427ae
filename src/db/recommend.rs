use anyhow::{Context, Result};
use rusqlite::{Connection, ToSql};
use tracing::debug;

use crate::models::{Recommendation, RecommendationQuery};

/// Colleges whose cutoff for the requested exam/field/category is at or below
/// the student's score, best-ranked (highest cutoff) first. A positive budget
/// caps the tuition fee; zero means no cap. No matches is an empty list, not
/// an error.
pub fn search_colleges(conn: &Connection, query: &RecommendationQuery) -> Result<Vec<Recommendation>> {
    let mut sql = String::from(
        "SELECT c.name, c.location, ct.cutoff_score, c.field, c.tuition_fee
         FROM colleges c
         INNER JOIN cutoffs ct ON ct.college_id = c.id
         INNER JOIN exams e ON e.id = ct.exam_id
         WHERE e.name = ?1
           AND c.field = ?2
           AND ct.category = ?3
           AND ct.cutoff_score <= ?4",
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![
        Box::new(query.exam.clone()),
        Box::new(query.field),
        Box::new(query.category),
        Box::new(query.score),
    ];

    if let Some(budget) = query.budget.filter(|budget| *budget > 0.0) {
        sql.push_str(" AND c.tuition_fee <= ?5");
        params_vec.push(Box::new(budget));
    }

    sql.push_str(" ORDER BY ct.cutoff_score DESC, c.name COLLATE NOCASE");

    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare recommendation query")?;

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let results = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(Recommendation {
                name: row.get(0)?,
                location: row.get(1)?,
                cutoff_score: row.get(2)?,
                field: row.get(3)?,
                tuition_fee: row.get(4)?,
            })
        })
        .context("failed to run recommendation query")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect recommendations")?;

    debug!(
        exam = %query.exam,
        field = %query.field,
        category = %query.category,
        score = query.score,
        budget = ?query.budget,
        found = results.len(),
        "recommendation search"
    );

    Ok(results)
}
