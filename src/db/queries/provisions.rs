use crate::date_utils::Period;
use crate::filters::cents_to_amount;
use crate::models::{CategoryRow, CategoryType, Provision};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

/// One row per category with its planned and realized amounts for `period`.
///
/// The row id is the provision's id when the category has a planned amount
/// stored for the period, otherwise the category id. Realized amounts are
/// the absolute sum of the category's transactions dated inside the month.
pub fn list_category_rows(conn: &Connection, period: &Period) -> rusqlite::Result<Vec<CategoryRow>> {
    let start = period.start_date().format("%Y-%m-%d").to_string();
    let end = period.end_date_exclusive().format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.category_type, c.color, c.parent_id,
                p.id, COALESCE(p.planned_cents, 0),
                COALESCE((SELECT SUM(ABS(t.amount_cents)) FROM transactions t
                          WHERE t.category_id = c.id AND t.date >= ?1 AND t.date < ?2), 0)
         FROM categories c
         LEFT JOIN provisions p ON p.category_id = c.id AND p.period = ?3
         ORDER BY c.created_at, c.rowid",
    )?;

    let rows = stmt
        .query_map(params![start, end, period.to_string()], |row| {
            let category_id: String = row.get(0)?;
            let category_type: String = row.get(2)?;
            let provision_id: Option<String> = row.get(5)?;
            let planned_cents: i64 = row.get(6)?;
            let realized_cents: i64 = row.get(7)?;
            Ok(CategoryRow {
                id: provision_id.unwrap_or_else(|| category_id.clone()),
                category_id,
                name: row.get(1)?,
                category_type: CategoryType::parse(&category_type).unwrap_or_default(),
                color: row.get(3)?,
                parent_id: row.get(4)?,
                planned: cents_to_amount(planned_cents),
                realized: cents_to_amount(realized_cents),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(period = %period, count = rows.len(), "Loaded category rows");
    Ok(rows)
}

pub fn get_provision(
    conn: &Connection,
    category_id: &str,
    period: &Period,
) -> rusqlite::Result<Option<Provision>> {
    conn.query_row(
        "SELECT id, category_id, period, planned_cents, updated_at
         FROM provisions WHERE category_id = ? AND period = ?",
        params![category_id, period.to_string()],
        |row| {
            Ok(Provision {
                id: row.get(0)?,
                category_id: row.get(1)?,
                period: row.get(2)?,
                planned_cents: row.get(3)?,
                updated_at: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Insert or replace the planned amount of a category for a period.
/// Returns the provision id.
pub fn upsert_provision(
    conn: &Connection,
    category_id: &str,
    period: &Period,
    planned_cents: i64,
) -> rusqlite::Result<String> {
    let id: String = conn.query_row(
        "INSERT INTO provisions (id, category_id, period, planned_cents)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (category_id, period)
         DO UPDATE SET planned_cents = excluded.planned_cents, updated_at = datetime('now')
         RETURNING id",
        params![
            Uuid::new_v4().to_string(),
            category_id,
            period.to_string(),
            planned_cents
        ],
        |row| row.get(0),
    )?;
    debug!(
        provision_id = %id,
        category_id = %category_id,
        period = %period,
        planned_cents = planned_cents,
        "Saved planned amount"
    );
    Ok(id)
}
