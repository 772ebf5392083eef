use crate::models::FinancialGroup;
use crate::services::onboarding::OnboardingStep;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

/// The household record. A database holds at most one.
pub fn get_financial_group(conn: &Connection) -> rusqlite::Result<Option<FinancialGroup>> {
    conn.query_row(
        "SELECT id, name, onboarding_step, onboarding_completed, created_at
         FROM financial_groups ORDER BY created_at, rowid LIMIT 1",
        [],
        |row| {
            let step: String = row.get(2)?;
            Ok(FinancialGroup {
                id: row.get(0)?,
                name: row.get(1)?,
                onboarding_step: OnboardingStep::parse(&step).unwrap_or_default(),
                onboarding_completed: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .optional()
}

pub fn create_financial_group(
    conn: &Connection,
    name: &str,
    step: OnboardingStep,
) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO financial_groups (id, name, onboarding_step) VALUES (?, ?, ?)",
        params![id, name, step.as_str()],
    )?;
    info!(group_id = %id, name = %name, "Created financial group");
    Ok(id)
}

pub fn rename_financial_group(conn: &Connection, id: &str, name: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE financial_groups SET name = ? WHERE id = ?",
        params![name, id],
    )?;
    Ok(rows > 0)
}

pub fn set_onboarding_step(
    conn: &Connection,
    id: &str,
    step: OnboardingStep,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE financial_groups SET onboarding_step = ? WHERE id = ?",
        params![step.as_str(), id],
    )?;
    debug!(group_id = %id, step = %step, "Moved onboarding step");
    Ok(rows > 0)
}

pub fn complete_onboarding(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE financial_groups SET onboarding_step = 'final', onboarding_completed = 1
         WHERE id = ?",
        [id],
    )?;
    if rows > 0 {
        info!(group_id = %id, "Onboarding completed");
    }
    Ok(rows > 0)
}
