use crate::models::transaction::{NewTransaction, Transaction, TransactionWithCategory};
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct TransactionFilter {
    pub category_id: Option<String>,
    pub from_date: Option<String>,
    /// Exclusive upper bound.
    pub until_date: Option<String>,
    pub limit: Option<i64>,
}

pub fn list_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> rusqlite::Result<Vec<TransactionWithCategory>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.amount_cents, t.description, t.category_id, t.created_at,
                c.name, c.color
         FROM transactions t
         LEFT JOIN categories c ON t.category_id = c.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref category_id) = filter.category_id {
        sql.push_str(" AND t.category_id = ?");
        params_vec.push(Box::new(category_id.clone()));
    }
    if let Some(ref from_date) = filter.from_date {
        sql.push_str(" AND t.date >= ?");
        params_vec.push(Box::new(from_date.clone()));
    }
    if let Some(ref until_date) = filter.until_date {
        sql.push_str(" AND t.date < ?");
        params_vec.push(Box::new(until_date.clone()));
    }

    sql.push_str(" ORDER BY t.date DESC, t.created_at DESC, t.rowid DESC");

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;

    let transactions = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(TransactionWithCategory {
                transaction: Transaction {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    amount_cents: row.get(2)?,
                    description: row.get(3)?,
                    category_id: row.get(4)?,
                    created_at: row.get(5)?,
                },
                category_name: row.get(6)?,
                category_color: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

pub fn create_transaction(
    conn: &Connection,
    transaction: &NewTransaction,
) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO transactions (id, date, amount_cents, description, category_id)
         VALUES (?, ?, ?, ?, ?)",
        params![
            id,
            transaction.date,
            transaction.amount_cents,
            transaction.description,
            transaction.category_id,
        ],
    )?;

    debug!(
        transaction_id = %id,
        amount_cents = transaction.amount_cents,
        "Created transaction"
    );
    Ok(id)
}

pub fn delete_transaction(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM transactions WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(transaction_id = %id, "Deleted transaction");
    }
    Ok(rows > 0)
}
