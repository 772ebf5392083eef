use crate::models::category::{Category, CategoryType, NewCategory};
use crate::services::onboarding::DefaultCategory;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str =
    "id, name, parent_id, category_type, color, icon, created_at, updated_at";

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    let category_type: String = row.get(3)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        category_type: CategoryType::parse(&category_type).unwrap_or_default(),
        color: row.get(4)?,
        icon: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// All categories in creation order.
pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories ORDER BY created_at, rowid",
        CATEGORY_COLUMNS
    ))?;

    let categories = stmt
        .query_map([], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = categories.len(), "Listed categories");
    Ok(categories)
}

pub fn get_category(conn: &Connection, id: &str) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS),
        [id],
        map_category,
    )
    .optional()
}

pub fn create_category(conn: &Connection, category: &NewCategory) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO categories (id, name, parent_id, category_type, color, icon)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            id,
            category.name,
            category.parent_id,
            category.category_type.as_str(),
            category.color,
            category.icon
        ],
    )?;
    debug!(category_id = %id, name = %category.name, "Created category");
    Ok(id)
}

pub fn update_category(
    conn: &Connection,
    id: &str,
    category: &NewCategory,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET name = ?, parent_id = ?, category_type = ?, color = ?, icon = ?,
         updated_at = datetime('now') WHERE id = ?",
        params![
            category.name,
            category.parent_id,
            category.category_type.as_str(),
            category.color,
            category.icon,
            id
        ],
    )?;
    if rows > 0 {
        debug!(category_id = %id, name = %category.name, "Updated category");
    }
    Ok(rows > 0)
}

/// Set the type of every descendant of `id`, so a moved or retyped subtree
/// stays consistent with its root.
pub fn set_subtree_type(
    conn: &Connection,
    id: &str,
    category_type: CategoryType,
) -> rusqlite::Result<usize> {
    let rows = conn.execute(
        "WITH RECURSIVE subtree(id) AS (
            SELECT id FROM categories WHERE parent_id = ?1
            UNION ALL
            SELECT c.id FROM categories c JOIN subtree s ON c.parent_id = s.id
        )
        UPDATE categories SET category_type = ?2, updated_at = datetime('now')
        WHERE id IN (SELECT id FROM subtree) AND category_type != ?2",
        params![id, category_type.as_str()],
    )?;
    if rows > 0 {
        debug!(category_id = %id, count = rows, "Retyped descendant categories");
    }
    Ok(rows)
}

pub fn delete_category(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(category_id = %id, "Deleted category");
    }
    Ok(rows > 0)
}

pub fn count_children(conn: &Connection, id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE parent_id = ?",
        [id],
        |row| row.get(0),
    )
}

pub fn count_categories(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
}

/// Map of category id to parent id, for walking ancestor chains.
pub fn parent_map(conn: &Connection) -> rusqlite::Result<HashMap<String, Option<String>>> {
    let mut stmt = conn.prepare("SELECT id, parent_id FROM categories")?;
    let map = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(map)
}

/// Insert the starter category tree. Returns the number of categories created.
pub fn seed_default_categories(
    conn: &Connection,
    defaults: &[DefaultCategory],
) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut created = 0;

    for root in defaults {
        let root_id = create_category(
            &tx,
            &NewCategory {
                name: root.name.to_string(),
                parent_id: None,
                category_type: root.category_type,
                color: root.color.to_string(),
                icon: root.icon.to_string(),
            },
        )?;
        created += 1;

        for child in root.children {
            create_category(
                &tx,
                &NewCategory {
                    name: child.to_string(),
                    parent_id: Some(root_id.clone()),
                    category_type: root.category_type,
                    color: root.color.to_string(),
                    icon: root.icon.to_string(),
                },
            )?;
            created += 1;
        }
    }

    tx.commit()?;
    debug!(count = created, "Seeded default categories");
    Ok(created)
}
