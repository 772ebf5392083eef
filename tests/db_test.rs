//! Tests for the file-backed database: migrations and persistence across
//! pools.

use provisio::date_utils::Period;
use provisio::db::queries::{categories, provisions};
use provisio::db::{create_pool, migrations};
use provisio::models::{CategoryType, NewCategory};
use std::path::Path;
use tempfile::TempDir;

fn new_category(name: &str, parent_id: Option<String>) -> NewCategory {
    NewCategory {
        name: name.into(),
        parent_id,
        category_type: CategoryType::Expense,
        color: "#000000".into(),
        icon: "folder".into(),
    }
}

#[test]
fn test_migrations_apply_once() {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("provisio.db")).unwrap();
    let mut conn = pool.get().unwrap();

    let applied = migrations::run_migrations(&mut conn, Path::new("migrations")).unwrap();
    assert!(applied > 0);
    let again = migrations::run_migrations(&mut conn, Path::new("migrations")).unwrap();
    assert_eq!(again, 0);
}

#[test]
fn test_data_survives_new_pool() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("provisio.db");
    let period: Period = "2024-03".parse().unwrap();

    let leaf_id = {
        let pool = create_pool(&path).unwrap();
        let mut conn = pool.get().unwrap();
        migrations::run_migrations(&mut conn, Path::new("migrations")).unwrap();
        let root = categories::create_category(&conn, &new_category("Moradia", None)).unwrap();
        let leaf =
            categories::create_category(&conn, &new_category("Aluguel", Some(root))).unwrap();
        provisions::upsert_provision(&conn, &leaf, &period, 150_000).unwrap();
        leaf
    };

    let pool = create_pool(&path).unwrap();
    let conn = pool.get().unwrap();
    let rows = provisions::list_category_rows(&conn, &period).unwrap();
    assert_eq!(rows.len(), 2);
    let leaf = rows.iter().find(|r| r.category_id == leaf_id).unwrap();
    assert_eq!(leaf.planned, 1500.0);
    assert_ne!(leaf.id, leaf.category_id);
}

#[test]
fn test_upsert_keeps_single_row_per_period() {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("provisio.db")).unwrap();
    let mut conn = pool.get().unwrap();
    migrations::run_migrations(&mut conn, Path::new("migrations")).unwrap();

    let period: Period = "2024-03".parse().unwrap();
    let id = categories::create_category(&conn, &new_category("Lazer", None)).unwrap();
    let first = provisions::upsert_provision(&conn, &id, &period, 100).unwrap();
    let second = provisions::upsert_provision(&conn, &id, &period, 200).unwrap();
    assert_eq!(first, second);

    let stored = provisions::get_provision(&conn, &id, &period).unwrap().unwrap();
    assert_eq!(stored.planned_cents, 200);

    let other = provisions::upsert_provision(&conn, &id, &period.next(), 50).unwrap();
    assert_ne!(first, other);
}

#[test]
fn test_parent_delete_is_restricted() {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("provisio.db")).unwrap();
    let mut conn = pool.get().unwrap();
    migrations::run_migrations(&mut conn, Path::new("migrations")).unwrap();

    let root = categories::create_category(&conn, &new_category("Moradia", None)).unwrap();
    categories::create_category(&conn, &new_category("Aluguel", Some(root.clone()))).unwrap();
    assert!(categories::delete_category(&conn, &root).is_err());
}
