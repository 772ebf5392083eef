use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::Form;
use rusqlite::Connection;
use serde::Deserialize;

use crate::date_utils::Period;
use crate::db::queries::{categories, provisions};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::models::{Category, CategoryType, NewCategory};
use crate::services::category_tree;
use crate::services::expansion::ExpansionState;
use crate::state::AppState;
use crate::VERSION;

pub const MAX_NAME_LEN: usize = 100;

/// A category as listed on the management page, in tree order.
pub struct CategoryListItem {
    pub id: String,
    pub name: String,
    pub color: String,
    pub category_type: &'static str,
    pub depth: usize,
    pub indent_px: usize,
    pub has_children: bool,
}

impl CategoryListItem {
    /// Label for parent `<select>` options.
    pub fn option_label(&self) -> String {
        format!("{}{}", "· ".repeat(self.depth), self.name)
    }
}

#[derive(Template)]
#[template(path = "pages/categories.html")]
pub struct CategoriesTemplate {
    pub title: String,
    pub version: &'static str,
    pub categories: Vec<CategoryListItem>,
}

#[derive(Template)]
#[template(path = "pages/category_form.html")]
pub struct CategoryFormTemplate {
    pub title: String,
    pub version: &'static str,
    pub category: Category,
    pub parent_options: Vec<CategoryListItem>,
}

impl CategoryFormTemplate {
    pub fn is_parent(&self, id: &str) -> bool {
        self.category.parent_id.as_deref() == Some(id)
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, rename = "type")]
    pub category_type: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Every category in tree order, both types, fully expanded.
fn list_items(conn: &Connection) -> AppResult<Vec<CategoryListItem>> {
    // Amounts are irrelevant here, any period will do.
    let rows = provisions::list_category_rows(conn, &Period::current())?;
    let forest = category_tree::build_category_tree(&rows)?;
    let expansion = ExpansionState::new().expand_all(category_tree::all_ids(&forest));

    let types: std::collections::HashMap<&str, CategoryType> = rows
        .iter()
        .map(|r| (r.category_id.as_str(), r.category_type))
        .collect();

    Ok(category_tree::visible_rows(&forest, &expansion)
        .into_iter()
        .map(|row| CategoryListItem {
            category_type: types
                .get(row.category_id.as_str())
                .copied()
                .unwrap_or_default()
                .label(),
            id: row.category_id,
            name: row.name,
            color: row
                .color
                .unwrap_or_else(crate::models::category::default_color),
            depth: row.depth,
            indent_px: row.depth * 24,
            has_children: row.has_children,
        })
        .collect())
}

pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let conn = state.db.get()?;
    let template = CategoriesTemplate {
        title: "Categorias".into(),
        version: VERSION,
        categories: list_items(&conn)?,
    };

    template.render_html()
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let conn = state.db.get()?;

    let category = categories::get_category(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Categoria não encontrada".into()))?;

    // A category cannot move under itself or its own descendants.
    let parent_map = categories::parent_map(&conn)?;
    let parent_options = list_items(&conn)?
        .into_iter()
        .filter(|item| !is_descendant_or_self(&parent_map, &item.id, &id))
        .collect();

    let template = CategoryFormTemplate {
        title: "Editar categoria".into(),
        version: VERSION,
        category,
        parent_options,
    };

    template.render_html()
}

fn is_descendant_or_self(
    parent_map: &std::collections::HashMap<String, Option<String>>,
    candidate: &str,
    ancestor: &str,
) -> bool {
    let mut current = Some(candidate.to_string());
    let mut steps = 0;
    while let Some(cid) = current {
        if cid == ancestor {
            return true;
        }
        steps += 1;
        if steps > parent_map.len() {
            return false;
        }
        current = parent_map.get(&cid).cloned().flatten();
    }
    false
}

/// Validate the form and resolve parent and type.
///
/// A child always takes its parent's type; asking for a different one is
/// an error rather than a silent override. A root with no type in the form
/// gets `root_type`.
fn validate_form(
    conn: &Connection,
    form: CategoryFormData,
    root_type: CategoryType,
) -> AppResult<NewCategory> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Informe o nome da categoria".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "O nome deve ter no máximo {} caracteres",
            MAX_NAME_LEN
        )));
    }

    let requested_type = match form.category_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) => Some(CategoryType::parse(t).ok_or_else(|| {
            AppError::Validation(format!("Tipo de categoria inválido: {}", t))
        })?),
    };

    let parent_id = form
        .parent_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let category_type = match &parent_id {
        Some(pid) => {
            let parent = categories::get_category(conn, pid)?.ok_or_else(|| {
                AppError::Validation("Categoria pai não encontrada".into())
            })?;
            if let Some(t) = requested_type {
                if t != parent.category_type {
                    return Err(AppError::Validation(format!(
                        "Uma subcategoria de '{}' deve ser do tipo {}",
                        parent.name,
                        parent.category_type.label()
                    )));
                }
            }
            parent.category_type
        }
        None => requested_type.unwrap_or(root_type),
    };

    Ok(NewCategory {
        name,
        parent_id,
        category_type,
        color: form
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(crate::models::category::default_color),
        icon: form
            .icon
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(crate::models::category::default_icon),
    })
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CategoryFormData>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    let new_category = validate_form(&conn, form, CategoryType::default())?;
    categories::create_category(&conn, &new_category)?;

    Ok(Redirect::to("/categories"))
}

/// Walk the ancestor chain of `proposed_parent_id`; if we encounter
/// `category_id` it means setting this parent would create a cycle.
fn check_circular_parent(
    conn: &Connection,
    category_id: &str,
    proposed_parent_id: Option<&str>,
) -> AppResult<()> {
    let Some(proposed) = proposed_parent_id else {
        return Ok(());
    };
    let parent_map = categories::parent_map(conn)?;
    if is_descendant_or_self(&parent_map, proposed, category_id) {
        return Err(AppError::Validation(
            "Não é possível usar esta categoria pai: criaria uma referência circular".into(),
        ));
    }
    Ok(())
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CategoryFormData>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;

    let existing = categories::get_category(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Categoria não encontrada".into()))?;

    let new_category = validate_form(&conn, form, existing.category_type)?;
    check_circular_parent(&conn, &id, new_category.parent_id.as_deref())?;

    let tx = conn.unchecked_transaction()?;
    categories::update_category(&tx, &id, &new_category)?;
    categories::set_subtree_type(&tx, &id, new_category.category_type)?;
    tx.commit()?;

    Ok(Redirect::to("/categories"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;

    let category = categories::get_category(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Categoria não encontrada".into()))?;

    if categories::count_children(&conn, &id)? > 0 {
        return Err(AppError::Validation(format!(
            "'{}' tem subcategorias; remova-as primeiro",
            category.name
        )));
    }

    categories::delete_category(&conn, &id)?;
    Ok(Redirect::to("/categories"))
}
