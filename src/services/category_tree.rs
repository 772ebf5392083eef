//! Turns a flat list of category rows into an aggregated, sorted forest.
//!
//! The pipeline runs in one direction:
//!
//! 1. [`index_rows`] keys every row by its `category_id`.
//! 2. [`build_forest`] links each node under its parent, or makes it a root
//!    when the parent is absent from the input.
//! 3. [`aggregate`] replaces every internal node's planned/realized values
//!    with the sum over its children.
//! 4. [`sort_forest`] orders every sibling list by name.
//!
//! [`filter_by_type`] then picks the roots for one view, and
//! [`visible_rows`] flattens what an [`ExpansionState`] leaves open.
//!
//! Every step takes its input by value or reference and returns a fresh tree;
//! no node is shared between two builds.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{CategoryRow, CategoryType};
use crate::services::collation;
use crate::services::expansion::ExpansionState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Category hierarchy contains a cycle through '{category_id}'")]
    CyclicHierarchy { category_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub planned: f64,
    pub realized: f64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_row(row: &CategoryRow) -> Self {
        Self {
            id: row.id.clone(),
            category_id: row.category_id.clone(),
            name: row.name.clone(),
            category_type: row.category_type,
            color: row.color.clone(),
            parent_id: row.parent_id.clone(),
            planned: row.planned,
            realized: row.realized,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Planned minus realized, rounded to cents.
    pub fn remaining(&self) -> f64 {
        round_cents(self.planned - self.realized)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    pub fn find(&self, category_id: &str) -> Option<&TreeNode> {
        if self.category_id == category_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(category_id))
    }
}

/// Rows keyed by `category_id`, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    order: Vec<String>,
    rows: HashMap<String, CategoryRow>,
}

impl NodeIndex {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub fn get(&self, category_id: &str) -> Option<&CategoryRow> {
        self.rows.get(category_id)
    }

    /// Rows in the order their identifier first appeared in the input.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRow> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }

    /// The parent of `category_id`, if it is present in the index.
    fn resolved_parent(&self, category_id: &str) -> Option<&str> {
        self.rows
            .get(category_id)?
            .parent_id
            .as_deref()
            .filter(|pid| self.rows.contains_key(*pid))
    }
}

/// Key rows by `category_id`.
///
/// A repeated identifier overwrites the earlier row's data but keeps the
/// earlier row's position.
pub fn index_rows(rows: &[CategoryRow]) -> NodeIndex {
    let mut index = NodeIndex::default();
    for row in rows {
        let previous = index.rows.insert(row.category_id.clone(), row.clone());
        if previous.is_some() {
            warn!(
                category_id = %row.category_id,
                "Duplicate category row, keeping the last one"
            );
        } else {
            index.order.push(row.category_id.clone());
        }
    }
    index
}

/// Link every indexed node under its parent.
///
/// Nodes whose parent is missing become roots. Roots and children keep input
/// order. A parent chain that loops back on itself is rejected.
pub fn build_forest(index: &NodeIndex) -> Result<Vec<TreeNode>, TreeError> {
    check_acyclic(index)?;

    let mut roots: Vec<&CategoryRow> = Vec::new();
    let mut children: HashMap<&str, Vec<&CategoryRow>> = HashMap::new();
    for row in index.iter() {
        match index.resolved_parent(&row.category_id) {
            Some(parent) => children.entry(parent).or_default().push(row),
            None => {
                if row.parent_id.is_some() {
                    debug!(
                        category_id = %row.category_id,
                        parent_id = ?row.parent_id,
                        "Parent not in data set, treating category as root"
                    );
                }
                roots.push(row);
            }
        }
    }

    Ok(roots.into_iter().map(|row| link(&children, row)).collect())
}

fn link(children: &HashMap<&str, Vec<&CategoryRow>>, row: &CategoryRow) -> TreeNode {
    let mut node = TreeNode::from_row(row);
    if let Some(rows) = children.get(row.category_id.as_str()) {
        node.children = rows.iter().map(|child| link(children, child)).collect();
    }
    node
}

fn check_acyclic(index: &NodeIndex) -> Result<(), TreeError> {
    let mut settled: HashSet<&str> = HashSet::new();

    for row in index.iter() {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = Some(row.category_id.as_str());

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !on_path.insert(id) {
                return Err(TreeError::CyclicHierarchy {
                    category_id: id.to_string(),
                });
            }
            path.push(id);
            current = index.resolved_parent(id);
        }

        settled.extend(path);
    }

    Ok(())
}

/// Roll planned and realized values up from the leaves.
///
/// Leaves keep their values. Every internal node ends up with the sum of its
/// children's aggregated values, rounded to cents.
pub fn aggregate(forest: Vec<TreeNode>) -> Vec<TreeNode> {
    forest.into_iter().map(aggregate_node).collect()
}

fn aggregate_node(mut node: TreeNode) -> TreeNode {
    if node.children.is_empty() {
        return node;
    }

    node.children = aggregate(std::mem::take(&mut node.children));
    node.planned = round_cents(node.children.iter().map(|c| c.planned).sum());
    node.realized = round_cents(node.children.iter().map(|c| c.realized).sum());
    node
}

/// Order every sibling list by name, recursively.
pub fn sort_forest(forest: Vec<TreeNode>) -> Vec<TreeNode> {
    let mut forest: Vec<TreeNode> = forest
        .into_iter()
        .map(|mut node| {
            node.children = sort_forest(std::mem::take(&mut node.children));
            node
        })
        .collect();
    forest.sort_by_cached_key(|node| collation::collation_key(&node.name));
    forest
}

/// Keep only the roots of the requested type. Subtrees are left as they are.
pub fn filter_by_type(forest: Vec<TreeNode>, category_type: CategoryType) -> Vec<TreeNode> {
    forest
        .into_iter()
        .filter(|root| root.category_type == category_type)
        .collect()
}

/// Index, link, aggregate and sort in one call.
pub fn build_category_tree(rows: &[CategoryRow]) -> Result<Vec<TreeNode>, TreeError> {
    let index = index_rows(rows);
    let forest = build_forest(&index)?;
    let forest = sort_forest(aggregate(forest));
    debug!(
        rows = rows.len(),
        nodes = index.len(),
        roots = forest.len(),
        "Built category tree"
    );
    Ok(forest)
}

/// Every `category_id` in the forest, depth first.
pub fn all_ids(forest: &[TreeNode]) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids(forest, &mut ids);
    ids
}

fn collect_ids(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        out.push(node.category_id.clone());
        collect_ids(&node.children, out);
    }
}

/// Sum of the top-level planned and realized values.
pub fn totals(forest: &[TreeNode]) -> (f64, f64) {
    let planned = forest.iter().map(|n| n.planned).sum();
    let realized = forest.iter().map(|n| n.realized).sum();
    (round_cents(planned), round_cents(realized))
}

/// A node as a view would draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleRow {
    pub category_id: String,
    pub name: String,
    pub color: Option<String>,
    pub depth: usize,
    pub planned: f64,
    pub realized: f64,
    pub has_children: bool,
    pub expanded: bool,
}

impl VisibleRow {
    pub fn remaining(&self) -> f64 {
        round_cents(self.planned - self.realized)
    }
}

/// Flatten the forest depth first, descending only into expanded nodes.
pub fn visible_rows(forest: &[TreeNode], expansion: &ExpansionState) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    push_visible(forest, expansion, 0, &mut rows);
    rows
}

fn push_visible(
    nodes: &[TreeNode],
    expansion: &ExpansionState,
    depth: usize,
    out: &mut Vec<VisibleRow>,
) {
    for node in nodes {
        let expanded = expansion.is_expanded(&node.category_id);
        out.push(VisibleRow {
            category_id: node.category_id.clone(),
            name: node.name.clone(),
            color: node.color.clone(),
            depth,
            planned: node.planned,
            realized: node.realized,
            has_children: !node.children.is_empty(),
            expanded,
        });
        if expanded {
            push_visible(&node.children, expansion, depth + 1, out);
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, parent: Option<&str>, name: &str, planned: f64, realized: f64) -> CategoryRow {
        CategoryRow::new(id, name, CategoryType::Expense, parent, planned, realized)
    }

    fn income(id: &str, parent: Option<&str>, name: &str, planned: f64) -> CategoryRow {
        CategoryRow::new(id, name, CategoryType::Income, parent, planned, 0.0)
    }

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn assert_sums(node: &TreeNode) {
        if node.children.is_empty() {
            return;
        }
        let planned: f64 = node.children.iter().map(|c| c.planned).sum();
        let realized: f64 = node.children.iter().map(|c| c.realized).sum();
        assert!(
            (node.planned - planned).abs() < 0.005,
            "{} planned {} != {}",
            node.name,
            node.planned,
            planned
        );
        assert!(
            (node.realized - realized).abs() < 0.005,
            "{} realized {} != {}",
            node.name,
            node.realized,
            realized
        );
        node.children.iter().for_each(assert_sums);
    }

    fn sample_rows() -> Vec<CategoryRow> {
        vec![
            row("moradia", None, "Moradia", 0.0, 0.0),
            row("aluguel", Some("moradia"), "Aluguel", 1500.0, 1500.0),
            row("contas", Some("moradia"), "Contas", 0.0, 0.0),
            row("luz", Some("contas"), "Luz", 180.5, 201.37),
            row("agua", Some("contas"), "Água", 90.1, 85.0),
            row("transporte", None, "Transporte", 0.0, 0.0),
            row("onibus", Some("transporte"), "Ônibus", 220.0, 198.4),
            row("lazer", None, "Lazer", 300.0, 120.0),
            income("receitas", None, "Salários", 0.0),
            income("salario", Some("receitas"), "Salário", 5000.0),
            income("bonus", Some("receitas"), "Bônus", 750.0),
        ]
    }

    #[test]
    fn test_example_scenario() {
        let rows = vec![
            row("A", None, "Moradia", 0.0, 0.0),
            row("B", Some("A"), "Aluguel", 100.0, 80.0),
            row("C", Some("A"), "Água", 50.0, 50.0),
        ];

        let forest = build_category_tree(&rows).unwrap();

        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.id, "A");
        assert_eq!(root.planned, 150.0);
        assert_eq!(root.realized, 130.0);
        assert_eq!(names(&root.children), vec!["Água", "Aluguel"]);
        assert_eq!(root.children[0].id, "C");
        assert_eq!(root.children[1].id, "B");
    }

    #[test]
    fn test_sum_invariant_holds_at_every_level() {
        let forest = build_category_tree(&sample_rows()).unwrap();
        forest.iter().for_each(assert_sums);

        let moradia = forest.iter().find(|n| n.id == "moradia").unwrap();
        assert_eq!(moradia.planned, 1770.6);
        assert_eq!(moradia.realized, 1786.37);
        let contas = moradia.find("contas").unwrap();
        assert_eq!(contas.planned, 270.6);
        assert_eq!(contas.realized, 286.37);
    }

    #[test]
    fn test_conservation_of_leaf_values() {
        let rows = sample_rows();
        let forest = build_category_tree(&rows).unwrap();

        let parents: HashSet<&str> = rows.iter().filter_map(|r| r.parent_id.as_deref()).collect();
        let leaf_planned: f64 = rows
            .iter()
            .filter(|r| !parents.contains(r.category_id.as_str()))
            .map(|r| r.planned)
            .sum();
        let (planned, _) = totals(&forest);

        assert!((planned - round_cents(leaf_planned)).abs() < 0.005);
    }

    #[test]
    fn test_internal_input_values_are_ignored() {
        let rows = vec![
            row("p", None, "Parent", 999.0, 999.0),
            row("c", Some("p"), "Child", 10.0, 5.0),
        ];
        let forest = build_category_tree(&rows).unwrap();
        assert_eq!(forest[0].planned, 10.0);
        assert_eq!(forest[0].realized, 5.0);
    }

    #[test]
    fn test_partition_every_row_appears_once() {
        let rows = sample_rows();
        let forest = build_category_tree(&rows).unwrap();

        let ids = all_ids(&forest);
        assert_eq!(ids.len(), rows.len());
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), rows.len());
        assert_eq!(
            forest.iter().map(TreeNode::node_count).sum::<usize>(),
            rows.len()
        );
    }

    #[test]
    fn test_orphan_becomes_root() {
        let rows = vec![
            row("a", None, "Moradia", 0.0, 0.0),
            row("b", Some("missing"), "Órfã", 40.0, 10.0),
        ];
        let forest = build_category_tree(&rows).unwrap();

        assert_eq!(forest.len(), 2);
        let orphan = forest.iter().find(|n| n.id == "b").unwrap();
        assert_eq!(orphan.parent_id.as_deref(), Some("missing"));
        assert_eq!(orphan.planned, 40.0);
    }

    #[test]
    fn test_builder_keeps_input_order_before_sorting() {
        let rows = vec![
            row("z", None, "Zebra", 0.0, 0.0),
            row("a", None, "Abacate", 0.0, 0.0),
            row("z2", Some("z"), "Zz", 1.0, 0.0),
            row("z1", Some("z"), "Aa", 1.0, 0.0),
        ];
        let forest = build_forest(&index_rows(&rows)).unwrap();
        assert_eq!(names(&forest), vec!["Zebra", "Abacate"]);
        assert_eq!(names(&forest[0].children), vec!["Zz", "Aa"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let rows = vec![
            row("root", None, "Raiz", 0.0, 0.0),
            row("a", Some("b"), "A", 1.0, 0.0),
            row("b", Some("c"), "B", 1.0, 0.0),
            row("c", Some("a"), "C", 1.0, 0.0),
        ];
        let err = build_category_tree(&rows).unwrap_err();
        assert!(matches!(err, TreeError::CyclicHierarchy { .. }));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let rows = vec![row("a", Some("a"), "A", 1.0, 0.0)];
        assert_eq!(
            build_category_tree(&rows).unwrap_err(),
            TreeError::CyclicHierarchy {
                category_id: "a".into()
            }
        );
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let rows = vec![
            row("a", None, "Primeira", 10.0, 0.0),
            row("b", None, "Outra", 1.0, 0.0),
            row("a", None, "Segunda", 20.0, 0.0),
        ];
        let index = index_rows(&rows);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a").unwrap().name, "Segunda");

        let forest = build_forest(&index).unwrap();
        assert_eq!(names(&forest), vec!["Segunda", "Outra"]);
        assert_eq!(forest[0].planned, 20.0);
    }

    #[test]
    fn test_linkage_uses_category_id() {
        let mut parent = row("cat-1", None, "Moradia", 0.0, 0.0);
        parent.id = "prov-1".into();
        let mut child = row("cat-2", Some("cat-1"), "Aluguel", 100.0, 0.0);
        child.id = "prov-2".into();

        let forest = build_category_tree(&[parent, child]).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "prov-1");
        assert_eq!(forest[0].children[0].id, "prov-2");
        assert_eq!(forest[0].planned, 100.0);
    }

    #[test]
    fn test_rounding_removes_float_artifacts() {
        let rows = vec![
            row("p", None, "P", 0.0, 0.0),
            row("a", Some("p"), "A", 0.1, 0.0),
            row("b", Some("p"), "B", 0.2, 0.0),
        ];
        let forest = build_category_tree(&rows).unwrap();
        assert_eq!(forest[0].planned, 0.3);
        assert_eq!(round_cents(-12.345678), -12.35);
    }

    #[test]
    fn test_sort_orders_every_level() {
        let forest = build_category_tree(&sample_rows()).unwrap();
        assert_eq!(
            names(&forest),
            vec!["Lazer", "Moradia", "Salários", "Transporte"]
        );
        let moradia = &forest[1];
        assert_eq!(names(&moradia.children), vec!["Aluguel", "Contas"]);
        assert_eq!(names(&moradia.children[1].children), vec!["Água", "Luz"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let once = build_category_tree(&sample_rows()).unwrap();
        let twice = sort_forest(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_keeps_input_order_for_exact_ties() {
        let rows = vec![
            row("2", None, "mercado", 0.0, 0.0),
            row("1", None, "Mercado", 0.0, 0.0),
        ];
        let forest = build_category_tree(&rows).unwrap();
        assert_eq!(forest[0].id, "2");
        assert_eq!(forest[1].id, "1");
    }

    #[test]
    fn test_filter_by_type() {
        let forest = build_category_tree(&sample_rows()).unwrap();
        let total = all_ids(&forest).len();

        let incomes = filter_by_type(forest.clone(), CategoryType::Income);
        assert_eq!(names(&incomes), vec!["Salários"]);
        assert_eq!(names(&incomes[0].children), vec!["Bônus", "Salário"]);
        assert_eq!(incomes[0].planned, 5750.0);

        let expenses = filter_by_type(forest, CategoryType::Expense);
        assert!(expenses
            .iter()
            .all(|n| n.category_type == CategoryType::Expense));
        assert_eq!(
            all_ids(&incomes).len() + all_ids(&expenses).len(),
            total
        );
    }

    #[test]
    fn test_filter_does_not_filter_children() {
        let rows = vec![
            row("root", None, "Misturado", 0.0, 0.0),
            income("child", Some("root"), "Reembolso", 10.0),
        ];
        let forest = build_category_tree(&rows).unwrap();
        let expenses = filter_by_type(forest, CategoryType::Expense);
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].children.len(), 1);
    }

    #[test]
    fn test_rebuilding_is_independent() {
        let rows = sample_rows();
        let first = build_category_tree(&rows).unwrap();
        let second = build_category_tree(&rows).unwrap();
        let _ = filter_by_type(first.clone(), CategoryType::Income);
        assert_eq!(first, second);
        assert_eq!(rows, sample_rows());
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let forest = build_category_tree(&sample_rows()).unwrap();
        let expenses = filter_by_type(forest, CategoryType::Expense);

        let collapsed = visible_rows(&expenses, &ExpansionState::new());
        assert_eq!(collapsed.len(), 3);
        assert!(collapsed.iter().all(|r| r.depth == 0));

        let state = ExpansionState::new().toggle("moradia");
        let rows = visible_rows(&expenses, &state);
        let shown: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(shown, vec!["Lazer", "Moradia", "Aluguel", "Contas", "Transporte"]);
        assert_eq!(rows[2].depth, 1);
        assert!(rows[3].has_children);
        assert!(!rows[3].expanded);

        let all = ExpansionState::new().expand_all(all_ids(&expenses));
        assert_eq!(visible_rows(&expenses, &all).len(), all_ids(&expenses).len());
    }

    #[test]
    fn test_empty_input() {
        let forest = build_category_tree(&[]).unwrap();
        assert!(forest.is_empty());
        assert_eq!(totals(&forest), (0.0, 0.0));
    }
}
