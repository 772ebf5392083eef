//! Which category nodes a view currently shows children for.
//!
//! The state is a plain value: every operation returns a new
//! [`ExpansionState`] and leaves the receiver untouched, so a view can compare
//! old and new values to decide whether to re-render. It knows nothing about
//! tree shape and accepts identifiers that match no node.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`.
    #[must_use]
    pub fn toggle(&self, id: &str) -> Self {
        let mut expanded = self.expanded.clone();
        if !expanded.remove(id) {
            expanded.insert(id.to_string());
        }
        Self { expanded }
    }

    /// Replace the state with exactly the given identifiers.
    #[must_use]
    pub fn expand_all<I, S>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expanded: ids.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn collapse_all(&self) -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    /// Parse the comma-separated form produced by [`ExpansionState::to_query`].
    /// Empty segments are skipped.
    pub fn from_query(value: &str) -> Self {
        let expanded = value
            .split(',')
            .filter(|part| !part.is_empty())
            .map(|part| {
                urlencoding::decode(part)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| part.to_string())
            })
            .collect();
        Self { expanded }
    }

    /// Encode as a comma-separated list of percent-encoded identifiers,
    /// suitable for an `expanded=` query parameter.
    pub fn to_query(&self) -> String {
        self.expanded
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let state = ExpansionState::new();
        assert!(state.is_empty());
        assert!(!state.is_expanded("a"));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let original = ExpansionState::new().toggle("a").toggle("b");
        let toggled = original.toggle("c");
        assert!(toggled.is_expanded("c"));
        assert_eq!(toggled.toggle("c"), original);

        let collapsed = original.toggle("a");
        assert!(!collapsed.is_expanded("a"));
        assert_eq!(collapsed.toggle("a"), original);
    }

    #[test]
    fn test_toggle_returns_new_value() {
        let before = ExpansionState::new();
        let after = before.toggle("a");
        assert!(!before.is_expanded("a"));
        assert!(after.is_expanded("a"));
    }

    #[test]
    fn test_expand_all_contains_every_id() {
        let ids = ["a", "b", "c"];
        let state = ExpansionState::new().toggle("z").expand_all(ids);
        for id in ids {
            assert!(state.is_expanded(id));
        }
        assert!(!state.is_expanded("z"), "expand_all replaces, not merges");
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn test_collapse_all() {
        let state = ExpansionState::new().expand_all(["a", "b"]).collapse_all();
        assert!(state.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_accepted() {
        let state = ExpansionState::new().toggle("does-not-exist");
        assert!(state.is_expanded("does-not-exist"));
    }

    #[test]
    fn test_query_encoding() {
        let state = ExpansionState::new().expand_all(["a,b", "c d", "e"]);
        let query = state.to_query();
        assert!(!query.contains(' '));
        assert_eq!(ExpansionState::from_query(&query), state);
        assert_eq!(ExpansionState::from_query(""), ExpansionState::new());
        assert_eq!(ExpansionState::from_query(",,x,"), ExpansionState::new().toggle("x"));
    }
}
