//! Tags and categories: name-unique reference entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A tag or category row: `{ id, name }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
}

impl Label {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

pub type Tag = Label;
pub type Category = Label;

/// Session-scoped list of labels, fetched once.
///
/// The UI selects labels by id; the filter endpoint wants names. The catalog
/// translates between the two.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: Vec<Label>,
}

impl LabelCatalog {
    pub fn new(mut labels: Vec<Label>) -> Self {
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Self { labels }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Label> {
        self.labels.iter().find(|label| label.id == id)
    }

    /// Names for the selected ids, in catalog order. Unknown ids are skipped.
    pub fn names_for(&self, ids: &BTreeSet<i64>) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| ids.contains(&label.id))
            .map(|label| label.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_for_skips_unknown_ids() {
        let catalog = LabelCatalog::new(vec![
            Label::new(2, "growth"),
            Label::new(1, "career"),
        ]);
        let ids: BTreeSet<i64> = [1, 2, 99].into_iter().collect();
        assert_eq!(catalog.names_for(&ids), vec!["career", "growth"]);
    }

    #[test]
    fn test_catalog_sorted_by_name() {
        let catalog = LabelCatalog::new(vec![Label::new(1, "zen"), Label::new(2, "art")]);
        let names: Vec<_> = catalog.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["art", "zen"]);
        assert_eq!(catalog.get(1).map(|l| l.name.as_str()), Some("zen"));
    }
}
