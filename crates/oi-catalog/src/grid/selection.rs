use std::collections::BTreeSet;

use oi_core::ArticleRow;

/// Checkbox selection, tracked by row id so it survives re-sorting and
/// re-filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// Flips `id` and returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_owned());
            true
        }
    }

    pub fn select(&mut self, id: &str) {
        self.ids.insert(id.to_owned());
    }

    pub fn deselect(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drops ids that no longer name a row. Returns how many were dropped.
    pub fn retain_present(&mut self, rows: &[ArticleRow]) -> usize {
        let before = self.ids.len();
        let present: BTreeSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        self.ids.retain(|id| present.contains(id.as_str()));
        before - self.ids.len()
    }
}
