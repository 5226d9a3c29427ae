use crate::models::{College, Recommendation};

/// Clamp-and-move helper shared by the list screens.
fn moved(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let new = selected as isize + offset;
    new.clamp(0, len as isize - 1) as usize
}

/// The admin tool's list of existing colleges.
pub(crate) struct CollegeList {
    pub(crate) colleges: Vec<College>,
    pub(crate) selected: usize,
}

impl CollegeList {
    pub(crate) fn new(colleges: Vec<College>) -> Self {
        Self {
            colleges,
            selected: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&College> {
        self.colleges.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, self.colleges.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.colleges.len().saturating_sub(1);
    }

    /// Swap in a fresh list, keeping focus on `focus_id` when it survived.
    pub(crate) fn replace(&mut self, colleges: Vec<College>, focus_id: Option<i64>) {
        self.colleges = colleges;
        if let Some(id) = focus_id {
            if let Some(idx) = self.colleges.iter().position(|c| c.id == id) {
                self.selected = idx;
                return;
            }
        }
        if self.selected >= self.colleges.len() {
            self.selected = self.colleges.len().saturating_sub(1);
        }
    }
}

/// Recommender results plus the live name/location filter applied on top.
#[derive(Default)]
pub(crate) struct ResultsScreen {
    pub(crate) results: Vec<Recommendation>,
    pub(crate) filtered: Vec<Recommendation>,
    pub(crate) filter: String,
    pub(crate) selected: usize,
    /// Whether a search has run since the last clear; drives the
    /// "no colleges found" message.
    pub(crate) searched: bool,
}

impl ResultsScreen {
    pub(crate) fn set_results(&mut self, results: Vec<Recommendation>) {
        self.results = results;
        self.searched = true;
        self.selected = 0;
        self.apply_filter();
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set_filter(&mut self, filter: String) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn apply_filter(&mut self) {
        self.filtered = self
            .results
            .iter()
            .filter(|rec| rec.matches_text(&self.filter))
            .cloned()
            .collect();

        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, self.filtered.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }
}
