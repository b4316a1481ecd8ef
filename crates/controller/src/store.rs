//! Test-case checklist store
//!
//! Ordered store of the test cases accumulated across requirement
//! submissions. Order is insertion order and is meaningful: it determines
//! how the checklist is concatenated for downstream prompts.

use livecoder_common::{TestCase, TEST_CASE_DELIMITER};

/// Ordered mapping of test-case id to text and completion state
#[derive(Debug, Default)]
pub struct TestCaseStore {
    cases: Vec<TestCase>,
    next_id: u64,
}

impl TestCaseStore {
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a test case, assigning a fresh id
    pub fn add(&mut self, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.cases.push(TestCase {
            id,
            text: text.into(),
            completed: false,
        });
        id
    }

    /// Remove by id; no-op if absent
    pub fn remove(&mut self, id: u64) {
        self.cases.retain(|tc| tc.id != id);
    }

    /// Flip the completed flag; no-op if absent
    pub fn toggle(&mut self, id: u64) {
        if let Some(tc) = self.cases.iter_mut().find(|tc| tc.id == id) {
            tc.completed = !tc.completed;
        }
    }

    /// Split a delimiter-joined response body into trimmed non-empty
    /// entries and append each, preserving source order. Returns the
    /// assigned ids.
    pub fn add_many(&mut self, body: &str) -> Vec<u64> {
        body.split(TEST_CASE_DELIMITER)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| self.add(text))
            .collect()
    }

    /// Rejoin all entries with the delimiter, in store order, regardless of
    /// completion state
    pub fn concatenate(&self) -> String {
        self.cases
            .iter()
            .map(|tc| tc.text.as_str())
            .collect::<Vec<_>>()
            .join(TEST_CASE_DELIMITER)
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_monotonic_unique_ids() {
        let mut store = TestCaseStore::new();
        let a = store.add("has a button");
        let b = store.add("button says Login");
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn add_many_preserves_order_and_trims() {
        let mut store = TestCaseStore::new();
        let ids = store.add_many("  has a button /n button says Login/n/n  ");
        assert_eq!(ids.len(), 2);
        assert_eq!(store.cases()[0].text, "has a button");
        assert_eq!(store.cases()[1].text, "button says Login");
    }

    #[test]
    fn add_many_never_duplicates_ids_across_overlapping_calls() {
        let mut store = TestCaseStore::new();
        let first = store.add_many("has a button/nbutton says Login");
        let second = store.add_many("has a button/nbutton says Login");
        let mut all: Vec<u64> = first.iter().chain(second.iter()).copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn concatenate_round_trips_the_delimiter() {
        let text = "has a button/nbutton says Login/nno overflow on resize";
        let mut store = TestCaseStore::new();
        store.add_many(text);
        assert_eq!(store.concatenate(), text);
    }

    #[test]
    fn concatenate_ignores_completed_state() {
        let mut store = TestCaseStore::new();
        let id = store.add("has a button");
        store.add("button says Login");
        store.toggle(id);
        assert_eq!(store.concatenate(), "has a button/nbutton says Login");
    }

    #[test]
    fn toggle_missing_id_is_a_noop() {
        let mut store = TestCaseStore::new();
        store.add("has a button");
        let before: Vec<_> = store.cases().to_vec();
        store.toggle(999);
        assert_eq!(store.cases(), before.as_slice());
    }

    #[test]
    fn remove_missing_id_is_a_noop() {
        let mut store = TestCaseStore::new();
        store.add("has a button");
        store.remove(999);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut store = TestCaseStore::new();
        let a = store.add("first");
        let b = store.add("second");
        let c = store.add("third");
        store.remove(b);
        let ids: Vec<u64> = store.cases().iter().map(|tc| tc.id).collect();
        assert_eq!(ids, vec![a, c]);
    }
}
