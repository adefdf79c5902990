//! The backlog aggregate: a named, keyed collection of entries plus the
//! sort and display-scaling state, and its JSON document form.
//!
//! All entry lifecycle goes through this type (`add_entry` / `edit_entry` /
//! `delete_entry`), which keeps the map keys in sync with each entry's
//! normalized title. The JSON layout is the persisted interface contract:
//! top-level `name`, `entries`, `sortOrder`, `prioritySettings`.

use crate::models::{
    Column, Entry, PriorityLimits, PrioritySettings, SortOrder, entry_id,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_name() -> String {
    "The General Backlog".to_string()
}

/// The container of the backlog state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlog {
    /// Display label for the whole collection
    #[serde(default = "default_name")]
    pub(crate) name: String,

    /// Entries keyed by their normalized title (`entry_id(entry.title())`)
    #[serde(default)]
    pub(crate) entries: BTreeMap<String, Entry>,

    /// Active sort state
    #[serde(default, rename = "sortOrder")]
    pub(crate) sort_order: SortOrder,

    /// Display range for rescaled priorities
    #[serde(default, rename = "prioritySettings")]
    pub(crate) priority_settings: PrioritySettings,
}

impl Default for Backlog {
    fn default() -> Self {
        Self {
            name: default_name(),
            entries: BTreeMap::new(),
            sort_order: SortOrder::default(),
            priority_settings: PrioritySettings::default(),
        }
    }
}

impl Backlog {
    /// Create an empty backlog with default name, sort order, and settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the backlog. An empty name is rejected.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        self.name = name.to_string();
        Ok(())
    }

    /// The entry map, keyed by normalized title.
    pub fn entries(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn priority_settings(&self) -> PrioritySettings {
        self.priority_settings
    }

    /// Set the display range for rescaled priorities. Requires `min < max`.
    pub fn set_priority_settings(&mut self, min: f64, max: f64) -> Result<()> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(Error::InvalidInput(format!(
                "priority settings require min < max, got {} and {}",
                min, max
            )));
        }
        self.priority_settings = PrioritySettings { min, max };
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Membership test by canonical id.
    pub fn includes_entry(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up an entry by canonical id.
    pub fn get_entry(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Add a new entry.
    ///
    /// Returns `Ok(false)` without mutating when the normalized title is
    /// already taken (success-without-effect, not confirmation of
    /// insertion), `Ok(true)` on insert. Field validation errors propagate.
    pub fn add_entry(&mut self, title: &str, score: f64, duration: f64) -> Result<bool> {
        let entry = Entry::new(title, score, duration)?;
        let id = entry.id();
        if self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.entries.insert(id, entry);
        Ok(true)
    }

    /// Remove the entry with the given id. Absent ids are a no-op returning
    /// `false`.
    pub fn delete_entry(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Edit the entry at `id`, overwriting all three fields and re-keying
    /// the map when the title's normalized form changes.
    ///
    /// Fails with `NotFound` for an unknown id, and with `InvalidInput`
    /// when the new title normalizes to an id owned by a *different* entry.
    /// On any failure the collection is left unchanged; the re-key is
    /// atomic from the caller's point of view.
    pub fn edit_entry(
        &mut self,
        id: &str,
        new_title: &str,
        new_score: f64,
        new_duration: f64,
    ) -> Result<()> {
        if !self.entries.contains_key(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        let new_id = entry_id(new_title);
        if new_id != id && self.entries.contains_key(&new_id) {
            return Err(Error::InvalidInput(format!(
                "another entry already has the id '{}'",
                new_id
            )));
        }

        let mut entry = match self.entries.remove(id) {
            Some(entry) => entry,
            None => return Err(Error::NotFound(id.to_string())),
        };
        if let Err(e) = entry.edit(new_title, new_score, new_duration) {
            // Restore under the old key so a rejected edit is invisible
            self.entries.insert(id.to_string(), entry);
            return Err(e);
        }
        self.entries.insert(new_id, entry);
        Ok(())
    }

    /// The observed min/max raw priority across current entries.
    ///
    /// An empty collection yields the `{max: 0, min: 0}` sentinel rather
    /// than an unbounded value.
    pub fn priority_limits(&self) -> PriorityLimits {
        let mut priorities = self.entries.values().map(Entry::priority);
        let first = match priorities.next() {
            Some(p) => p,
            None => return PriorityLimits::default(),
        };
        priorities.fold(
            PriorityLimits { max: first, min: first },
            |limits, p| PriorityLimits {
                max: limits.max.max(p),
                min: limits.min.min(p),
            },
        )
    }

    /// Stable-sort entries by the requested column.
    ///
    /// Title orders lexicographically descending (the table's natural
    /// title order); the numeric columns order ascending. `reverse`
    /// reverses the result afterward. Entries with equal keys keep their
    /// input relative order.
    pub fn sort_entries(entries: &mut [&Entry], column: Column, reverse: bool) {
        match column {
            Column::Title => entries.sort_by(|a, b| b.title().cmp(a.title())),
            Column::Score => entries.sort_by(|a, b| a.score().total_cmp(&b.score())),
            Column::Duration => {
                entries.sort_by(|a, b| a.duration().total_cmp(&b.duration()))
            }
            Column::Priority => {
                entries.sort_by(|a, b| a.priority().total_cmp(&b.priority()))
            }
        }
        if reverse {
            entries.reverse();
        }
    }

    /// Current entries ordered by the live sort state.
    pub fn sorted_entries(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        Self::sort_entries(&mut entries, self.sort_order.column, self.sort_order.reverse);
        entries
    }

    /// Apply the sort toggle state machine: requesting the current column
    /// flips `reverse`; requesting a different column selects it and resets
    /// `reverse` to false. These are the only transitions.
    pub fn sort_by(&mut self, column: Column) {
        if column == self.sort_order.column {
            self.sort_order.reverse = !self.sort_order.reverse;
        } else {
            self.sort_order.column = column;
            self.sort_order.reverse = false;
        }
    }

    /// Serialize the full backlog to the pretty-printed JSON document form.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a backlog from its JSON document form.
    ///
    /// Typed construction with defaults: absent top-level fields take their
    /// default values; unknown columns, wrong types, mismatched entry keys,
    /// and zero durations reject the whole document. Nothing is applied
    /// until the document parses and validates (parse-then-swap is the
    /// caller's contract).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let backlog: Backlog = serde_json::from_str(json)?;
        backlog.validate()?;
        Ok(backlog)
    }

    /// Check the structural invariants of a deserialized document.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        if self.priority_settings.min >= self.priority_settings.max {
            return Err(Error::InvalidInput(
                "prioritySettings require min < max".to_string(),
            ));
        }
        for (key, entry) in &self.entries {
            if entry.title().trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "entry '{}' has an empty title",
                    key
                )));
            }
            if entry.duration() == 0.0 {
                return Err(Error::InvalidInput(format!(
                    "entry '{}' has a zero duration",
                    key
                )));
            }
            let expected = entry.id();
            if *key != expected {
                return Err(Error::InvalidInput(format!(
                    "entry key '{}' does not match its title (expected '{}')",
                    key, expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_backlog() -> Backlog {
        let mut backlog = Backlog::new();
        backlog.add_entry("Write report", 8.0, 2.0).unwrap();
        backlog.add_entry("Clean desk", 2.0, 4.0).unwrap();
        backlog
    }

    #[test]
    fn test_add_entry_inserts_under_normalized_id() {
        let backlog = sample_backlog();
        assert_eq!(backlog.len(), 2);
        assert!(backlog.includes_entry("write_report"));
        assert!(backlog.includes_entry("clean_desk"));
        assert_eq!(
            backlog.get_entry("write_report").unwrap().title(),
            "Write report"
        );
    }

    #[test]
    fn test_add_entry_duplicate_is_noop() {
        let mut backlog = sample_backlog();
        // Differs only in case and spacing; normalizes to the same id
        assert!(!backlog.add_entry("WRITE Report", 1.0, 1.0).unwrap());
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.get_entry("write_report").unwrap().score(), 8.0);
    }

    #[test]
    fn test_add_entry_validation() {
        let mut backlog = Backlog::new();
        assert!(backlog.add_entry("", 1.0, 1.0).is_err());
        assert!(backlog.add_entry("Task", 1.0, 0.0).is_err());
        assert!(backlog.is_empty());
    }

    #[test]
    fn test_delete_entry() {
        let mut backlog = sample_backlog();
        assert!(backlog.delete_entry("write_report"));
        assert_eq!(backlog.len(), 1);
        assert!(backlog.includes_entry("clean_desk"));
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut backlog = sample_backlog();
        assert!(!backlog.delete_entry("does_not_exist"));
        assert_eq!(backlog.len(), 2);
    }

    #[test]
    fn test_edit_entry_rekeys_on_rename() {
        let mut backlog = sample_backlog();
        backlog
            .edit_entry("write_report", "Draft Memo", 6.0, 3.0)
            .unwrap();

        assert!(!backlog.includes_entry("write_report"));
        let entry = backlog.get_entry("draft_memo").unwrap();
        assert_eq!(entry.title(), "Draft Memo");
        assert_eq!(entry.priority(), 2.0);
        assert_eq!(backlog.len(), 2);
    }

    #[test]
    fn test_edit_entry_same_title_succeeds() {
        let mut backlog = sample_backlog();
        backlog
            .edit_entry("write_report", "Write report", 10.0, 2.0)
            .unwrap();
        assert_eq!(backlog.get_entry("write_report").unwrap().priority(), 5.0);
    }

    #[test]
    fn test_edit_entry_case_change_keeps_id() {
        let mut backlog = sample_backlog();
        // New title normalizes to the entry's own id: not a collision
        backlog
            .edit_entry("write_report", "WRITE REPORT", 8.0, 2.0)
            .unwrap();
        assert_eq!(backlog.get_entry("write_report").unwrap().title(), "WRITE REPORT");
    }

    #[test]
    fn test_edit_entry_rejects_collision_with_other_entry() {
        let mut backlog = sample_backlog();
        let err = backlog.edit_entry("write_report", "Clean Desk", 8.0, 2.0);
        assert!(err.is_err());
        // Both entries intact under their original keys
        assert!(backlog.includes_entry("write_report"));
        assert!(backlog.includes_entry("clean_desk"));
        assert_eq!(backlog.get_entry("write_report").unwrap().title(), "Write report");
    }

    #[test]
    fn test_edit_entry_unknown_id_is_reported() {
        let mut backlog = sample_backlog();
        match backlog.edit_entry("missing", "Title", 1.0, 1.0) {
            Err(Error::NotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_entry_invalid_fields_leave_collection_unchanged() {
        let mut backlog = sample_backlog();
        assert!(backlog.edit_entry("write_report", "Renamed", 8.0, 0.0).is_err());
        assert!(backlog.includes_entry("write_report"));
        assert!(!backlog.includes_entry("renamed"));
        assert_eq!(backlog.get_entry("write_report").unwrap().duration(), 2.0);
    }

    #[test]
    fn test_priority_limits() {
        let backlog = sample_backlog();
        let limits = backlog.priority_limits();
        assert_eq!(limits.max, 4.0);
        assert_eq!(limits.min, 0.5);
    }

    #[test]
    fn test_priority_limits_empty_sentinel() {
        let backlog = Backlog::new();
        assert_eq!(backlog.priority_limits(), PriorityLimits { max: 0.0, min: 0.0 });
    }

    #[test]
    fn test_priority_limits_single_entry() {
        let mut backlog = Backlog::new();
        backlog.add_entry("Only", 6.0, 2.0).unwrap();
        let limits = backlog.priority_limits();
        assert_eq!(limits.max, 3.0);
        assert_eq!(limits.min, 3.0);
    }

    #[test]
    fn test_sort_entries_score_ascending_and_reverse() {
        let backlog = sample_backlog();
        let mut entries: Vec<&Entry> = backlog.entries().values().collect();

        Backlog::sort_entries(&mut entries, Column::Score, false);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Clean desk", "Write report"]);

        Backlog::sort_entries(&mut entries, Column::Score, true);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Write report", "Clean desk"]);
    }

    #[test]
    fn test_sort_entries_title_descending() {
        let mut backlog = sample_backlog();
        backlog.add_entry("Answer email", 1.0, 1.0).unwrap();
        let mut entries: Vec<&Entry> = backlog.entries().values().collect();

        Backlog::sort_entries(&mut entries, Column::Title, false);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Write report", "Clean desk", "Answer email"]);

        Backlog::sort_entries(&mut entries, Column::Title, true);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Answer email", "Clean desk", "Write report"]);
    }

    #[test]
    fn test_sort_entries_stable_for_equal_keys() {
        let a = Entry::new("First", 2.0, 1.0).unwrap();
        let b = Entry::new("Second", 2.0, 1.0).unwrap();
        let c = Entry::new("Third", 1.0, 1.0).unwrap();
        let mut entries = vec![&a, &b, &c];

        Backlog::sort_entries(&mut entries, Column::Score, false);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        // c first, then a and b in their original relative order
        assert_eq!(titles, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn test_sort_by_toggle_state_machine() {
        let mut backlog = Backlog::new();
        assert_eq!(backlog.sort_order().column, Column::Priority);
        assert!(!backlog.sort_order().reverse);

        // Same column flips reverse
        backlog.sort_by(Column::Priority);
        assert!(backlog.sort_order().reverse);
        backlog.sort_by(Column::Priority);
        assert!(!backlog.sort_order().reverse);

        // New column resets reverse
        backlog.sort_by(Column::Score);
        backlog.sort_by(Column::Score);
        assert!(backlog.sort_order().reverse);
        backlog.sort_by(Column::Title);
        assert_eq!(backlog.sort_order().column, Column::Title);
        assert!(!backlog.sort_order().reverse);
    }

    #[test]
    fn test_sorted_entries_follows_live_order() {
        let mut backlog = sample_backlog();
        backlog.sort_by(Column::Score); // was priority; now score ascending
        let titles: Vec<&str> = backlog.sorted_entries().iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Clean desk", "Write report"]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut backlog = sample_backlog();
        backlog.set_name("Sprint 12").unwrap();
        backlog.sort_by(Column::Score);
        backlog.set_priority_settings(10.0, 20.0).unwrap();

        let json = backlog.to_json_string_pretty().unwrap();
        let restored = Backlog::from_json_str(&json).unwrap();

        assert_eq!(restored, backlog);
    }

    #[test]
    fn test_json_document_layout() {
        let backlog = sample_backlog();
        let json = backlog.to_json_string_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "The General Backlog");
        assert_eq!(value["sortOrder"]["column"], "priority");
        assert_eq!(value["sortOrder"]["reverse"], false);
        assert_eq!(value["prioritySettings"]["min"], 0.0);
        assert_eq!(value["prioritySettings"]["max"], 100.0);
        assert_eq!(value["entries"]["write_report"]["title"], "Write report");
        assert_eq!(value["entries"]["write_report"]["score"], 8.0);
        assert_eq!(value["entries"]["write_report"]["duration"], 2.0);
        assert_eq!(value["entries"]["write_report"]["priority"], 4.0);
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let backlog = Backlog::from_json_str(r#"{"name": "Partial"}"#).unwrap();
        assert_eq!(backlog.name(), "Partial");
        assert!(backlog.is_empty());
        assert_eq!(backlog.sort_order(), SortOrder::default());
        assert_eq!(backlog.priority_settings(), PrioritySettings::default());
    }

    #[test]
    fn test_json_rejects_unknown_sort_column() {
        let json = r#"{"sortOrder": {"column": "deadline", "reverse": false}}"#;
        assert!(Backlog::from_json_str(json).is_err());
    }

    #[test]
    fn test_json_rejects_mismatched_entry_key() {
        let json = r#"{
            "entries": {
                "wrong_key": {"title": "Write report", "score": 8, "duration": 2, "priority": 4}
            }
        }"#;
        assert!(Backlog::from_json_str(json).is_err());
    }

    #[test]
    fn test_json_rejects_zero_duration_entry() {
        let json = r#"{
            "entries": {
                "task": {"title": "Task", "score": 8, "duration": 0, "priority": 4}
            }
        }"#;
        assert!(Backlog::from_json_str(json).is_err());
    }

    #[test]
    fn test_json_rejects_corrupt_document() {
        assert!(Backlog::from_json_str("not json at all").is_err());
        assert!(Backlog::from_json_str(r#"{"entries": []}"#).is_err());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut backlog = Backlog::new();

        backlog.add_entry("Write report", 8.0, 2.0).unwrap();
        assert_eq!(backlog.get_entry("write_report").unwrap().priority(), 4.0);

        backlog.add_entry("Clean desk", 2.0, 4.0).unwrap();
        assert_eq!(backlog.get_entry("clean_desk").unwrap().priority(), 0.5);

        let limits = backlog.priority_limits();
        assert_eq!((limits.max, limits.min), (4.0, 0.5));

        let mut entries: Vec<&Entry> = backlog.entries().values().collect();
        Backlog::sort_entries(&mut entries, Column::Priority, false);
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Clean desk", "Write report"]);

        backlog.delete_entry("write_report");
        assert_eq!(backlog.len(), 1);
        assert!(backlog.includes_entry("clean_desk"));
    }
}
