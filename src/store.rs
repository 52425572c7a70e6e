use crate::error::TrackerError;
use serde::{Deserialize, Serialize};

pub const LABEL_SEPARATOR: &str = " - ";

/// Suffix appended to the label once a mount is obtained.
pub const OBTAINED_SUFFIX: &str = " ✅";

/// One tracked mount. Persists as a `[label, obtained]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, bool)", into = "(String, bool)")]
pub struct Entry {
    label: String,
    obtained: bool,
}

impl Entry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            obtained: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn obtained(&self) -> bool {
        self.obtained
    }

    /// Label with every obtained marker removed.
    pub fn base_label(&self) -> String {
        self.label.replace(OBTAINED_SUFFIX, "")
    }

    fn mark_obtained(&mut self) {
        if !self.label.ends_with(OBTAINED_SUFFIX) {
            self.label.push_str(OBTAINED_SUFFIX);
        }
        self.obtained = true;
    }

    fn reset(&mut self) {
        if self.label.contains(OBTAINED_SUFFIX) {
            self.label = self.base_label();
        }
        self.obtained = false;
    }
}

impl From<(String, bool)> for Entry {
    fn from((label, obtained): (String, bool)) -> Self {
        Self { label, obtained }
    }
}

impl From<Entry> for (String, bool) {
    fn from(entry: Entry) -> Self {
        (entry.label, entry.obtained)
    }
}

/// The four prompted fields that make up a mount label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountFields {
    pub mount: String,
    pub raid: String,
    pub difficulty: String,
    pub size: String,
}

impl MountFields {
    pub fn new(
        mount: impl Into<String>,
        raid: impl Into<String>,
        difficulty: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            mount: mount.into(),
            raid: raid.into(),
            difficulty: difficulty.into(),
            size: size.into(),
        }
    }

    fn label(&self) -> Result<String, TrackerError> {
        let parts = [
            ("mount name", self.mount.as_str()),
            ("raid name", self.raid.as_str()),
            ("difficulty", self.difficulty.as_str()),
            ("size", self.size.as_str()),
        ];
        if let Some((field, _)) = parts.iter().find(|(_, value)| value.is_empty()) {
            return Err(TrackerError::Validation { field: *field });
        }
        Ok(parts
            .iter()
            .map(|(_, value)| *value)
            .collect::<Vec<_>>()
            .join(LABEL_SEPARATOR))
    }
}

/// Ordered, in-memory list of tracked mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountStore {
    entries: Vec<Entry>,
}

impl MountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn add(&mut self, fields: &MountFields) -> Result<&Entry, TrackerError> {
        let label = fields.label()?;
        self.entries.push(Entry::new(label));
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    pub fn remove(&mut self, index: usize) -> Result<Entry, TrackerError> {
        self.check_index(index)?;
        Ok(self.entries.remove(index))
    }

    pub fn mark_obtained(&mut self, index: usize) -> Result<&Entry, TrackerError> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        entry.mark_obtained();
        Ok(entry)
    }

    pub fn reset_all(&mut self) {
        for entry in &mut self.entries {
            entry.reset();
        }
    }

    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn obtained_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.obtained).count()
    }

    /// Swaps in a freshly loaded list.
    pub fn replace(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }

    fn check_index(&self, index: usize) -> Result<(), TrackerError> {
        if self.entries.is_empty() {
            return Err(TrackerError::NoSelection);
        }
        if index >= self.entries.len() {
            return Err(TrackerError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ashes() -> MountFields {
        MountFields::new("Ashes of Al'ar", "Kael'thas Sunstrider", "Heroic", "25-man")
    }

    fn store_with(labels: &[&str]) -> MountStore {
        MountStore::from_entries(labels.iter().map(|label| Entry::new(*label)).collect())
    }

    #[test]
    fn add_joins_fields_and_starts_unobtained() {
        let mut store = MountStore::new();
        let entry = store.add(&ashes()).unwrap().clone();

        assert_eq!(
            entry.label(),
            "Ashes of Al'ar - Kael'thas Sunstrider - Heroic - 25-man"
        );
        assert!(!entry.obtained());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_appends_in_insertion_order_and_allows_duplicates() {
        let mut store = MountStore::new();
        store.add(&ashes()).unwrap();
        store
            .add(&MountFields::new("Invincible", "The Lich King", "Heroic", "25-man"))
            .unwrap();
        store.add(&ashes()).unwrap();

        let labels: Vec<&str> = store.list().iter().map(|entry| entry.label()).collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], labels[2]);
        assert!(labels[1].starts_with("Invincible"));
    }

    #[test]
    fn add_rejects_empty_field_without_mutation() {
        let mut store = store_with(&["Existing - Raid - Normal - 10-man"]);
        let before = store.clone();

        let err = store
            .add(&MountFields::new("Mimiron's Head", "Yogg-Saron", "", "25-man"))
            .unwrap_err();

        assert!(matches!(err, TrackerError::Validation { field: "difficulty" }));
        assert_eq!(store, before);
    }

    #[test]
    fn add_keeps_field_text_exactly() {
        let mut store = MountStore::new();
        let entry = store
            .add(&MountFields::new(" Fiery Warhorse ", "Karazhan", "Normal", "10-man"))
            .unwrap();
        assert_eq!(entry.label(), " Fiery Warhorse  - Karazhan - Normal - 10-man");

        let entry = store
            .add(&MountFields::new(" ", "Raid", "Normal", "10-man"))
            .unwrap();
        assert_eq!(entry.label(), "  - Raid - Normal - 10-man");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_drops_entry_and_keeps_relative_order() {
        let mut store = store_with(&["a", "b", "c", "d"]);

        let removed = store.remove(1).unwrap();

        assert_eq!(removed.label(), "b");
        let labels: Vec<&str> = store.list().iter().map(|entry| entry.label()).collect();
        assert_eq!(labels, vec!["a", "c", "d"]);
    }

    #[test]
    fn remove_reports_index_errors() {
        let mut empty = MountStore::new();
        assert!(matches!(empty.remove(0), Err(TrackerError::NoSelection)));

        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.remove(3),
            Err(TrackerError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mark_obtained_appends_marker_once() {
        let mut store = MountStore::new();
        store.add(&ashes()).unwrap();

        store.mark_obtained(0).unwrap();
        let once = store.clone();
        store.mark_obtained(0).unwrap();

        assert_eq!(store, once);
        let entry = store.get(0).unwrap();
        assert!(entry.obtained());
        assert_eq!(
            entry.label(),
            "Ashes of Al'ar - Kael'thas Sunstrider - Heroic - 25-man ✅"
        );
        assert_eq!(store.obtained_count(), 1);
    }

    #[test]
    fn mark_obtained_does_not_double_a_loaded_marker() {
        let mut store = MountStore::from_entries(vec![Entry::from((
            "Onyxian Drake - Onyxia's Lair - Normal - 25-man ✅".to_string(),
            false,
        ))]);

        store.mark_obtained(0).unwrap();

        let entry = store.get(0).unwrap();
        assert!(entry.obtained());
        assert_eq!(entry.label().matches("✅").count(), 1);
    }

    #[test]
    fn mark_obtained_restores_missing_marker_on_obtained_entry() {
        let mut store = MountStore::from_entries(vec![Entry::from((
            "Raven Lord - Sethekk Halls - Heroic - 5-man".to_string(),
            true,
        ))]);

        store.mark_obtained(0).unwrap();
        let once = store.clone();
        store.mark_obtained(0).unwrap();

        let entry = store.get(0).unwrap();
        assert!(entry.obtained());
        assert_eq!(entry.label(), "Raven Lord - Sethekk Halls - Heroic - 5-man ✅");
        assert_eq!(store, once);
    }

    #[test]
    fn mark_obtained_rejects_bad_index() {
        let mut store = store_with(&["a"]);
        assert!(store.mark_obtained(1).unwrap_err().is_index());
        assert!(!store.get(0).unwrap().obtained());
    }

    #[test]
    fn reset_all_undoes_marks_and_is_idempotent() {
        let mut store = MountStore::new();
        store.add(&ashes()).unwrap();
        store
            .add(&MountFields::new("Mimiron's Head", "Ulduar", "Normal", "25-man"))
            .unwrap();
        let original = store.clone();

        store.mark_obtained(0).unwrap();
        store.mark_obtained(1).unwrap();
        store.mark_obtained(0).unwrap();
        store.reset_all();
        assert_eq!(store, original);

        store.reset_all();
        assert_eq!(store, original);
        assert_eq!(store.obtained_count(), 0);
    }

    #[test]
    fn reset_all_strips_repeated_markers() {
        let mut store = MountStore::from_entries(vec![Entry::from((
            "Swift Zulian Tiger - Zul'Gurub - Normal - 20-man ✅ ✅".to_string(),
            true,
        ))]);

        store.reset_all();

        let entry = store.get(0).unwrap();
        assert_eq!(entry.label(), "Swift Zulian Tiger - Zul'Gurub - Normal - 20-man");
        assert!(!entry.obtained());
    }

    #[test]
    fn reset_all_strips_markers_inside_the_label() {
        let mut store = MountStore::from_entries(vec![Entry::from((
            "Reins of the Onyxian Drake ✅ - Onyxia's Lair - Normal - 25-man".to_string(),
            true,
        ))]);

        store.reset_all();

        let entry = store.get(0).unwrap();
        assert_eq!(entry.label(), "Reins of the Onyxian Drake - Onyxia's Lair - Normal - 25-man");
        assert!(!entry.label().contains('✅'));
        assert!(!entry.obtained());
    }

    #[test]
    fn scenario_add_obtain_reset() {
        let mut store = MountStore::new();
        store.add(&ashes()).unwrap();
        let base = "Ashes of Al'ar - Kael'thas Sunstrider - Heroic - 25-man";
        assert_eq!(store.list(), &[Entry::new(base)]);

        store.mark_obtained(0).unwrap();
        assert_eq!(store.get(0).unwrap().label(), format!("{base} ✅"));
        assert_eq!(store.get(0).unwrap().base_label(), base);

        store.reset_all();
        assert_eq!(store.list(), &[Entry::new(base)]);
    }

    #[test]
    fn entry_serializes_as_pair() {
        let entry = Entry::from(("Raven Lord - Sethekk Halls - Heroic - 5-man".to_string(), true));
        let raw = serde_json::to_string(&entry).unwrap();
        assert_eq!(raw, r#"["Raven Lord - Sethekk Halls - Heroic - 5-man",true]"#);
    }
}
