//! Read-only views of the per-class tallies.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTally {
    pub label: String,
    pub count: u64,
}

/// Per-class counts in the configured class order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallySnapshot {
    entries: Vec<ClassTally>,
}

impl TallySnapshot {
    pub(crate) fn new(entries: Vec<ClassTally>) -> Self {
        Self { entries }
    }

    /// Count for `label`, or `None` when the class is not being counted.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassTally> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text drawn on every frame, e.g. `Total Passed - Car: 3 | Truck: 1`.
    pub fn overlay_text(&self) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}: {}", capitalize(&e.label), e.count))
            .collect();
        format!("Total Passed - {}", parts.join(" | "))
    }
}

impl fmt::Display for TallySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.overlay_text())
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
