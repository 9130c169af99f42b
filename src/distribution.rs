use std::collections::HashMap;

use serde::Serialize;

use crate::acquire::session::CompletedCapture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: u32,
    pub count: u32,
}

/// Occurrence count of each distinct sample value, in first-seen order.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub entries: Vec<ValueCount>,
    pub min_value: u32,
    pub max_value: u32,
}

impl Distribution {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The most frequent value; ties go to the one seen first.
    pub fn mode(&self) -> Option<ValueCount> {
        self.entries
            .iter()
            .copied()
            .reduce(|best, e| if e.count > best.count { e } else { best })
    }

    /// Sum of all counts; equals the number of records scanned.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.entries.iter().map(|e| e.count).max().unwrap_or(0)
    }

    pub fn get(&self, value: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.count)
    }

    /// Empirical probability of `value` (0.0 if never seen).
    pub fn probability(&self, value: u32) -> f64 {
        let total = self.total();
        match self.get(value) {
            Some(count) if total > 0 => count as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// Build the frequency table and value range in one pass.
pub fn build(capture: &CompletedCapture) -> Distribution {
    let mut entries: Vec<ValueCount> = Vec::new();
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut values = capture.values();

    // A completed capture is never empty.
    let first = values.next().unwrap_or_default();
    let mut min_value = first;
    let mut max_value = first;

    for value in std::iter::once(first).chain(values) {
        min_value = min_value.min(value);
        max_value = max_value.max(value);

        match index.get(&value) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(value, entries.len());
                entries.push(ValueCount { value, count: 1 });
            }
        }
    }

    Distribution {
        entries,
        min_value,
        max_value,
    }
}
