//! Provenance tracking for search results.

use std::sync::{Mutex, MutexGuard};

/// Ordered, deduplicated list of source labels.
///
/// The first occurrence of a label fixes its position. The list is only
/// cleared by [`SourceTracker::reset`].
#[derive(Debug, Default)]
pub struct SourceTracker {
    sources: Mutex<Vec<String>>,
}

impl SourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // The list is always left consistent, so a poisoned lock is still usable
        self.sources.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append labels not already present.
    pub fn extend<I>(&self, labels: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut sources = self.lock();
        for label in labels {
            if !sources.contains(&label) {
                sources.push(label);
            }
        }
    }

    /// Current labels, in first-seen order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let tracker = SourceTracker::new();
        tracker.extend(vec!["A".to_string(), "A".to_string(), "B".to_string()]);
        assert_eq!(tracker.snapshot(), vec!["A", "B"]);

        tracker.extend(vec!["C".to_string(), "A".to_string()]);
        assert_eq!(tracker.snapshot(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reset() {
        let tracker = SourceTracker::new();
        tracker.extend(vec!["A".to_string()]);
        tracker.reset();
        assert!(tracker.snapshot().is_empty());
    }
}
