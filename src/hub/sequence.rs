use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter stamped on every task-updated broadcast.
///
/// Receivers keep the last sequence they applied and drop anything older, so
/// two reorders observed out of order settle on the later one. One counter
/// serves every project: numbers are increasing within each project, only not
/// contiguous, and nothing is kept per project.
#[derive(Debug, Default)]
pub struct ProjectSequencer {
    counter: AtomicU64,
}

impl ProjectSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number, starting at 1
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sequences_start_at_one_and_increase() {
        let sequencer = ProjectSequencer::new();
        assert_eq!(sequencer.next(), 1);
        assert_eq!(sequencer.next(), 2);
        assert_eq!(sequencer.next(), 3);
    }

    #[test]
    fn test_concurrent_callers_never_share_a_number() {
        let sequencer = Arc::new(ProjectSequencer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sequencer = sequencer.clone();
                std::thread::spawn(move || (0..250).map(|_| sequencer.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 1000);
        assert_eq!(seen.last(), Some(&1000));
    }
}
