use serde::{Deserialize, Serialize};

/// Completed focus intervals for one user and calendar date, in completion
/// order. Each entry is the focus length in seconds at the time it finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    entries: Vec<u64>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, duration_secs: u64) {
        self.entries.push(duration_secs);
    }

    /// Number of completed focus sessions.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_secs(&self) -> u64 {
        self.entries.iter().sum()
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<u64> {
        self.entries
    }
}

impl From<Vec<u64>> for SessionLog {
    fn from(entries: Vec<u64>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_completion_order() {
        let mut log = SessionLog::new();
        log.push(1500);
        log.push(600);
        assert_eq!(log.entries(), &[1500, 600]);
        assert_eq!(log.count(), 2);
        assert_eq!(log.total_secs(), 2100);
    }

    #[test]
    fn serializes_as_plain_array() {
        let log = SessionLog::from(vec![1500, 1500]);
        assert_eq!(serde_json::to_string(&log).unwrap(), "[1500,1500]");
    }
}
