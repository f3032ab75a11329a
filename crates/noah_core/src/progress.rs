use std::collections::BTreeMap;

/// Per-file upload percentage, keyed by display name.
///
/// Two files with the same name share one entry; the last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressRecord {
    entries: BTreeMap<String, u8>,
}

impl ProgressRecord {
    pub fn set(&mut self, file_name: &str, percent: u8) {
        self.entries.insert(file_name.to_string(), percent.min(100));
    }

    /// Percentage for `file_name`, 0 when nothing was reported yet.
    pub fn get(&self, file_name: &str) -> u8 {
        self.entries.get(file_name).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_and_overwrites() {
        let mut record = ProgressRecord::default();
        record.set("a.zip", 40);
        record.set("a.zip", 250);
        assert_eq!(record.get("a.zip"), 100);
        assert_eq!(record.get("missing"), 0);
        assert_eq!(record.len(), 1);

        record.clear();
        assert!(record.is_empty());
    }
}
