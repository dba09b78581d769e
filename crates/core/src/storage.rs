use std::collections::HashMap;

use anyhow::Result;

pub const LISTS_KEY: &str = "lists";
pub const TASKS_KEY: &str = "tasks";
pub const ACTIVE_LIST_KEY: &str = "active-list";

/// String key-value persistence consumed by [`crate::TaskStore`].
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Write several keys. Implementations that can do so atomically should
    /// override this.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Process-local store. Nothing survives the value being dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_overwrites_keys() {
        let mut store = MemoryStore::new().with_entry(LISTS_KEY, "[]");
        assert_eq!(store.get(LISTS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get(TASKS_KEY).unwrap(), None);

        store
            .set_many(&[(LISTS_KEY, "[1]"), (ACTIVE_LIST_KEY, "work")])
            .unwrap();
        assert_eq!(store.get(LISTS_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get(ACTIVE_LIST_KEY).unwrap().as_deref(), Some("work"));
        assert_eq!(store.len(), 2);
    }
}
