use ulid::{Generator, Ulid};

pub const LIST_PREFIX: &str = "list";
pub const TASK_PREFIX: &str = "task";

/// Produces identifiers for new lists and tasks, e.g. `task_01J9...`.
///
/// The store redraws when an id is already in use, but only a bounded number
/// of times, so a generator must eventually yield ids it has not handed out.
pub trait IdGenerator {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Monotonic ULIDs: strictly increasing within the process even when two ids
/// are requested in the same millisecond.
pub struct UlidIds {
    generator: Generator,
}

impl UlidIds {
    pub fn new() -> Self {
        Self {
            generator: Generator::new(),
        }
    }
}

impl Default for UlidIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for UlidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        // The monotonic counter only overflows after 2^80 ids in one millisecond.
        let ulid = self.generator.generate().unwrap_or_else(|_| Ulid::new());
        format!("{prefix}_{ulid}")
    }
}

/// Deterministic `prefix_1`, `prefix_2`, ... ids shared across prefixes.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    last: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.last += 1;
        format!("{prefix}_{}", self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ulid_ids_are_unique_and_prefixed() {
        let mut ids = UlidIds::new();
        let generated: Vec<String> = (0..500).map(|_| ids.next_id(TASK_PREFIX)).collect();
        let unique: HashSet<&String> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());
        assert!(generated.iter().all(|id| id.starts_with("task_")));
    }

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::starting_after(4);
        assert_eq!(ids.next_id(LIST_PREFIX), "list_5");
        assert_eq!(ids.next_id(TASK_PREFIX), "task_6");
    }
}
