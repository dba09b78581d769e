use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::due::{DueDate, DueDateError};

pub const DEFAULT_LIST_ID: &str = "default";
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

/// Lists present at first run, in display order. None of them can be deleted.
pub const BUILTIN_LISTS: [(&str, &str); 3] = [
    (DEFAULT_LIST_ID, DEFAULT_LIST_NAME),
    ("personal", "Personal"),
    ("work", "Work"),
];

pub fn is_builtin_list(id: &str) -> bool {
    BUILTIN_LISTS.iter().any(|(builtin, _)| *builtin == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub name: String,
}

impl TaskList {
    pub fn builtins() -> Vec<TaskList> {
        BUILTIN_LISTS
            .iter()
            .map(|(id, name)| TaskList {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin_list(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub list_id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<DueDate>,
}

/// Display-only predicate over the active list's tasks. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub pending_count: usize,
    pub is_builtin: bool,
}

/// Result of a toggle. `completed` is the task's new state, or `false` when
/// no task matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: String,
    pub changed: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedList {
    pub id: String,
    pub removed_tasks: usize,
}

/// Why a validated mutation was not performed. State is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("List name cannot be empty")]
    EmptyName,
    #[error("Task text cannot be empty")]
    EmptyText,
    #[error("Built-in list '{0}' cannot be deleted")]
    BuiltInList(String),
    #[error("No list with id '{0}'")]
    UnknownList(String),
    #[error("No task with id '{0}'")]
    UnknownTask(String),
    #[error(transparent)]
    InvalidDueDate(#[from] DueDateError),
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn task(completed: bool) -> Task {
        Task {
            id: "task_1".into(),
            list_id: DEFAULT_LIST_ID.into(),
            text: "Water plants".into(),
            completed,
            due_date: None,
        }
    }

    #[rstest]
    #[case(Filter::All, false, true)]
    #[case(Filter::All, true, true)]
    #[case(Filter::Active, false, true)]
    #[case(Filter::Active, true, false)]
    #[case(Filter::Completed, false, false)]
    #[case(Filter::Completed, true, true)]
    fn filter_matches_completion(
        #[case] filter: Filter,
        #[case] completed: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(filter.matches(&task(completed)), expected);
    }

    #[test]
    fn builtins_are_seeded_in_order() {
        let ids: Vec<String> = TaskList::builtins().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["default", "personal", "work"]);
        assert!(is_builtin_list("work"));
        assert!(!is_builtin_list("list_01"));
    }

    #[test]
    fn task_uses_camel_case_on_the_wire() {
        let mut task = task(false);
        task.due_date = Some("2025-01-05T10:00".parse().unwrap());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "task_1",
                "listId": "default",
                "text": "Water plants",
                "completed": false,
                "dueDate": "2025-01-05T10:00"
            })
        );

        let undated: Task = serde_json::from_str(
            r#"{"id":"t","listId":"work","text":"x","completed":true,"dueDate":null}"#,
        )
        .unwrap();
        assert_eq!(undated.due_date, None);
        assert!(undated.completed);
    }

    #[test]
    fn filter_displays_its_cli_value() {
        for filter in Filter::value_variants() {
            let value = filter.to_possible_value().unwrap();
            assert_eq!(value.get_name(), filter.to_string());
        }
    }
}
