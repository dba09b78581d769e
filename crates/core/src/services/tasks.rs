use std::cmp::Ordering;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::due::{self, DueDate};
use crate::ids::{IdGenerator, UlidIds, LIST_PREFIX, TASK_PREFIX};
use crate::model::{
    is_builtin_list, DeleteResult, DeletedList, Filter, ListSummary, Outcome, Rejection,
    StatusUpdate, Task, TaskList, DEFAULT_LIST_ID, DEFAULT_LIST_NAME,
};
use crate::storage::{KeyValueStore, ACTIVE_LIST_KEY, LISTS_KEY, TASKS_KEY};

/// Draws allowed per new id before giving up on a generator that keeps
/// returning ids already in use.
const MAX_ID_ATTEMPTS: usize = 32;

/// In-memory lists and tasks with write-through persistence.
///
/// Every applied mutation writes lists, tasks and the active list id back to
/// `storage` before returning. Memory is updated first, so a failed write
/// leaves the new state queryable and reports the error to the caller.
/// Rejected mutations change nothing and write nothing.
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    clock: Box<dyn Clock + Send>,
    ids: Box<dyn IdGenerator + Send>,
    lists: Vec<TaskList>,
    tasks: Vec<Task>,
    active_list_id: String,
    filter: Filter,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load persisted state, falling back to the built-in lists, no tasks and
    /// the default list for anything missing or unreadable. Never writes.
    pub fn open(storage: S) -> Self {
        let lists = load_json::<Vec<TaskList>>(&storage, LISTS_KEY)
            .filter(|lists| !lists.is_empty())
            .unwrap_or_else(TaskList::builtins);
        let tasks = load_json::<Vec<Task>>(&storage, TASKS_KEY).unwrap_or_default();
        let stored_active = read_key(&storage, ACTIVE_LIST_KEY).filter(|id| !id.trim().is_empty());

        let mut store = Self {
            storage,
            clock: Box::new(SystemClock),
            ids: Box::new(UlidIds::new()),
            lists,
            tasks,
            active_list_id: DEFAULT_LIST_ID.to_string(),
            filter: Filter::default(),
        };

        store.active_list_id = match stored_active {
            Some(id) if store.has_list(&id) => id,
            Some(id) => {
                warn!(list_id = id.as_str(), "stored active list no longer exists");
                store.fallback_list_id()
            }
            None => store.fallback_list_id(),
        };

        debug!(
            lists = store.lists.len(),
            tasks = store.tasks.len(),
            active = store.active_list_id.as_str(),
            "task store opened"
        );
        store
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + Send + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // Mutations

    pub fn create_list(&mut self, name: &str) -> Result<Outcome<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Outcome::Rejected(Rejection::EmptyName));
        }

        let id = self.fresh_id(LIST_PREFIX)?;
        self.lists.push(TaskList {
            id: id.clone(),
            name: name.to_string(),
        });
        self.active_list_id = id.clone();
        self.persist()?;

        debug!(list_id = id.as_str(), "list created");
        Ok(Outcome::Applied(id))
    }

    /// Delete the active list together with its tasks. Built-in lists are
    /// refused on every call; confirming with the user is up to the caller.
    pub fn delete_active_list(&mut self) -> Result<Outcome<DeletedList>> {
        let id = self.active_list_id.clone();
        if is_builtin_list(&id) {
            return Ok(Outcome::Rejected(Rejection::BuiltInList(id)));
        }

        let before = self.tasks.len();
        self.tasks.retain(|task| task.list_id != id);
        let removed_tasks = before - self.tasks.len();
        self.lists.retain(|list| list.id != id);
        self.active_list_id = self.fallback_list_id();
        self.persist()?;

        debug!(list_id = id.as_str(), removed_tasks, "list deleted");
        Ok(Outcome::Applied(DeletedList { id, removed_tasks }))
    }

    /// Focus another list. The current filter is kept.
    pub fn switch_active_list(&mut self, id: &str) -> Result<Outcome<()>> {
        if !self.has_list(id) {
            return Ok(Outcome::Rejected(Rejection::UnknownList(id.to_string())));
        }

        self.active_list_id = id.to_string();
        self.persist()?;

        debug!(list_id = id, "active list switched");
        Ok(Outcome::Applied(()))
    }

    /// Append an incomplete task to the active list. Blank `due` means no deadline.
    pub fn add_task(&mut self, text: &str, due: Option<&str>) -> Result<Outcome<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Rejected(Rejection::EmptyText));
        }
        let due_date = match DueDate::parse_input(due) {
            Ok(due_date) => due_date,
            Err(err) => return Ok(Outcome::Rejected(err.into())),
        };
        if !self.has_list(&self.active_list_id) {
            return Ok(Outcome::Rejected(Rejection::UnknownList(
                self.active_list_id.clone(),
            )));
        }

        let id = self.fresh_id(TASK_PREFIX)?;
        self.tasks.push(Task {
            id: id.clone(),
            list_id: self.active_list_id.clone(),
            text: text.to_string(),
            completed: false,
            due_date,
        });
        self.persist()?;

        debug!(
            task_id = id.as_str(),
            list_id = self.active_list_id.as_str(),
            "task added"
        );
        Ok(Outcome::Applied(id))
    }

    /// Flip completion. Unknown ids are ignored so stale views can call this safely.
    pub fn toggle_task(&mut self, id: &str) -> Result<StatusUpdate> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(StatusUpdate {
                id: id.to_string(),
                changed: false,
                completed: false,
            });
        };
        task.completed = !task.completed;
        let completed = task.completed;
        self.persist()?;

        debug!(task_id = id, completed, "task toggled");
        Ok(StatusUpdate {
            id: id.to_string(),
            changed: true,
            completed,
        })
    }

    /// Replace text and due date together, or neither.
    pub fn edit_task(&mut self, id: &str, text: &str, due: Option<&str>) -> Result<Outcome<()>> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(Outcome::Rejected(Rejection::UnknownTask(id.to_string())));
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Rejected(Rejection::EmptyText));
        }
        let due_date = match DueDate::parse_input(due) {
            Ok(due_date) => due_date,
            Err(err) => return Ok(Outcome::Rejected(err.into())),
        };

        let task = &mut self.tasks[index];
        task.text = text.to_string();
        task.due_date = due_date;
        self.persist()?;

        debug!(task_id = id, "task edited");
        Ok(Outcome::Applied(()))
    }

    pub fn delete_task(&mut self, id: &str) -> Result<DeleteResult> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let deleted = self.tasks.len() < before;
        if deleted {
            self.persist()?;
            debug!(task_id = id, "task deleted");
        }

        Ok(DeleteResult {
            id: id.to_string(),
            deleted,
        })
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    // Queries

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn active_list_id(&self) -> &str {
        &self.active_list_id
    }

    pub fn active_list(&self) -> Option<&TaskList> {
        self.lists
            .iter()
            .find(|list| list.id == self.active_list_id)
    }

    pub fn active_list_name(&self) -> &str {
        self.active_list()
            .map(|list| list.name.as_str())
            .unwrap_or(DEFAULT_LIST_NAME)
    }

    pub fn current_filter(&self) -> Filter {
        self.filter
    }

    /// One entry per list in creation order, with its incomplete task count.
    pub fn list_summaries(&self) -> Vec<ListSummary> {
        self.lists
            .iter()
            .map(|list| ListSummary {
                id: list.id.clone(),
                name: list.name.clone(),
                is_active: list.id == self.active_list_id,
                pending_count: self
                    .tasks
                    .iter()
                    .filter(|task| task.list_id == list.id && !task.completed)
                    .count(),
                is_builtin: list.is_builtin(),
            })
            .collect()
    }

    /// Active list's tasks passing the current filter: incomplete first, then
    /// by due date with undated tasks last. Ties keep insertion order.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let mut visible: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.list_id == self.active_list_id && self.filter.matches(task))
            .cloned()
            .collect();
        visible.sort_by(display_order);
        visible
    }

    pub fn total_pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn is_overdue(&self, task: &Task) -> bool {
        !task.completed
            && task
                .due_date
                .is_some_and(|due| due.is_before(self.clock.now()))
    }

    pub fn format_due_date(&self, due: &DueDate) -> String {
        due.label(self.clock.now())
    }

    pub fn today_label(&self) -> String {
        due::day_heading(self.clock.now())
    }

    fn has_list(&self, id: &str) -> bool {
        self.lists.iter().any(|list| list.id == id)
    }

    fn fallback_list_id(&self) -> String {
        if self.has_list(DEFAULT_LIST_ID) {
            return DEFAULT_LIST_ID.to_string();
        }
        self.lists
            .first()
            .map(|list| list.id.clone())
            .unwrap_or_else(|| DEFAULT_LIST_ID.to_string())
    }

    fn fresh_id(&mut self, prefix: &str) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id(prefix);
            let taken = self.lists.iter().any(|list| list.id == id)
                || self.tasks.iter().any(|task| task.id == id);
            if !taken {
                return Ok(id);
            }
            debug!(id = id.as_str(), "generated id already in use");
        }
        bail!(
            "Id generator returned {} ids already in use for '{}'",
            MAX_ID_ATTEMPTS,
            prefix
        )
    }

    fn persist(&mut self) -> Result<()> {
        let lists = serde_json::to_string(&self.lists).context("Failed to encode lists")?;
        let tasks = serde_json::to_string(&self.tasks).context("Failed to encode tasks")?;
        self.storage
            .set_many(&[
                (LISTS_KEY, lists.as_str()),
                (TASKS_KEY, tasks.as_str()),
                (ACTIVE_LIST_KEY, self.active_list_id.as_str()),
            ])
            .context("Failed to persist task state")
    }
}

fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| due_sort_key(a).cmp(&due_sort_key(b)))
}

fn due_sort_key(task: &Task) -> (bool, Option<DueDate>) {
    (task.due_date.is_none(), task.due_date)
}

fn read_key<S: KeyValueStore>(storage: &S, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted value, using defaults");
            None
        }
    }
}

fn load_json<T: DeserializeOwned>(storage: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = read_key(storage, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "persisted value is malformed, using defaults");
            None
        }
    }
}
