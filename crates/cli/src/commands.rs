use std::fmt;
use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::cli::{
    AddArgs, CliCommand, DeleteArgs, DeleteListArgs, EditArgs, NewListArgs, ShowArgs,
    SwitchArgs, ToggleArgs,
};
use crate::config::AppConfig;
use crate::core::commands as core_commands;
use crate::core::{KeyValueStore, TaskStore};
use crate::model::{DeleteResult, Filter, Outcome, Task};

/// Open the store for `config` and run one command against it.
pub fn run<W: Write>(config: &AppConfig, command: CliCommand, writer: W) -> Result<()> {
    debug!(data_dir = %config.data_dir().display(), "opening task store");
    let mut store = core_commands::open_store(config)?;
    execute(&mut store, command, writer)
}

pub fn execute<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    command: CliCommand,
    mut writer: W,
) -> Result<()> {
    match command {
        CliCommand::Show(args) => handle_show(store, &args, &mut writer),
        CliCommand::Lists => handle_lists(store, &mut writer),
        CliCommand::NewList(args) => handle_new_list(store, &args, &mut writer),
        CliCommand::Switch(args) => handle_switch(store, &args, &mut writer),
        CliCommand::DeleteList(args) => handle_delete_list(store, &args, &mut writer),
        CliCommand::Add(args) => handle_add(store, &args, &mut writer),
        CliCommand::Toggle(args) => handle_toggle(store, &args, &mut writer),
        CliCommand::Edit(args) => handle_edit(store, &args, &mut writer),
        CliCommand::Delete(args) => handle_delete(store, &args, &mut writer),
        CliCommand::Pending => {
            writeln!(writer, "{}", store.total_pending_count())?;
            Ok(())
        }
    }
}

fn handle_show<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &ShowArgs,
    mut writer: W,
) -> Result<()> {
    store.set_filter(args.filter);

    writeln!(
        writer,
        "{} | {}",
        store.active_list_name(),
        store.today_label()
    )?;
    if store.current_filter() != Filter::All {
        writeln!(writer, "Filter: {}", store.current_filter())?;
    }

    let tasks = store.visible_tasks();
    if tasks.is_empty() {
        writeln!(writer, "No tasks here.")?;
    }
    for task in &tasks {
        writeln!(writer, "{}", task_line(store, task))?;
    }

    writeln!(writer, "{}", PendingLine(store.total_pending_count()))?;
    Ok(())
}

fn handle_lists<S: KeyValueStore, W: Write>(store: &TaskStore<S>, mut writer: W) -> Result<()> {
    for summary in store.list_summaries() {
        writeln!(
            writer,
            "{} {} ({}) {}",
            if summary.is_active { "*" } else { " " },
            summary.name,
            summary.id,
            summary.pending_count
        )?;
    }
    Ok(())
}

fn handle_new_list<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &NewListArgs,
    mut writer: W,
) -> Result<()> {
    let name = args.name.join(" ");
    match store.create_list(&name)? {
        Outcome::Applied(id) => writeln!(
            writer,
            "Created list '{}' ({})",
            store.active_list_name(),
            id
        )?,
        Outcome::Rejected(reason) => writeln!(writer, "Rejected: {reason}")?,
    }
    Ok(())
}

fn handle_switch<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &SwitchArgs,
    mut writer: W,
) -> Result<()> {
    match store.switch_active_list(&args.id)? {
        Outcome::Applied(()) => writeln!(writer, "Switched to '{}'", store.active_list_name())?,
        Outcome::Rejected(reason) => writeln!(writer, "Rejected: {reason}")?,
    }
    Ok(())
}

fn handle_delete_list<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &DeleteListArgs,
    mut writer: W,
) -> Result<()> {
    if !args.yes {
        writeln!(
            writer,
            "Deleting '{}' removes all of its tasks. Re-run with --yes to confirm.",
            store.active_list_name()
        )?;
        return Ok(());
    }

    let name = store.active_list_name().to_string();
    match store.delete_active_list()? {
        Outcome::Applied(deleted) => writeln!(
            writer,
            "Deleted list '{}' and {}",
            name,
            TaskCount(deleted.removed_tasks)
        )?,
        Outcome::Rejected(reason) => writeln!(writer, "Rejected: {reason}")?,
    }
    Ok(())
}

fn handle_add<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &AddArgs,
    mut writer: W,
) -> Result<()> {
    let text = args.text.join(" ");
    match store.add_task(&text, args.due.as_deref())? {
        Outcome::Applied(id) => writeln!(
            writer,
            "Added {} to '{}'",
            id,
            store.active_list_name()
        )?,
        Outcome::Rejected(reason) => writeln!(writer, "Rejected: {reason}")?,
    }
    Ok(())
}

fn handle_toggle<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &ToggleArgs,
    mut writer: W,
) -> Result<()> {
    let update = store.toggle_task(&args.id)?;
    if !update.changed {
        writeln!(writer, "Not found: {}", update.id)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} {}",
        if update.completed { "Completed" } else { "Reopened" },
        update.id
    )?;
    Ok(())
}

fn handle_edit<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &EditArgs,
    mut writer: W,
) -> Result<()> {
    let text = args.text.join(" ");
    match store.edit_task(&args.id, &text, args.due.as_deref())? {
        Outcome::Applied(()) => writeln!(writer, "Updated {}", args.id)?,
        Outcome::Rejected(reason) => writeln!(writer, "Rejected: {reason}")?,
    }
    Ok(())
}

fn handle_delete<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    args: &DeleteArgs,
    mut writer: W,
) -> Result<()> {
    let mut results = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        results.push(store.delete_task(id)?);
    }
    let summary = DeleteSummary::from_results(&results);
    summary.write_to(&mut writer)?;
    Ok(())
}

fn task_line<S: KeyValueStore>(store: &TaskStore<S>, task: &Task) -> String {
    let mut line = format!(
        "[{}] {}",
        if task.completed { "x" } else { " " },
        task.text
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!("  due {}", store.format_due_date(due)));
        if store.is_overdue(task) {
            line.push_str(" (overdue)");
        }
    }
    line.push_str(&format!("  <{}>", task.id));
    line
}

struct DeleteSummary {
    deleted: usize,
    missing: Vec<String>,
}

impl DeleteSummary {
    fn from_results(results: &[DeleteResult]) -> Self {
        let mut deleted = 0usize;
        let mut missing = Vec::new();
        for result in results {
            if result.deleted {
                deleted += 1;
            } else {
                missing.push(result.id.clone());
            }
        }
        Self { deleted, missing }
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        if self.deleted > 0 {
            writeln!(writer, "Deleted {}", TaskCount(self.deleted))?;
        } else {
            writeln!(writer, "No tasks deleted")?;
        }
        if !self.missing.is_empty() {
            writeln!(writer, "Not found: {}", self.missing.join(", "))?;
        }
        Ok(())
    }
}

struct TaskCount(usize);

impl fmt::Display for TaskCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} task{}", self.0, if self.0 == 1 { "" } else { "s" })
    }
}

struct PendingLine(usize);

impl fmt::Display for PendingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "Nothing pending"),
            count => write!(f, "{} pending across all lists", count),
        }
    }
}
