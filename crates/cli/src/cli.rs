use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Filter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tm",
    version,
    about = "Local task lists with due dates, kept in a single SQLite file.",
    after_help = "Examples:\n  tm                          Show the active list\n  tm add Buy milk --due 2099-01-01T10:00\n  tm show --filter active\n  tm new-list Groceries\n  tm delete-list --yes"
)]
pub struct Cli {
    /// Data directory (defaults to $TM_DATA_DIR, then the platform data dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter written to stderr (e.g. "info", "tm_core=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Show the active list's tasks (default command)
    Show(ShowArgs),
    /// Show every list with its pending count
    Lists,
    /// Create a list and make it active
    NewList(NewListArgs),
    /// Make another list active
    Switch(SwitchArgs),
    /// Delete the active list and all of its tasks
    DeleteList(DeleteListArgs),
    /// Add a task to the active list
    Add(AddArgs),
    /// Mark a task done, or undone if it already is
    Toggle(ToggleArgs),
    /// Replace a task's text and due date
    Edit(EditArgs),
    /// Delete one or more tasks by id
    Delete(DeleteArgs),
    /// Print the number of incomplete tasks across all lists
    Pending,
}

impl Default for CliCommand {
    fn default() -> Self {
        CliCommand::Show(ShowArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Narrow the view to active or completed tasks
    #[arg(long, value_enum, default_value_t = Filter::All)]
    pub filter: Filter,
}

#[derive(Args, Debug, Clone)]
pub struct NewListArgs {
    /// Display name for the new list
    #[arg(value_name = "NAME", required = true)]
    pub name: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SwitchArgs {
    /// Id of the list to focus (see `tm lists`)
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteListArgs {
    /// Confirm deleting the list together with its tasks
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task text
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,

    /// Due date (YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM or YYYY-MM-DD)
    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ToggleArgs {
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// Replacement text
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,

    /// Replacement due date; omitting it clears the existing one
    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// One or more task ids to delete (shown in brackets by `tm show`)
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,
}
