use anyhow::Result;

use crate::config::AppConfig;
use crate::database::Database;
use crate::services::TaskStore;

pub type SqliteTaskStore = TaskStore<Database>;

/// Open the task store backed by the database in the configured data directory.
pub fn open_store(config: &AppConfig) -> Result<SqliteTaskStore> {
    let database = Database::initialize(config)?;
    Ok(TaskStore::open(database))
}
