pub mod clock;
pub mod commands;
pub mod config;
pub mod database;
pub mod due;
pub mod ids;
pub mod model;
pub mod services;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{open_store, SqliteTaskStore};
pub use config::{AppConfig, DataDirSource};
pub use database::Database;
pub use due::DueDate;
pub use ids::{IdGenerator, SequentialIds, UlidIds};
pub use model::*;
pub use services::TaskStore;
pub use storage::{KeyValueStore, MemoryStore};
