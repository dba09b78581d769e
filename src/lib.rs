pub use tm_cli::cli;
pub use tm_cli::commands;
pub use tm_cli::config;
pub use tm_cli::logging;
pub use tm_cli::AppConfig;

pub use tm_core as core;
pub use tm_core::database as db;
pub use tm_core::model;
pub use tm_core::TaskStore;
