pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use tm_core as core;
pub use tm_core::database as db;
pub use tm_core::model;

pub use tm_core::AppConfig;
