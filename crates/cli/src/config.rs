pub use tm_core::config::*;

use crate::cli::Cli;

/// `--data-dir` takes precedence; otherwise the usual discovery applies.
pub fn from_cli(cli: &Cli) -> anyhow::Result<AppConfig> {
    AppConfig::discover(cli.data_dir.clone())
}
