use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = tm::cli::Cli::parse();
    tm::logging::init_tracing(cli.log_filter.as_deref())?;

    let config = tm::config::from_cli(&cli)?;
    let command = cli.command.clone().unwrap_or_default();
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    tm::commands::run(&config, command, &mut handle)?;

    Ok(())
}
