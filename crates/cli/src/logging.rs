use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber. `RUST_LOG` directives are layered on top of
/// `filter`. Safe to call more than once.
pub fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = filter.unwrap_or(DEFAULT_FILTER);
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("Invalid log directive '{}'", filter))?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directives() {
        assert!(init_tracing(Some("tm_core=loud")).is_err());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing(None).unwrap();
        init_tracing(Some("debug")).unwrap();
    }
}
