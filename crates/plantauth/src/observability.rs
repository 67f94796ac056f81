//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{AuthzError, AuthzResult};

/// Install a fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. If the embedding
/// application already installed a global subscriber, that one is kept.
///
/// # Errors
///
/// Returns `AuthzError::Configuration` if the filter does not parse.
pub fn init_tracing(level: &str) -> AuthzResult<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|d| !d.trim().is_empty());
    let filter = build_filter(directives.as_deref().unwrap_or(level))?;

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("global subscriber already set, keeping it");
    }
    Ok(())
}

fn build_filter(directives: &str) -> AuthzResult<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| AuthzError::configuration(format!("invalid log filter '{directives}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_levels_and_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("plantauth=debug,warn").is_ok());
    }

    #[test]
    fn test_filter_rejects_unknown_level() {
        let err = build_filter("plantauth=loud").unwrap_err();
        assert!(matches!(err, AuthzError::Configuration { .. }));
    }

    #[test]
    fn test_second_init_keeps_first_subscriber() {
        assert!(init_tracing("warn").is_ok());
        assert!(init_tracing("debug").is_ok());
    }
}
