//! Logging setup.

use tracing_subscriber::EnvFilter;

use kindred_core::config::GeneralConfig;

use crate::error::{CompanionError, Result};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.log_level`; an unparsable level falls back
/// to `info`. With `config.json_logs` every event is one JSON line.
///
/// # Errors
///
/// Returns [`CompanionError::Telemetry`] if a global subscriber is
/// already installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| CompanionError::Telemetry(e.to_string()))?;

    tracing::debug!(level = %config.log_level, json = config.json_logs, "Tracing initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        let config = GeneralConfig {
            log_level: "not a level!!".into(),
            json_logs: true,
        };
        assert!(init_tracing(&config).is_ok());
        assert!(matches!(
            init_tracing(&GeneralConfig::default()),
            Err(CompanionError::Telemetry(_))
        ));
    }
}
