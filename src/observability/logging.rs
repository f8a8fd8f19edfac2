use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};
use crate::error::EngineError;

/// Installs the global tracing subscriber. Returns `Ok(false)` when one was
/// already installed (embedding host or an earlier call).
pub fn init(config: &Config) -> Result<bool, EngineError> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|err| {
        EngineError::Config(format!("invalid LOG_LEVEL {:?}: {err}", config.log_level))
    })?;

    let installed = match config.log_format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
    };

    Ok(installed.is_ok())
}
