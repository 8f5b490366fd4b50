use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events follow the configured level; everything else stays at `warn`.
const PIPELINE_CRATES: &[&str] = &["hydra", "hydra_api"];

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directives: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directives, .. } => {
                write!(f, "invalid log filter '{directives}'")
            }
            TelemetryError::Subscriber(err) => write!(f, "unable to install subscriber: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directives for a bare level such as `debug`. A value that already
/// contains directives (`hydra::pipeline=trace`) is used as given.
pub fn directives_for(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    let mut directives = vec!["warn".to_string()];
    directives.extend(PIPELINE_CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = directives_for(&config.log_level);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Filter { directives, source })
}

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `APP_LOG_LEVEL`. Candidate transitions are logged with their module target
/// so the audit stream can be filtered on `hydra::pipeline`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_scopes_pipeline_crates() {
        assert_eq!(directives_for("debug"), "warn,hydra=debug,hydra_api=debug");
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            directives_for(" info,hydra::pipeline=trace "),
            "info,hydra::pipeline=trace"
        );
    }

    #[test]
    fn invalid_level_is_reported_with_directives() {
        let config = TelemetryConfig {
            log_level: "loud".to_string(),
        };
        let directives = directives_for(&config.log_level);
        let err = EnvFilter::try_new(&directives)
            .map_err(|source| TelemetryError::Filter {
                directives: directives.clone(),
                source,
            })
            .expect_err("not a level");
        assert!(err.to_string().contains("hydra=loud"));
    }
}
