//! Logging initialization
//!
//! - Json: structured logs for collectors
//! - Pretty: human-readable logs for development

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BenchmarkConfig, LogFormat};

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Returns false if a subscriber was already installed.
pub fn init_logging(config: &BenchmarkConfig) -> bool {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let installed = match config.log_format {
    LogFormat::Json => tracing_subscriber::registry()
      .with(env_filter)
      .with(
        fmt::layer()
          .json()
          .with_target(true)
          .with_writer(std::io::stdout),
      )
      .try_init(),
    LogFormat::Pretty => tracing_subscriber::registry()
      .with(env_filter)
      .with(
        fmt::layer()
          .with_target(true)
          .with_file(true)
          .with_line_number(true)
          .with_writer(std::io::stdout),
      )
      .try_init(),
  };

  installed.is_ok()
}
