//! Subscriber setup for binaries and tests.
//!
//! The library only emits `tracing` events; nothing is printed until the
//! embedding application installs a subscriber, for example with
//! [`init_logging`].
//!
//! ```
//! use tracing::Level;
//! use u_tidy::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::development().with_crate_level(Level::DEBUG);
//! assert_eq!(config.env_filter(), "debug,u_tidy=debug");
//! init_logging(config).unwrap();
//! ```

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{Result, TidyError};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for everything outside this crate.
    pub level: Level,
    /// Level for `u_tidy` events.
    pub crate_level: Level,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json_format: bool,
    /// Explicit filter directives, overriding both levels.
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            crate_level: Level::INFO,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LogConfig {
    /// Verbose, human-readable output.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            crate_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// Warnings only, as JSON.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            crate_level: Level::WARN,
            json_format: true,
            env_filter: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_crate_level(mut self, level: Level) -> Self {
        self.crate_level = level;
        self
    }

    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directives derived from this configuration.
    pub fn env_filter(&self) -> String {
        match &self.env_filter {
            Some(filter) => filter.clone(),
            None => format!(
                "{},u_tidy={}",
                self.level.as_str().to_lowercase(),
                self.crate_level.as_str().to_lowercase()
            ),
        }
    }
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over the configured directives. Returns
/// `Ok(false)` when a global subscriber was already installed.
///
/// # Errors
///
/// [`TidyError::InvalidConfiguration`] if the filter directives do not parse.
pub fn init_logging(config: LogConfig) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.env_filter())
            .map_err(|e| TidyError::config(format!("invalid log filter: {e}")))?,
    };

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok())
}
