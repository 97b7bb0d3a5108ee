use std::sync::Once;

/// Logger configuration.
///
/// `filter` uses the `env_logger` directive syntax, e.g.
/// `"lazuli_engine=debug,warn"`. When unset, `RUST_LOG` is consulted, then
/// `default_level` applies.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Where the effective filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Explicit(String),
    Env(String),
    Level(log::LevelFilter),
}

fn resolve_filter(config: &LoggingConfig, env: Option<String>) -> FilterSource {
    match (&config.filter, env) {
        (Some(filter), _) => FilterSource::Explicit(filter.clone()),
        (None, Some(env)) if !env.trim().is_empty() => FilterSource::Env(env),
        _ => FilterSource::Level(config.default_level),
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match resolve_filter(&config, std::env::var("RUST_LOG").ok()) {
            FilterSource::Explicit(filter) | FilterSource::Env(filter) => {
                builder.parse_filters(&filter);
            }
            FilterSource::Level(level) => {
                builder.filter_level(level);
            }
        }
        builder.write_style(config.write_style);

        // Another logger may already be installed by the host application.
        if builder.try_init().is_err() {
            return;
        }
        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_env() {
        let config = LoggingConfig::default().with_filter("lazuli_engine=debug");
        assert_eq!(
            resolve_filter(&config, Some("warn".to_owned())),
            FilterSource::Explicit("lazuli_engine=debug".to_owned())
        );
    }

    #[test]
    fn env_is_used_when_no_filter_given() {
        let config = LoggingConfig::default();
        assert_eq!(
            resolve_filter(&config, Some("trace".to_owned())),
            FilterSource::Env("trace".to_owned())
        );
    }

    #[test]
    fn blank_env_falls_back_to_default_level() {
        let config = LoggingConfig {
            default_level: log::LevelFilter::Warn,
            ..LoggingConfig::default()
        };
        assert_eq!(
            resolve_filter(&config, Some("  ".to_owned())),
            FilterSource::Level(log::LevelFilter::Warn)
        );
        assert_eq!(
            resolve_filter(&config, None),
            FilterSource::Level(log::LevelFilter::Warn)
        );
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default().with_filter("debug"));
    }
}
