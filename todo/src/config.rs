use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

/// Server configuration.
///
/// Use the builder methods to customize, [`Default`] for local defaults, or
/// [`Config::from_env`] in deployments.
///
/// ```rust
/// use todo::Config;
///
/// let config = Config::default()
///     .with_port(9090)
///     .with_log_level("debug");
/// assert_eq!(config.addr().port(), 9090);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to listen on.
    /// Default: 0.0.0.0
    pub host: IpAddr,

    /// Default: 8080
    pub port: u16,

    /// Filter directive used when `RUST_LOG` is not set.
    /// Default: "info"
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads `TODO_HOST`, `TODO_PORT` (or `PORT`) and `TODO_LOG`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("TODO_HOST") {
            let host = value
                .parse()
                .map_err(|source| ConfigError::InvalidHost { value, source })?;
            config = config.with_host(host);
        }

        let port = lookup("TODO_PORT")
            .map(|v| ("TODO_PORT", v))
            .or_else(|| lookup("PORT").map(|v| ("PORT", v)));
        if let Some((key, value)) = port {
            let port = value
                .parse()
                .map_err(|source| ConfigError::InvalidPort { key, value, source })?;
            config = config.with_port(port);
        }

        if let Some(level) = lookup("TODO_LOG") {
            config = config.with_log_level(level);
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Set the listening port. Port 0 lets the OS pick one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = from(&[
            ("TODO_HOST", "127.0.0.1"),
            ("TODO_PORT", "3000"),
            ("TODO_LOG", "todo=debug"),
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.log_level, "todo=debug");
    }

    #[test]
    fn todo_port_wins_over_port() {
        assert_eq!(from(&[("PORT", "5000")]).unwrap().port, 5000);
        assert_eq!(
            from(&[("PORT", "5000"), ("TODO_PORT", "6000")]).unwrap().port,
            6000
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            from(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidPort { key: "PORT", .. })
        ));
        assert!(matches!(
            from(&[("TODO_HOST", "localhost:80")]),
            Err(ConfigError::InvalidHost { .. })
        ));
    }
}
