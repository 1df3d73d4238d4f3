use crate::console::ColumnSource;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid store URL '{url}': {reason}")]
    InvalidStoreUrl { url: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Where the console's documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Process-local store, lost on exit.
    Memory,
    /// Process-local store persisted to a JSON snapshot file.
    File(PathBuf),
    /// Hosted store reached over HTTP.
    Http(String),
}

impl StoreLocation {
    /// Parses `memory://`, `file:///path/db.json` or `http(s)://host[:port][/prefix]`.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        let invalid = |reason: &str| ConfigError::InvalidStoreUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        if url == "memory://" || url == "memory" {
            return Ok(Self::Memory);
        }

        if let Some(path) = url.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid("file URL needs a path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }

        if let Some(rest) = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
        {
            if rest.is_empty() || rest.starts_with('/') {
                return Err(invalid("HTTP URL needs a host"));
            }
            return Ok(Self::Http(url.to_string()));
        }

        Err(invalid("expected memory://, file:// or http(s)://"))
    }

    pub fn to_url(&self) -> String {
        match self {
            StoreLocation::Memory => "memory://".to_string(),
            StoreLocation::File(path) => format!("file://{}", path.display()),
            StoreLocation::Http(url) => url.clone(),
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// Console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Document store to open
    pub store: StoreLocation,

    /// Listing column strategy
    pub column_source: ColumnSource,

    /// Lifetime of an admin session
    pub session_ttl: Duration,

    /// Credentials accepted while the admins collection is empty
    pub admin_username: String,
    pub admin_password: String,

    /// Timeout of a single HTTP store request
    pub request_timeout: Duration,

    /// Log destination of the terminal front end
    pub log_file: PathBuf,
}

impl ConsoleConfig {
    pub fn new(admin_username: &str, admin_password: &str) -> Self {
        Self {
            store: StoreLocation::Memory,
            column_source: ColumnSource::FirstRow,
            session_ttl: Duration::from_secs(8 * 60 * 60),
            admin_username: admin_username.to_string(),
            admin_password: admin_password.to_string(),
            request_timeout: Duration::from_secs(10),
            log_file: PathBuf::from("crowdconsole.log"),
        }
    }

    pub fn store(mut self, store: StoreLocation) -> Self {
        self.store = store;
        self
    }

    pub fn column_source(mut self, source: ColumnSource) -> Self {
        self.column_source = source;
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    /// Reads `CROWDCONSOLE_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let username = lookup("CROWDCONSOLE_ADMIN_USER").unwrap_or(defaults.admin_username);
        let password = lookup("CROWDCONSOLE_ADMIN_PASSWORD").unwrap_or(defaults.admin_password);
        let mut config = Self::new(&username, &password);

        if let Some(url) = lookup("CROWDCONSOLE_STORE") {
            config.store = StoreLocation::parse(&url)?;
        }

        if let Some(raw) = lookup("CROWDCONSOLE_COLUMNS") {
            config.column_source = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "CROWDCONSOLE_COLUMNS",
                reason,
            })?;
        }

        if let Some(raw) = lookup("CROWDCONSOLE_SESSION_TTL_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                key: "CROWDCONSOLE_SESSION_TTL_SECS",
                reason: err.to_string(),
            })?;
            config.session_ttl = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("CROWDCONSOLE_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_username.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "admin_username",
                reason: "cannot be empty".to_string(),
            });
        }

        if self.admin_password.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "admin_password",
                reason: "cannot be empty".to_string(),
            });
        }

        if self.session_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "session_ttl",
                reason: "must be > 0".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout",
                reason: "must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new("admin", "adminpass")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.store, StoreLocation::Memory);
        assert_eq!(config.column_source, ColumnSource::FirstRow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ConsoleConfig::new("ops", "secret")
            .store(StoreLocation::Http("http://db.internal:8088".to_string()))
            .column_source(ColumnSource::Schema)
            .session_ttl(Duration::from_secs(60))
            .log_file("/tmp/console.log");

        assert_eq!(config.store.to_url(), "http://db.internal:8088");
        assert_eq!(config.column_source, ColumnSource::Schema);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.log_file, PathBuf::from("/tmp/console.log"));
    }

    #[test]
    fn test_store_locations() {
        assert_eq!(StoreLocation::parse("memory://").unwrap(), StoreLocation::Memory);
        assert_eq!(
            StoreLocation::parse("file:///var/lib/crowd/db.json").unwrap(),
            StoreLocation::File(PathBuf::from("/var/lib/crowd/db.json"))
        );
        assert_eq!(
            StoreLocation::parse("https://store.example.com/v1").unwrap(),
            StoreLocation::Http("https://store.example.com/v1".to_string())
        );
    }

    #[test]
    fn test_invalid_store_locations() {
        assert!(StoreLocation::parse("postgres://localhost/db").is_err());
        assert!(StoreLocation::parse("file://").is_err());
        assert!(StoreLocation::parse("http://").is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[
            ("CROWDCONSOLE_STORE", "file://data/store.json"),
            ("CROWDCONSOLE_COLUMNS", "schema"),
            ("CROWDCONSOLE_SESSION_TTL_SECS", "90"),
            ("CROWDCONSOLE_ADMIN_USER", "ops"),
        ]))
        .unwrap();

        assert_eq!(config.store, StoreLocation::File(PathBuf::from("data/store.json")));
        assert_eq!(config.column_source, ColumnSource::Schema);
        assert_eq!(config.session_ttl, Duration::from_secs(90));
        assert_eq!(config.admin_username, "ops");
        assert_eq!(config.admin_password, "adminpass");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ConsoleConfig::from_lookup(lookup_from(&[("CROWDCONSOLE_SESSION_TTL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "CROWDCONSOLE_SESSION_TTL_SECS",
                ..
            }
        ));

        let err = ConsoleConfig::from_lookup(lookup_from(&[("CROWDCONSOLE_SESSION_TTL_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "session_ttl", .. }));
    }

    #[test]
    fn test_validate() {
        assert!(ConsoleConfig::new("", "pass").validate().is_err());
        assert!(ConsoleConfig::new("user", "").validate().is_err());
        assert!(
            ConsoleConfig::new("user", "pass")
                .request_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
