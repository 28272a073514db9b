use std::env;

/// Engine connection configuration.
///
/// Every field is independently overridable; [`Default`] gives the
/// documented default set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Engine host (default: "localhost")
    pub host: String,
    /// Engine port (default: 5432)
    pub port: u16,
    /// User name (default: "postgres")
    pub user: String,
    /// Password (default: empty)
    pub password: String,
    /// Database name (default: "postgres")
    pub database: String,
    /// TLS mode forwarded opaquely to the engine (default: "disable")
    pub sslmode: String,
}

impl ConnectionConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DB_HOST` - Engine host (default: "localhost")
    /// - `DB_PORT` - Engine port (default: 5432)
    /// - `DB_USER` - User name (default: "postgres")
    /// - `DB_PASSWORD` - Password (default: empty)
    /// - `DB_NAME` - Database name (default: "postgres")
    /// - `DB_SSLMODE` - TLS mode (default: "disable")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("DB_HOST").unwrap_or(defaults.host),
            port: env::var("DB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            user: env::var("DB_USER").unwrap_or(defaults.user),
            password: env::var("DB_PASSWORD").unwrap_or(defaults.password),
            database: env::var("DB_NAME").unwrap_or(defaults.database),
            sslmode: env::var("DB_SSLMODE").unwrap_or(defaults.sslmode),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            sslmode: "disable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.user, "postgres");
        assert_eq!(config.password, "");
        assert_eq!(config.database, "postgres");
        assert_eq!(config.sslmode, "disable");
    }

    // Single test so parallel execution never races on the env vars.
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        env::set_var("DB_HOST", "db.internal");
        env::set_var("DB_PORT", "6432");

        let config = ConnectionConfig::from_env();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6432);
        // Untouched fields keep their defaults
        assert_eq!(config.database, "postgres");

        env::set_var("DB_PORT", "not-a-port");
        assert_eq!(ConnectionConfig::from_env().port, 5432);

        env::remove_var("DB_HOST");
        env::remove_var("DB_PORT");
    }
}
