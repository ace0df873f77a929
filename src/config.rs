//! Process configuration parsed from environment variables.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// `None` keeps profiles in memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Mount the `/api/dev/*` routes that drive the local identity provider.
    pub dev_routes: bool,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: Postgres URL; unset or empty selects the in-memory store
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `AUTHGATE_DEV_ROUTES`: boolean, default false
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT", DEFAULT_PORT)?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let db_max_connections = env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        let dev_routes = match std::env::var("AUTHGATE_DEV_ROUTES") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "AUTHGATE_DEV_ROUTES", value: raw })?,
            Err(_) => false,
        };

        Ok(Self { port, database_url, db_max_connections, dev_routes })
    }
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
