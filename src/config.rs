use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://dev.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
}

impl Config {
    /// Reads `DATABASE_URL` and `BIND_ADDR`, after loading `.env` if present.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("no .env loaded: {}", e);
        }
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(|_| None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".into()),
            "BIND_ADDR" => Some("0.0.0.0:8080".into()),
            _ => None,
        });
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }
}
