use serde::Deserialize;
use std::env;

/// Runtime settings for the admin server, read from the environment.
/// `DATABASE_URL` is optional; without it the store falls back to its
/// default SQLite file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        Ok(Self {
            server_port,
            database_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        env::remove_var("SERVER_PORT");
        env::remove_var("DATABASE_URL");
        let config = Config::from_env().unwrap();
        assert_eq!(config.server_port, "3000");
        assert!(config.database_url.is_none());
    }
}
