use std::{env, net::SocketAddr};

use crate::error::AppError;

/// `DATABASE_URL` value that selects the in-memory entry store.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub retention_months: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://cabbuddy.db".to_string());

        let listen_addr = match (lookup("APP_LISTEN_ADDR"), lookup("PORT")) {
            (Some(addr), _) => addr
                .parse()
                .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|err| AppError::Config(format!("invalid PORT: {err}")))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([127, 0, 0, 1], 5000)),
        };

        let retention_months = match lookup("RETENTION_MONTHS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|months| *months >= 1)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "invalid RETENTION_MONTHS {raw:?}: expected a positive integer"
                    ))
                })?,
            None => 1,
        };

        Ok(Self {
            database_url,
            listen_addr,
            retention_months,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }
}
