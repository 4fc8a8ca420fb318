use crate::errors::{LedgerError, LedgerResult};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pricing_base_url: String,
    pub pricing_timeout_secs: u64,
    pub data_dir: PathBuf,
    pub store_backend: StoreBackend,
    pub server_port: u16,
    pub dashboard_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> LedgerResult<Self> {
        dotenvy::dotenv().ok();

        let pricing_timeout_secs = env_var_or("PRICING_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| LedgerError::Config(format!("PRICING_TIMEOUT_SECS: {e}")))?;

        let server_port = env_var_or("SERVER_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| LedgerError::Config(format!("SERVER_PORT: {e}")))?;

        let store_backend = parse_backend(&env_var_or("STORE_BACKEND", "sqlite"))?;

        Ok(Self {
            pricing_base_url: env_var_or("PRICING_BASE_URL", "http://localhost:3001"),
            pricing_timeout_secs,
            data_dir: PathBuf::from(env_var_or("DATA_DIR", "data")),
            store_backend,
            server_port,
            dashboard_dir: PathBuf::from(env_var_or("DASHBOARD_DIR", "dashboard/dist")),
        })
    }
}

fn parse_backend(raw: &str) -> LedgerResult<StoreBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(StoreBackend::Sqlite),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(LedgerError::Config(format!(
            "STORE_BACKEND: expected sqlite or memory, got {other:?}"
        ))),
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!(parse_backend("sqlite").unwrap(), StoreBackend::Sqlite);
        assert_eq!(parse_backend(" Memory ").unwrap(), StoreBackend::Memory);
        assert!(matches!(parse_backend("redis"), Err(LedgerError::Config(_))));
    }
}
