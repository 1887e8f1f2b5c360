// ⚙️ Configuration - environment-driven settings
// STORAGE_TYPE selects the backend ("json" is the default, "sql" the
// relational store), with per-backend location variables and the auth
// secret alongside.

use std::env;
use std::path::PathBuf;

// ============================================================================
// STORAGE BACKEND SELECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Json,
    Sqlite,
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub json_path: PathBuf,
    pub db_path: PathBuf,
    pub secret_key: String,
    pub admin_password: String,
    pub demo_password: String,
    pub bind_addr: String,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let backend = match get("STORAGE_TYPE").unwrap_or_default().to_lowercase().as_str() {
            "sql" | "sqlite" => StorageBackend::Sqlite,
            _ => StorageBackend::Json,
        };

        Config {
            backend,
            json_path: get("JSON_FILE").unwrap_or_else(|| "konten.json".to_string()).into(),
            db_path: get("DB_FILE").unwrap_or_else(|| "bank_data.db".to_string()).into(),
            secret_key: get("BANK_SECRET_KEY")
                .unwrap_or_else(|| "fallback_local_only_123".to_string()),
            admin_password: get("ADMIN_PASSWORD").unwrap_or_else(|| "admin_dev_only".to_string()),
            demo_password: get("DEMO_PASSWORD").unwrap_or_else(|| "demo_dev_only".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.backend, StorageBackend::Json);
        assert_eq!(config.json_path, PathBuf::from("konten.json"));
        assert_eq!(config.db_path, PathBuf::from("bank_data.db"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_sql_backend_selection() {
        let config = config_from(&[("STORAGE_TYPE", "SQL"), ("DB_FILE", "/tmp/bank.db")]);
        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("/tmp/bank.db"));
    }

    #[test]
    fn test_unknown_backend_falls_back_to_json() {
        let config = config_from(&[("STORAGE_TYPE", "csv")]);
        assert_eq!(config.backend, StorageBackend::Json);
    }
}
