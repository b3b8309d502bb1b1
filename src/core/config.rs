use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_database_url")]
    pub database_url: String,
    pub max_connections: Option<u32>,
    pub connection_timeout_seconds: Option<u64>,
}

impl StorageConfig {
    fn default_database_url() -> String {
        "sqlite://./data/multisig.db?mode=rwc".to_string()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: Self::default_database_url(),
            max_connections: Some(10),
            connection_timeout_seconds: Some(30),
        }
    }
}

/// Transaction-execution collaborator configuration.
///
/// The timeout is generous because create/execute calls trigger proof
/// construction and on-chain submission on the collaborator side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    #[serde(default = "CollaboratorConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "CollaboratorConfig::default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl CollaboratorConfig {
    fn default_base_url() -> String {
        "http://localhost:3005".to_string()
    }

    fn default_timeout_seconds() -> u64 {
        60
    }
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_seconds: Self::default_timeout_seconds(),
        }
    }
}

/// HTTP server bind configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub collaborator: CollaboratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.collaborator.timeout_seconds, 60);
        assert_eq!(config.server.port, 8080);
        assert!(config.storage.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig =
            toml::from_str("[collaborator]\nbase_url = \"http://miden:3005\"\n").unwrap();
        assert_eq!(config.collaborator.base_url, "http://miden:3005");
        assert_eq!(config.collaborator.timeout_seconds, 60);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
