//! Configuration for the retrieval gateway

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";
/// Config file looked up in the working directory when `GATEWAY_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "gateway.toml";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Bearer token gate
    pub auth: AuthConfig,
    /// Backend selection
    pub datastore: DatastoreConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
}

impl GatewayConfig {
    /// Load configuration from the TOML file (if any) and apply env overrides.
    ///
    /// The file is taken from `GATEWAY_CONFIG`, falling back to `gateway.toml`
    /// in the working directory; a missing default file is not an error.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `BEARER_TOKEN`, `DATASTORE`, `HOST` and `PORT` overrides
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BEARER_TOKEN") {
            self.auth.bearer_token = Some(token);
        }
        if let Some(backend) = lookup("DATASTORE") {
            self.datastore.backend = backend;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Check the settings the server cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.auth.token().is_none() {
            return Err(Error::Config(
                "A bearer token is required (set BEARER_TOKEN or auth.bearer_token)".to_string(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be greater than zero".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config(
                "embeddings.dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Directory served under `/.well-known` (disabled when unset)
    pub well_known_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            request_timeout_secs: 120,
            well_known_dir: None,
        }
    }
}

/// Bearer token configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// The single process-wide secret callers must present
    pub bearer_token: Option<String>,
}

impl AuthConfig {
    /// The configured token, ignoring blank values
    pub fn token(&self) -> Option<&str> {
        self.bearer_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// Backend name (`memory` or `local`)
    pub backend: String,
    /// Snapshot file used by the `local` backend
    pub storage_path: PathBuf,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retrieval-gateway")
            .join("chunks.json");

        Self {
            backend: "memory".to_string(),
            storage_path,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk before looking for a sentence boundary
    pub chunk_size: usize,
    /// A sentence boundary is only used to cut past this many characters
    pub min_chunk_size_chars: usize,
    /// Chunks this short or shorter are discarded
    pub min_chunk_length_to_embed: usize,
    /// Upper bound on chunks per document; the remainder becomes one last chunk
    pub max_num_chunks: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            min_chunk_size_chars: 350,
            min_chunk_length_to_embed: 5,
            max_num_chunks: 10_000,
        }
    }
}

/// Embedding provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local feature-hashing embedder
    #[default]
    Hash,
    /// Ollama embeddings API
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider backends use
    pub provider: EmbeddingProviderKind,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Ollama base URL
    pub base_url: String,
    /// Ollama embedding model
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            dimensions: 256,
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str(
            r#"
            [datastore]
            backend = "local"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.datastore.backend, "local");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.embeddings.provider, EmbeddingProviderKind::Hash);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("BEARER_TOKEN", "secret"), ("DATASTORE", "local"), ("PORT", "8123")]
                .into_iter()
                .collect();

        let mut config = GatewayConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.auth.token(), Some("secret"));
        assert_eq!(config.datastore.backend, "local");
        assert_eq!(config.server.port, 8123);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let config = GatewayConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = GatewayConfig::default();
        config.auth.bearer_token = Some("  ".to_string());
        assert!(config.validate().is_err());
    }
}
