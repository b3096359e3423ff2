use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CocoonConfig {
    pub server: ServerConfig,
    pub vault: VaultConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub mirror: MirrorConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VaultConfig {
    pub root: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub max_top_k: usize,
    pub chunk_max_chars: usize,
}

/// Where note rows are mirrored after every write.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MirrorConfig {
    /// `"sqlite"`, `"rest"` or `"none"`.
    pub provider: String,
    pub url: String,
    pub api_key: String,
    pub table: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: default_cocoon_dir()
                .join("vaults")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_cocoon_dir()
                .join("index.db")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_cocoon_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_top_k: 20,
            chunk_max_chars: 500,
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            provider: "sqlite".into(),
            url: String::new(),
            api_key: String::new(),
            table: "vault_files".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            max_tokens: 512,
            temperature: 0.3,
        }
    }
}

/// Returns `~/.cocoon/`, or `./.cocoon` when no home directory is known.
pub fn default_cocoon_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cocoon")
}

/// Returns the default config file path: `~/.cocoon/config.toml`
pub fn default_config_path() -> PathBuf {
    default_cocoon_dir().join("config.toml")
}

impl CocoonConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CocoonConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("COCOON_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("COCOON_VAULT_ROOT") {
            self.vault.root = val;
        }
        if let Ok(val) = std::env::var("COCOON_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("COCOON_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid COCOON_PORT"),
            }
        }
        if let Ok(val) = std::env::var("COCOON_MIRROR_URL") {
            self.mirror.url = val;
        }
        if let Ok(val) = std::env::var("COCOON_MIRROR_KEY") {
            self.mirror.api_key = val;
        }
        if let Ok(val) = std::env::var("COCOON_LLM_API_KEY") {
            self.llm.api_key = val;
        }
    }

    /// Resolve the index database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the directory that holds every user's vault.
    pub fn resolved_vault_root(&self) -> PathBuf {
        expand_tilde(&self.vault.root)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CocoonConfig::default();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.chunk_max_chars, 500);
        assert_eq!(config.mirror.provider, "sqlite");
        assert_eq!(config.mirror.table, "vault_files");
        assert!(!config.llm.enabled);
        assert!(config.storage.db_path.ends_with("index.db"));
        assert!(config.vault.root.ends_with("vaults"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9000

[vault]
root = "/tmp/vaults"

[retrieval]
top_k = 5

[llm]
enabled = true
model = "mistral-small"
"#;
        let config: CocoonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.vault.root, "/tmp/vaults");
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.model, "mistral-small");
        // defaults still apply for unset fields
        assert_eq!(config.retrieval.chunk_max_chars, 500);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.max_tokens, 512);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CocoonConfig::default();
        std::env::set_var("COCOON_DB", "/tmp/override.db");
        std::env::set_var("COCOON_VAULT_ROOT", "/tmp/override-vaults");
        std::env::set_var("COCOON_PORT", "not-a-port");
        std::env::set_var("COCOON_LLM_API_KEY", "sk-test");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.vault.root, "/tmp/override-vaults");
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.llm.api_key, "sk-test");

        std::env::remove_var("COCOON_DB");
        std::env::remove_var("COCOON_VAULT_ROOT");
        std::env::remove_var("COCOON_PORT");
        std::env::remove_var("COCOON_LLM_API_KEY");
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/var/data"), PathBuf::from("/var/data"));
        assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
    }
}
