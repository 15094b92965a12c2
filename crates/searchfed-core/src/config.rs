//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge compiled-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (nested keys split on `__`,
//! e.g. `APP_CLUSTER__NODES='["http://a:8983/solr/c"]'`). Every key has a
//! default, so a missing file is not an error.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load with config files resolved against `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("failed to extract settings: {}", e)))?;
        settings.validate()?;
        settings.validate_for_env(&self.env_name)?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cluster: ClusterSettings,
    pub search: SearchSettings,
    pub vector: VectorSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Ordered backend base URLs; order is both priority and rotation start.
    pub nodes: Vec<String>,
    pub ping_path: String,
    pub probe_timeout_ms: u64,
    pub status_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub select_path: String,
    pub suggest_path: String,
    pub search_timeout_ms: u64,
    pub suggest_timeout_ms: u64,
    pub default_rows: usize,
    pub body_max_chars: usize,
    pub highlight_fields: Vec<String>,
    pub highlight_pre: String,
    pub highlight_post: String,
    pub facet_fields: Vec<String>,
    pub facet_mincount: u32,
    pub debug_query: bool,
    pub escape_contains: bool,
    pub suggest_dictionary: String,
    pub suggest_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    pub field: String,
    pub min_top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: String,
    pub dimension: usize,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            nodes: vec![
                "http://localhost:8984/solr/search_collection".to_string(),
                "http://localhost:7574/solr/search_collection".to_string(),
            ],
            ping_path: "/admin/ping".to_string(),
            probe_timeout_ms: 5_000,
            status_timeout_ms: 5_000,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            select_path: "/select".to_string(),
            suggest_path: "/suggest".to_string(),
            search_timeout_ms: 10_000,
            suggest_timeout_ms: 5_000,
            default_rows: 10,
            body_max_chars: 300,
            highlight_fields: vec!["title".to_string(), "body".to_string()],
            highlight_pre: "<mark>".to_string(),
            highlight_post: "</mark>".to_string(),
            facet_fields: vec!["domain".to_string()],
            facet_mincount: 1,
            debug_query: true,
            escape_contains: false,
            suggest_dictionary: "mySuggester".to_string(),
            suggest_limit: 5,
        }
    }
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self { field: "embedding_vector".to_string(), min_top_k: 100 }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: "~/.cache/searchfed/all-MiniLM-L6-v2".to_string(), dimension: 384, max_len: 256, use_fake: false }
    }
}

impl ClusterSettings {
    pub fn probe_timeout(&self) -> Duration { Duration::from_millis(self.probe_timeout_ms) }
    pub fn status_timeout(&self) -> Duration { Duration::from_millis(self.status_timeout_ms) }
}

impl SearchSettings {
    pub fn search_timeout(&self) -> Duration { Duration::from_millis(self.search_timeout_ms) }
    pub fn suggest_timeout(&self) -> Duration { Duration::from_millis(self.suggest_timeout_ms) }
}

impl EmbeddingSettings {
    pub fn model_path(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.cluster.nodes.is_empty() {
            return Err(Error::InvalidConfig("cluster.nodes must list at least one backend".to_string()));
        }
        if let Some(blank) = self.cluster.nodes.iter().position(|n| n.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!("cluster.nodes[{}] is blank", blank)));
        }
        let timeouts = [
            ("cluster.probe_timeout_ms", self.cluster.probe_timeout_ms),
            ("cluster.status_timeout_ms", self.cluster.status_timeout_ms),
            ("search.search_timeout_ms", self.search.search_timeout_ms),
            ("search.suggest_timeout_ms", self.search.suggest_timeout_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be greater than zero", key)));
            }
        }
        if self.search.body_max_chars == 0 {
            return Err(Error::InvalidConfig("search.body_max_chars must be greater than zero".to_string()));
        }
        if self.vector.field.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.field must not be blank".to_string()));
        }
        Ok(())
    }

    pub fn validate_for_env(&self, env: &str) -> Result<()> {
        match env {
            "prod" | "production" => {
                if self.embedding.use_fake {
                    return Err(Error::InvalidConfig("embedding.use_fake is not allowed in production".to_string()));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn to_figment_err(e: anyhow::Error) -> figment::Error {
        figment::Error::from(e.to_string())
    }

    #[test]
    fn defaults_match_the_two_node_local_cluster() {
        let settings = Settings::default();
        assert_eq!(settings.cluster.nodes.len(), 2);
        assert_eq!(settings.cluster.probe_timeout(), Duration::from_secs(5));
        assert_eq!(settings.search.search_timeout(), Duration::from_secs(10));
        assert_eq!(settings.search.body_max_chars, 300);
        assert_eq!(settings.vector.min_top_k, 100);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        Jail::expect_with(|jail| {
            let config = Config::load_from(jail.directory()).map_err(to_figment_err)?;
            let settings = config.settings().map_err(to_figment_err)?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [cluster]
                nodes = ["http://a:8983/solr/c", "http://b:8983/solr/c", "http://c:8983/solr/c"]

                [search]
                body_max_chars = 120
                "#,
            )?;
            jail.set_env("RUST_ENV", "test");
            jail.create_file("config.test.toml", "[search]\nsuggest_limit = 9\n")?;
            jail.set_env("APP_VECTOR__MIN_TOP_K", "50");

            let config = Config::load_from(jail.directory()).map_err(to_figment_err)?;
            let settings = config.settings().map_err(to_figment_err)?;
            assert_eq!(settings.cluster.nodes.len(), 3);
            assert_eq!(settings.search.body_max_chars, 120);
            assert_eq!(settings.search.suggest_limit, 9);
            assert_eq!(settings.vector.min_top_k, 50);
            // untouched keys keep their defaults
            assert_eq!(settings.cluster.ping_path, "/admin/ping");
            let dictionary: String = config.get("search.suggest_dictionary").map_err(to_figment_err)?;
            assert_eq!(dictionary, "mySuggester");
            Ok(())
        });
    }

    #[test]
    fn empty_node_list_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[cluster]\nnodes = []\n")?;
            assert!(Config::load_from(jail.directory()).is_err());
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_and_zero_body_are_rejected() {
        let mut settings = Settings::default();
        settings.search.search_timeout_ms = 0;
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));

        let mut settings = Settings::default();
        settings.search.body_max_chars = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn fake_embeddings_refused_in_prod() {
        let mut settings = Settings::default();
        settings.embedding.use_fake = true;
        assert!(settings.validate_for_env("prod").is_err());
        assert!(settings.validate_for_env("dev").is_ok());
    }
}
