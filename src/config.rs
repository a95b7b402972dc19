use anyhow::Result;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "meals.db";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_API_KEY_ENV_VAR: &str = "LLM_API_KEY";
pub const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub llm_base_url: String,
    /// Name of the environment variable holding the API key, not the key.
    pub api_key_env_var: String,
    pub default_model: String,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env_var: DEFAULT_API_KEY_ENV_VAR.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let llm_base_url = get("LLM_BASE_URL").unwrap_or(defaults.llm_base_url);
        if !(llm_base_url.starts_with("http://") || llm_base_url.starts_with("https://")) {
            anyhow::bail!("LLM_BASE_URL must be an http(s) URL, got '{}'", llm_base_url);
        }

        let export_dir = get("FRIDGE_CHEF_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);

        Ok(Self {
            db_path: get("FRIDGE_CHEF_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            llm_base_url,
            api_key_env_var: get("LLM_API_KEY_ENV").unwrap_or(defaults.api_key_env_var),
            default_model: get("FRIDGE_CHEF_MODEL").unwrap_or(defaults.default_model),
            export_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FRIDGE_CHEF_DB", "/tmp/food.db"),
            ("LLM_BASE_URL", "https://openrouter.ai/api/v1"),
            ("LLM_API_KEY_ENV", "OPENROUTER_API_KEY"),
            ("FRIDGE_CHEF_MODEL", "mistral"),
            ("FRIDGE_CHEF_EXPORT_DIR", "/tmp/exports"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/food.db"));
        assert_eq!(config.llm_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.api_key_env_var, "OPENROUTER_API_KEY");
        assert_eq!(config.default_model, "mistral");
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn blank_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[("FRIDGE_CHEF_MODEL", "  ")])).unwrap();
        assert_eq!(config.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = AppConfig::from_lookup(lookup_from(&[("LLM_BASE_URL", "localhost:11434")]));
        assert!(result.is_err());
    }
}
