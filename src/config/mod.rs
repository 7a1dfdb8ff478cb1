#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{ApiError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENVIRONMENT: &str = "STAGE";
pub const ENVIRONMENT_VAR: &str = "ENV";
pub const CONFIG_PATH_VAR: &str = "HN_CONFIG";

/// Connection settings for one deployment of the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.3
}

impl EnvironmentConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl Validate for EnvironmentConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_positive_seconds("timeout", self.timeout)?;
        validation::validate_non_negative("backoff_factor", self.backoff_factor)?;
        Ok(())
    }
}

/// Every environment block of the config document, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiConfig {
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl ApiConfig {
    /// Reads and parses a TOML config document.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ApiError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ApiError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` placeholders; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ApiError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn environment_names(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }

    /// Looks up an environment block. Names compare case-insensitively.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        let requested = name.trim().to_uppercase();
        self.environments
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&requested))
            .map(|(_, env)| env)
            .ok_or_else(|| ApiError::UnknownEnvironment {
                requested,
                available: self.environment_names(),
            })
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        if self.environments.is_empty() {
            return Err(ApiError::ConfigError {
                message: "config defines no environments".to_string(),
            });
        }
        for (name, env) in &self.environments {
            validation::validate_non_empty_string("environment", name)?;
            env.validate().map_err(|e| match e {
                ApiError::InvalidConfigValue {
                    field,
                    value,
                    reason,
                } => ApiError::InvalidConfigValue {
                    field: format!("{}.{}", name, field),
                    value,
                    reason,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Environment selected through `ENV`, uppercased, `STAGE` when unset.
pub fn environment_name_from_env() -> String {
    std::env::var(ENVIRONMENT_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
        .trim()
        .to_uppercase()
}

/// Config document path: `HN_CONFIG`, else `config/config.toml` in the crate root.
pub fn config_path_from_env() -> PathBuf {
    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("config")
            .join("config.toml"),
    }
}

/// Resolves the environment block for this run from `.env`, `ENV` and `HN_CONFIG`.
/// Only the selected block is validated.
pub fn load_session_config() -> Result<EnvironmentConfig> {
    let _ = dotenvy::dotenv();
    let path = config_path_from_env();
    let env_name = environment_name_from_env();
    load_environment(&path, &env_name)
}

pub fn load_environment(path: &Path, env_name: &str) -> Result<EnvironmentConfig> {
    let config = ApiConfig::from_file(path)?;
    let selected = config.environment(env_name)?.clone();
    selected.validate()?;

    tracing::info!(
        environment = %env_name.to_uppercase(),
        base_url = %selected.base_url,
        timeout = selected.timeout,
        max_retries = selected.max_retries,
        "Loaded API configuration from {}",
        path.display()
    );

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[STAGE]
base_url = "https://hacker-news.firebaseio.com/v0/"
timeout = 10
max_retries = 3

[PROD]
base_url = "https://hacker-news.firebaseio.com/v0/"
timeout = 5.5
max_retries = 5
backoff_factor = 1.0
"#;

    #[test]
    fn test_parse_environments() {
        let config = ApiConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.environment_names(), vec!["PROD", "STAGE"]);
        let prod = config.environment("PROD").unwrap();
        assert_eq!(prod.timeout, 5.5);
        assert_eq!(prod.max_retries, 5);
        assert_eq!(prod.backoff_factor, 1.0);

        let stage = config.environment("STAGE").unwrap();
        assert_eq!(stage.timeout, 10.0);
        assert_eq!(stage.backoff_factor, 0.3);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let config = ApiConfig::from_toml_str(
            r#"
[LOCAL]
base_url = "http://127.0.0.1:9000/v0/"
"#,
        )
        .unwrap();

        let local = config.environment("LOCAL").unwrap();
        assert_eq!(local, &EnvironmentConfig::new("http://127.0.0.1:9000/v0/"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = ApiConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.environment("stage").is_ok());
        assert!(config.environment(" Prod ").is_ok());
    }

    #[test]
    fn test_unknown_environment_lists_available() {
        let config = ApiConfig::from_toml_str(SAMPLE).unwrap();
        let err = config.environment("qa").unwrap_err();

        match err {
            ApiError::UnknownEnvironment {
                requested,
                available,
            } => {
                assert_eq!(requested, "QA");
                assert_eq!(available, vec!["PROD", "STAGE"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ApiConfig::from_toml_str(
            r#"
[STAGE]
base_url = "not a url"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidConfigValue { ref field, .. } if field == "STAGE.base_url"
        ));
    }

    #[test]
    fn test_missing_base_url_is_parse_error() {
        let err = ApiConfig::from_toml_str("[STAGE]\ntimeout = 3\n").unwrap_err();
        assert!(matches!(err, ApiError::ConfigError { .. }));
    }

    #[test]
    #[serial]
    fn test_env_var_substitution() {
        std::env::set_var("HN_TEST_BASE_URL", "http://localhost:4010/v0/");

        let config = ApiConfig::from_toml_str(
            r#"
[STAGE]
base_url = "${HN_TEST_BASE_URL}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.environment("STAGE").unwrap().base_url,
            "http://localhost:4010/v0/"
        );

        std::env::remove_var("HN_TEST_BASE_URL");
    }

    #[test]
    #[serial]
    fn test_environment_name_defaults_to_stage() {
        std::env::remove_var(ENVIRONMENT_VAR);
        assert_eq!(environment_name_from_env(), "STAGE");

        std::env::set_var(ENVIRONMENT_VAR, "prod");
        assert_eq!(environment_name_from_env(), "PROD");

        std::env::remove_var(ENVIRONMENT_VAR);
    }

    #[test]
    fn test_load_environment_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(SAMPLE.as_bytes()).unwrap();

        let env = load_environment(temp_file.path(), "prod").unwrap();
        assert_eq!(env.max_retries, 5);

        let err = load_environment(temp_file.path(), "DEV").unwrap_err();
        assert!(err.to_string().contains("Available"));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = ApiConfig::from_file(
            Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("config")
                .join("config.toml"),
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.environment(DEFAULT_ENVIRONMENT).is_ok());
    }
}
