use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Paginator configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorConfig {
    /// Upper bound on identifier values bound into the row-fetch query.
    /// SQL Server rejects statements with more than 2100 parameters.
    #[validate(range(
        min = 1,
        max = 2100,
        message = "Max identifier parameters must be between 1 and 2100"
    ))]
    pub max_identifier_parameters: usize,

    /// Per-query deadline applied around every executor call
    #[validate(range(
        min = 1,
        max = 3_600_000,
        message = "Query timeout must be between 1 ms and one hour"
    ))]
    pub query_timeout_ms: Option<u64>,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            max_identifier_parameters: 2100,
            query_timeout_ms: None,
        }
    }
}

impl PaginatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_identifier_parameters: parse_env_var(
                "PAGEWALKER_MAX_IDENTIFIER_PARAMETERS",
                "2100",
            )?,
            query_timeout_ms: parse_optional_env_var("PAGEWALKER_QUERY_TIMEOUT_MS")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this configuration
    pub fn with_overrides(mut self, cli: CliConfig) -> Result<Self, ConfigError> {
        if let Some(max) = cli.max_identifier_parameters {
            self.max_identifier_parameters = max;
        }
        if let Some(timeout) = cli.query_timeout_ms {
            self.query_timeout_ms = Some(timeout);
        }

        self.validate()?;
        Ok(self)
    }
}

/// CLI overrides (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub max_identifier_parameters: Option<usize>,
    pub query_timeout_ms: Option<u64>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

/// Parse an environment variable that may be unset
fn parse_optional_env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e| ConfigError::Parse {
            field: key.to_string(),
            value,
            source: Box::new(e),
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
