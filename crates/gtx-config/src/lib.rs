//! Configuration loading for the GTX order client.
//!
//! A configuration file is TOML with `${VAR}` placeholders (optionally
//! `${VAR:-default}`). Loading substitutes the placeholders, checks the
//! structure against [`GtxConfigSchema`], deserializes into [`GtxConfig`],
//! applies `GTX_*` environment overrides and finally checks cross references
//! between networks and tokens.

use gtx_types::{ConfigSchema, GtxConfig};
use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

mod schema;

pub use schema::GtxConfigSchema;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("placeholder pattern is valid")
});

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

impl From<gtx_types::ValidationError> for ConfigError {
	fn from(e: gtx_types::ValidationError) -> Self {
		ConfigError::ValidationError(e.to_string())
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "GTX_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<GtxConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		let config = self.parse(&content)?;
		tracing::debug!(
			path = %file_path,
			networks = config.chains.networks.len(),
			tokens = config.chains.tokens.len(),
			"Loaded configuration"
		);
		Ok(config)
	}

	/// Runs every loading step on configuration text.
	pub fn parse(&self, content: &str) -> Result<GtxConfig, ConfigError> {
		let substituted = self.substitute_env_vars(content)?;

		let raw: toml::Value =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;
		GtxConfigSchema.validate(&raw)?;

		let mut config: GtxConfig = raw
			.try_into()
			.map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut missing = None;

		let result = PLACEHOLDER.replace_all(content, |cap: &regex::Captures| {
			let var_name = &cap[1];
			match (env::var(var_name), cap.get(2)) {
				(Ok(value), _) => value,
				(Err(_), Some(default)) => default.as_str().to_string(),
				(Err(_), None) => {
					missing.get_or_insert_with(|| var_name.to_string());
					String::new()
				}
			}
		});

		match missing {
			Some(var_name) => Err(ConfigError::EnvVarNotFound(var_name)),
			None => Ok(result.into_owned()),
		}
	}

	fn apply_env_overrides(&self, config: &mut GtxConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.logging.level = log_level;
		}

		for (name, network) in config.chains.networks.iter_mut() {
			let var = format!(
				"{}RPC_URL_{}",
				self.env_prefix,
				name.to_uppercase().replace('-', "_")
			);
			if let Ok(rpc_url) = env::var(&var) {
				if !schema::is_http_url(&rpc_url) {
					return Err(ConfigError::ValidationError(format!(
						"{} must start with http:// or https://",
						var
					)));
				}
				tracing::debug!(network = %name, "RPC URL overridden from environment");
				network.rpc_url = Some(rpc_url);
			}
		}

		Ok(())
	}

	fn validate_config(&self, config: &GtxConfig) -> Result<(), ConfigError> {
		let chains = &config.chains;

		if chains.networks.is_empty() {
			return Err(ConfigError::ValidationError(
				"At least one network must be configured".to_string(),
			));
		}

		let mut domains = HashSet::new();
		for (name, network) in &chains.networks {
			if !domains.insert(network.domain) {
				return Err(ConfigError::ValidationError(format!(
					"Domain {} of network {} is used by another network",
					network.domain, name
				)));
			}
		}

		for (symbol, token) in &chains.tokens {
			if let Some(network) = token
				.addresses
				.keys()
				.find(|network| !chains.networks.contains_key(*network))
			{
				return Err(ConfigError::ValidationError(format!(
					"Token {} references unknown network {}",
					symbol, network
				)));
			}
		}

		if config.client.max_poll_secs < config.client.poll_interval_secs {
			return Err(ConfigError::ValidationError(
				"client.max_poll_secs must not be shorter than client.poll_interval_secs"
					.to_string(),
			));
		}

		Ok(())
	}
}
