//! Configuration file model.

use crate::chains::ChainConfig;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtxConfig {
	#[serde(default)]
	pub client: ClientSettings,
	#[serde(default)]
	pub logging: LoggingConfig,
	#[serde(flatten)]
	pub chains: ChainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Tunables for the order lifecycle client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
	/// How long to wait for a receipt before reporting partial success.
	pub confirmation_timeout_secs: u64,
	/// Upper bound for each individual contract read.
	pub rpc_timeout_secs: u64,
	/// Extra approval attempts after the first one fails.
	pub approval_retries: u32,
	/// Gas payment used when both on-chain quote accessors fail.
	pub default_gas_payment_wei: u64,
	/// Fill deadline, relative to order creation.
	pub fill_deadline_secs: u64,
	pub poll_interval_secs: u64,
	pub max_poll_secs: u64,
	/// Hold a lock from nonce read to confirmation so concurrent orders from
	/// this client cannot pick the same nonce.
	pub serialize_submissions: bool,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			confirmation_timeout_secs: 60,
			rpc_timeout_secs: 5,
			approval_retries: 1,
			default_gas_payment_wei: 1_000_000_000_000_000,
			fill_deadline_secs: 3_600,
			poll_interval_secs: 10,
			max_poll_secs: 300,
			serialize_submissions: false,
		}
	}
}

impl ClientSettings {
	pub fn confirmation_timeout(&self) -> Duration {
		Duration::from_secs(self.confirmation_timeout_secs)
	}

	pub fn rpc_timeout(&self) -> Duration {
		Duration::from_secs(self.rpc_timeout_secs)
	}

	pub fn default_gas_payment(&self) -> U256 {
		U256::from(self.default_gas_payment_wei)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn max_poll_duration(&self) -> Duration {
		Duration::from_secs(self.max_poll_secs)
	}
}
