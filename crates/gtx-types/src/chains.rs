//! Static chain configuration.
//!
//! One [`ChainConfig`] describes every network an integration partner
//! deploys to: its bridging domain, router contract and RPC endpoint, plus
//! a token table keyed by symbol so the same asset can be found on each
//! network. The lifecycle client is parameterized with this struct instead
//! of carrying per-partner tables in code.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Router accessor that reports the domain the router believes it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainAccessor {
	/// `localDomain()`
	LocalDomain,
	/// `GTX_HOST_CHAIN_ID()`
	HostChainId,
}

impl DomainAccessor {
	/// The other accessor, tried when this one fails.
	pub fn alternate(self) -> Self {
		match self {
			DomainAccessor::LocalDomain => DomainAccessor::HostChainId,
			DomainAccessor::HostChainId => DomainAccessor::LocalDomain,
		}
	}

	pub fn function_name(self) -> &'static str {
		match self {
			DomainAccessor::LocalDomain => "localDomain",
			DomainAccessor::HostChainId => "GTX_HOST_CHAIN_ID",
		}
	}
}

/// A single network the client can originate or route orders through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
	/// Native chain id, used when building signing providers.
	pub chain_id: u64,
	/// Bridging domain from the static table.
	pub domain: u32,
	/// Router (settler) contract deployed on this network.
	pub router: Address,
	#[serde(default)]
	pub rpc_url: Option<String>,
	/// Set when the router exposes an authoritative domain accessor that
	/// should override `domain`.
	#[serde(default)]
	pub domain_accessor: Option<DomainAccessor>,
}

/// A token and its deployments, keyed by network name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
	pub decimals: u8,
	/// Token address per network. The zero address marks the native asset.
	pub addresses: HashMap<String, Address>,
}

/// Networks and tokens for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
	#[serde(default)]
	pub networks: HashMap<String, NetworkConfig>,
	#[serde(default)]
	pub tokens: HashMap<String, TokenConfig>,
}

impl ChainConfig {
	pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
		self.networks.get(name)
	}

	pub fn token(&self, symbol: &str) -> Option<&TokenConfig> {
		self.tokens.get(symbol)
	}

	/// Address of `symbol` on `network`, if it is deployed there.
	pub fn token_address(&self, symbol: &str, network: &str) -> Option<Address> {
		self.token(symbol)?.addresses.get(network).copied()
	}

	/// Reverse lookup of a token address on a network.
	pub fn symbol_for(&self, token: Address, network: &str) -> Option<&str> {
		self.tokens.iter().find_map(|(symbol, config)| {
			(config.addresses.get(network) == Some(&token)).then_some(symbol.as_str())
		})
	}

	/// Name of the network that uses `domain` in the static table.
	pub fn network_for_domain(&self, domain: u32) -> Option<&str> {
		self.networks
			.iter()
			.find_map(|(name, network)| (network.domain == domain).then_some(name.as_str()))
	}
}
