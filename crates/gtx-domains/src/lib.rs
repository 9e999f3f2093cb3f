//! Network name to bridging domain and router resolution.
//!
//! The static [`ChainConfig`] is always the baseline. Networks whose router
//! exposes an authoritative domain accessor can be given a reader; the live
//! value is then preferred, reconciled against the static table and cached.
//! A failed live read is never fatal: resolution falls back to the table.

use alloy::primitives::Address;
use dashmap::DashMap;
use gtx_contracts::{ContractError, Fallback, RouterInterface};
use gtx_types::{ChainConfig, DomainAccessor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during domain resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
	#[error("Unknown network: {0}")]
	UnknownNetwork(String),
	#[error("No router configured for network {0}")]
	NoRouter(String),
}

/// Resolves domains, routers and token equivalents for configured networks.
pub struct DomainResolver {
	config: Arc<ChainConfig>,
	/// Routers that can be asked for their own domain, keyed by network.
	readers: HashMap<String, Arc<dyn RouterInterface>>,
	/// Live domains already confirmed on-chain.
	live: DashMap<String, u32>,
	read_timeout: Duration,
}

impl DomainResolver {
	pub fn new(config: Arc<ChainConfig>) -> Self {
		Self {
			config,
			readers: HashMap::new(),
			live: DashMap::new(),
			read_timeout: Duration::from_secs(5),
		}
	}

	/// Registers the router used for live domain reads on `network`.
	pub fn with_reader(mut self, network: impl Into<String>, reader: Arc<dyn RouterInterface>) -> Self {
		self.readers.insert(network.into(), reader);
		self
	}

	pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
		self.read_timeout = read_timeout;
		self
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	/// Returns the bridging domain for `network`.
	///
	/// Only an unknown network is an error. When the network declares a
	/// domain accessor and a reader is registered, the declared accessor is
	/// tried first, then the other one, then the static table.
	pub async fn resolve_domain(&self, network: &str) -> Result<u32, DomainError> {
		let net = self
			.config
			.network(network)
			.ok_or_else(|| DomainError::UnknownNetwork(network.to_string()))?;

		if let Some(cached) = self.live.get(network) {
			return Ok(*cached);
		}

		let (accessor, reader) = match (net.domain_accessor, self.readers.get(network)) {
			(Some(accessor), Some(reader)) => (accessor, reader),
			_ => return Ok(net.domain),
		};

		let resolved = Fallback::new("domain", net.domain)
			.with_timeout(self.read_timeout)
			.tier(accessor.function_name(), read_domain(reader.as_ref(), accessor))
			.tier(
				accessor.alternate().function_name(),
				read_domain(reader.as_ref(), accessor.alternate()),
			)
			.resolve()
			.await;

		if resolved.used_default() {
			// Not cached so the next call retries the router.
			return Ok(net.domain);
		}

		if resolved.value != net.domain {
			tracing::warn!(
				network = %network,
				configured = net.domain,
				live = resolved.value,
				"Router reports a different domain than configured, using live value"
			);
		}

		self.live.insert(network.to_string(), resolved.value);
		Ok(resolved.value)
	}

	/// Router address for `network` from the static table.
	pub fn resolve_router(&self, network: &str) -> Result<Address, DomainError> {
		let net = self
			.config
			.network(network)
			.ok_or_else(|| DomainError::UnknownNetwork(network.to_string()))?;

		if net.router == Address::ZERO {
			return Err(DomainError::NoRouter(network.to_string()));
		}
		Ok(net.router)
	}

	/// Whether the token with `symbol` is deployed on `network`.
	pub fn is_token_supported(&self, symbol: &str, network: &str) -> bool {
		self.config.token_address(symbol, network).is_some()
	}

	pub fn token_address(&self, symbol: &str, network: &str) -> Option<Address> {
		self.config.token_address(symbol, network)
	}

	/// Address on `to` of the token deployed at `token` on `from`.
	pub fn equivalent_token(&self, token: Address, from: &str, to: &str) -> Option<Address> {
		let symbol = self.config.symbol_for(token, from)?;
		self.config.token_address(symbol, to)
	}
}

async fn read_domain(
	reader: &dyn RouterInterface,
	accessor: DomainAccessor,
) -> Result<u32, ContractError> {
	let domain = match accessor {
		DomainAccessor::LocalDomain => reader.local_domain().await?,
		DomainAccessor::HostChainId => reader.host_chain_id().await?,
	};

	// An uninitialized router reports zero.
	if domain == 0 {
		return Err(ContractError::Read(format!(
			"{} returned 0",
			accessor.function_name()
		)));
	}
	Ok(domain)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{Bytes, B256, U256};
	use async_trait::async_trait;
	use gtx_contracts::StatusConstant;
	use gtx_types::{NetworkConfig, OnchainOrder, OrderId, TokenConfig, TxHash};
	use std::sync::atomic::{AtomicUsize, Ordering};

	/// Router that only answers the domain accessors.
	struct DomainReader {
		local_domain: Result<u32, ContractError>,
		host_chain_id: Result<u32, ContractError>,
		reads: AtomicUsize,
	}

	impl DomainReader {
		fn new(
			local_domain: Result<u32, ContractError>,
			host_chain_id: Result<u32, ContractError>,
		) -> Arc<Self> {
			Arc::new(Self {
				local_domain,
				host_chain_id,
				reads: AtomicUsize::new(0),
			})
		}
	}

	#[async_trait]
	impl RouterInterface for DomainReader {
		fn address(&self) -> Address {
			Address::repeat_byte(0x11)
		}

		async fn local_domain(&self) -> Result<u32, ContractError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			self.local_domain.clone()
		}

		async fn host_chain_id(&self) -> Result<u32, ContractError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			self.host_chain_id.clone()
		}

		async fn owner(&self) -> Result<Address, ContractError> {
			unimplemented!()
		}

		async fn enrolled_router(&self, _domain: u32) -> Result<B256, ContractError> {
			unimplemented!()
		}

		async fn last_nonce(&self) -> Result<U256, ContractError> {
			unimplemented!()
		}

		async fn quote_gas_payment(&self, _domain: u32) -> Result<U256, ContractError> {
			unimplemented!()
		}

		async fn destination_gas(&self, _domain: u32) -> Result<U256, ContractError> {
			unimplemented!()
		}

		async fn open(&self, _order: &OnchainOrder, _value: U256) -> Result<TxHash, ContractError> {
			unimplemented!()
		}

		async fn settle(&self, _ids: &[OrderId], _value: U256) -> Result<TxHash, ContractError> {
			unimplemented!()
		}

		async fn refund(&self, _orders: &[OnchainOrder], _value: U256) -> Result<TxHash, ContractError> {
			unimplemented!()
		}

		async fn order_status(&self, _order_id: OrderId) -> Result<u8, ContractError> {
			unimplemented!()
		}

		async fn status_constant(&self, _constant: StatusConstant) -> Result<u8, ContractError> {
			unimplemented!()
		}

		async fn open_order(&self, _order_id: OrderId) -> Result<Bytes, ContractError> {
			unimplemented!()
		}

		async fn filled_order(&self, _order_id: OrderId) -> Result<(Bytes, Bytes), ContractError> {
			unimplemented!()
		}
	}

	fn chain_config() -> Arc<ChainConfig> {
		let mut networks = HashMap::new();
		networks.insert(
			"espresso".to_string(),
			NetworkConfig {
				chain_id: 1_001,
				domain: 1_001,
				router: Address::repeat_byte(0x11),
				rpc_url: None,
				domain_accessor: Some(DomainAccessor::LocalDomain),
			},
		);
		networks.insert(
			"pharos".to_string(),
			NetworkConfig {
				chain_id: 50_002,
				domain: 50_002,
				router: Address::repeat_byte(0x22),
				rpc_url: None,
				domain_accessor: None,
			},
		);
		networks.insert(
			"staging".to_string(),
			NetworkConfig {
				chain_id: 7,
				domain: 7,
				router: Address::ZERO,
				rpc_url: None,
				domain_accessor: None,
			},
		);

		let mut weth = HashMap::new();
		weth.insert("espresso".to_string(), Address::repeat_byte(0xe1));
		weth.insert("pharos".to_string(), Address::repeat_byte(0xe2));
		let mut usdc = HashMap::new();
		usdc.insert("espresso".to_string(), Address::repeat_byte(0xc1));

		let mut tokens = HashMap::new();
		tokens.insert(
			"WETH".to_string(),
			TokenConfig {
				decimals: 18,
				addresses: weth,
			},
		);
		tokens.insert(
			"USDC".to_string(),
			TokenConfig {
				decimals: 6,
				addresses: usdc,
			},
		);

		Arc::new(ChainConfig { networks, tokens })
	}

	#[tokio::test]
	async fn test_static_domain_without_reader() {
		let resolver = DomainResolver::new(chain_config());
		assert_eq!(resolver.resolve_domain("pharos").await, Ok(50_002));
		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_001));
	}

	#[tokio::test]
	async fn test_unknown_network() {
		let resolver = DomainResolver::new(chain_config());
		assert_eq!(
			resolver.resolve_domain("nowhere").await,
			Err(DomainError::UnknownNetwork("nowhere".to_string()))
		);
	}

	#[tokio::test]
	async fn test_live_domain_wins_and_is_cached() {
		let reader = DomainReader::new(Ok(1_002), Ok(9));
		let resolver = DomainResolver::new(chain_config()).with_reader("espresso", reader.clone());

		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_002));
		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_002));
		assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_alternate_accessor_used_when_declared_fails() {
		let reader = DomainReader::new(Err(ContractError::Read("reverted".into())), Ok(1_001));
		let resolver = DomainResolver::new(chain_config()).with_reader("espresso", reader.clone());

		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_001));
		assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn test_read_failures_fall_back_to_static_table() {
		let reader = DomainReader::new(
			Err(ContractError::Network("refused".into())),
			Ok(0),
		);
		let resolver = DomainResolver::new(chain_config()).with_reader("espresso", reader.clone());

		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_001));
		// Not cached; the router is asked again next time.
		assert_eq!(resolver.resolve_domain("espresso").await, Ok(1_001));
		assert_eq!(reader.reads.load(Ordering::SeqCst), 4);
	}

	#[tokio::test]
	async fn test_reader_ignored_without_declared_accessor() {
		let reader = DomainReader::new(Ok(77), Ok(77));
		let resolver = DomainResolver::new(chain_config()).with_reader("pharos", reader.clone());

		assert_eq!(resolver.resolve_domain("pharos").await, Ok(50_002));
		assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_resolve_router() {
		let resolver = DomainResolver::new(chain_config());
		assert_eq!(
			resolver.resolve_router("pharos"),
			Ok(Address::repeat_byte(0x22))
		);
		assert_eq!(
			resolver.resolve_router("staging"),
			Err(DomainError::NoRouter("staging".to_string()))
		);
		assert!(matches!(
			resolver.resolve_router("nowhere"),
			Err(DomainError::UnknownNetwork(_))
		));
	}

	#[test]
	fn test_token_lookups() {
		let resolver = DomainResolver::new(chain_config());

		assert!(resolver.is_token_supported("WETH", "pharos"));
		assert!(!resolver.is_token_supported("USDC", "pharos"));
		assert!(!resolver.is_token_supported("DAI", "espresso"));

		assert_eq!(
			resolver.equivalent_token(Address::repeat_byte(0xe1), "espresso", "pharos"),
			Some(Address::repeat_byte(0xe2))
		);
		assert_eq!(
			resolver.equivalent_token(Address::repeat_byte(0xc1), "espresso", "pharos"),
			None
		);
		assert_eq!(
			resolver.equivalent_token(Address::repeat_byte(0x99), "espresso", "pharos"),
			None
		);
	}
}
