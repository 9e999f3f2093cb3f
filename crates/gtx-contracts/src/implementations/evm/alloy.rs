//! Alloy-backed contract access.
//!
//! [`AlloyRouter`] talks to one network's router through a [`DynProvider`]
//! and doubles as the receipt source for that network. [`AlloyToken`] covers
//! ERC-20 allowance management with the same provider.

use crate::bindings::{IGtxRouter, OnchainCrossChainOrder, Open, IERC20};
use crate::{
	ContractError, ReceiptInterface, RouterInterface, StatusConstant, TokenInterface, TxReceipt,
};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Log;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol_types::SolEvent;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use gtx_types::{OnchainOrder, OrderId, TxHash};
use std::time::Duration;

/// Utility function to truncate a transaction hash for display.
fn truncate_hash(hash: &TxHash) -> String {
	let hash_str = hash.to_string();
	if hash_str.len() <= 10 {
		hash_str
	} else {
		format!("{}..", &hash_str[..10])
	}
}

/// Builds a provider for `rpc_url`.
///
/// With a signer the provider fills and signs transactions for `chain_id`;
/// without one it can only read.
pub fn connect(
	rpc_url: &str,
	chain_id: u64,
	signer: Option<PrivateKeySigner>,
) -> Result<DynProvider, ContractError> {
	let url: Url = rpc_url
		.parse()
		.map_err(|e| ContractError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

	let provider = match signer {
		Some(signer) => {
			let wallet = EthereumWallet::from(signer.with_chain_id(Some(chain_id)));
			ProviderBuilder::new().wallet(wallet).connect_http(url).erased()
		}
		None => ProviderBuilder::new().connect_http(url).erased(),
	};

	Ok(provider)
}

/// A call the node could not carry is a network failure; anything the node
/// answered (a revert, an error response, undecodable return data) is a
/// failed read.
fn read_error(call: &str, e: alloy::contract::Error) -> ContractError {
	match &e {
		alloy::contract::Error::TransportError(rpc) if rpc.is_transport_error() => {
			ContractError::Network(format!("{}: {}", call, e))
		}
		_ => ContractError::Read(format!("{}: {}", call, e)),
	}
}

fn send_error(call: &str, e: impl std::fmt::Display) -> ContractError {
	ContractError::Submission(format!("{}: {}", call, e))
}

/// Finds the order id in the router's `Open` log, if there is one.
fn open_order_id(logs: &[Log], router: Address) -> Option<OrderId> {
	logs.iter().find_map(|log| {
		let topics = log.inner.data.topics();
		(log.inner.address == router
			&& topics.len() >= 2
			&& topics[0] == Open::SIGNATURE_HASH)
			.then(|| topics[1])
	})
}

/// Router contract on one network.
pub struct AlloyRouter {
	router: IGtxRouter::IGtxRouterInstance<DynProvider>,
	provider: DynProvider,
	/// How often receipts are polled while waiting for a transaction.
	poll_interval: Duration,
}

impl AlloyRouter {
	pub fn new(address: Address, provider: DynProvider) -> Self {
		Self {
			router: IGtxRouter::new(address, provider.clone()),
			provider,
			poll_interval: Duration::from_secs(2),
		}
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	fn to_receipt(&self, receipt: alloy::rpc::types::TransactionReceipt) -> TxReceipt {
		TxReceipt {
			hash: receipt.transaction_hash,
			block_number: receipt.block_number.unwrap_or(0),
			success: receipt.status(),
			order_id: open_order_id(receipt.inner.logs(), *self.router.address()),
		}
	}
}

fn to_onchain(order: &OnchainOrder) -> OnchainCrossChainOrder {
	OnchainCrossChainOrder {
		fillDeadline: order.fill_deadline,
		orderDataType: order.order_data_type,
		orderData: order.order_data.clone(),
	}
}

#[async_trait]
impl RouterInterface for AlloyRouter {
	fn address(&self) -> Address {
		*self.router.address()
	}

	async fn local_domain(&self) -> Result<u32, ContractError> {
		self.router
			.localDomain()
			.call()
			.await
			.map_err(|e| read_error("localDomain", e))
	}

	async fn host_chain_id(&self) -> Result<u32, ContractError> {
		self.router
			.GTX_HOST_CHAIN_ID()
			.call()
			.await
			.map_err(|e| read_error("GTX_HOST_CHAIN_ID", e))
	}

	async fn owner(&self) -> Result<Address, ContractError> {
		self.router
			.owner()
			.call()
			.await
			.map_err(|e| read_error("owner", e))
	}

	async fn enrolled_router(&self, domain: u32) -> Result<B256, ContractError> {
		self.router
			.routers(domain)
			.call()
			.await
			.map_err(|e| read_error("routers", e))
	}

	async fn last_nonce(&self) -> Result<U256, ContractError> {
		self.router
			.lastNonce()
			.call()
			.await
			.map_err(|e| read_error("lastNonce", e))
	}

	async fn quote_gas_payment(&self, domain: u32) -> Result<U256, ContractError> {
		self.router
			.quoteGasPayment(domain)
			.call()
			.await
			.map_err(|e| read_error("quoteGasPayment", e))
	}

	async fn destination_gas(&self, domain: u32) -> Result<U256, ContractError> {
		self.router
			.destinationGas(domain)
			.call()
			.await
			.map_err(|e| read_error("destinationGas", e))
	}

	async fn open(&self, order: &OnchainOrder, value: U256) -> Result<TxHash, ContractError> {
		let pending = self
			.router
			.open(to_onchain(order))
			.value(value)
			.send()
			.await
			.map_err(|e| send_error("open", e))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_hash(&tx_hash), "Submitted open");
		Ok(tx_hash)
	}

	async fn settle(&self, order_ids: &[OrderId], value: U256) -> Result<TxHash, ContractError> {
		let pending = self
			.router
			.settle(order_ids.to_vec())
			.value(value)
			.send()
			.await
			.map_err(|e| send_error("settle", e))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_hash(&tx_hash), orders = order_ids.len(), "Submitted settle");
		Ok(tx_hash)
	}

	async fn refund(&self, orders: &[OnchainOrder], value: U256) -> Result<TxHash, ContractError> {
		let pending = self
			.router
			.refund(orders.iter().map(to_onchain).collect())
			.value(value)
			.send()
			.await
			.map_err(|e| send_error("refund", e))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_hash(&tx_hash), orders = orders.len(), "Submitted refund");
		Ok(tx_hash)
	}

	async fn order_status(&self, order_id: OrderId) -> Result<u8, ContractError> {
		self.router
			.orderStatus(order_id)
			.call()
			.await
			.map_err(|e| read_error("orderStatus", e))
	}

	async fn status_constant(&self, constant: StatusConstant) -> Result<u8, ContractError> {
		let result = match constant {
			StatusConstant::Opened => self.router.OPENED().call().await,
			StatusConstant::Filled => self.router.FILLED().call().await,
			StatusConstant::Settled => self.router.SETTLED().call().await,
			StatusConstant::Refunded => self.router.REFUNDED().call().await,
			StatusConstant::Unknown => self.router.UNKNOWN().call().await,
		};
		result.map_err(|e| read_error(&format!("{:?}", constant).to_uppercase(), e))
	}

	async fn open_order(&self, order_id: OrderId) -> Result<Bytes, ContractError> {
		self.router
			.openOrders(order_id)
			.call()
			.await
			.map_err(|e| read_error("openOrders", e))
	}

	async fn filled_order(&self, order_id: OrderId) -> Result<(Bytes, Bytes), ContractError> {
		let filled = self
			.router
			.filledOrders(order_id)
			.call()
			.await
			.map_err(|e| read_error("filledOrders", e))?;
		Ok((filled.originData, filled.fillerData))
	}
}

#[async_trait]
impl ReceiptInterface for AlloyRouter {
	async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ContractError> {
		tracing::info!(tx_hash = %truncate_hash(&hash), "Waiting for receipt");

		loop {
			match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => return Ok(self.to_receipt(receipt)),
				Ok(None) => {
					tracing::debug!(tx_hash = %truncate_hash(&hash), "Not mined yet");
					tokio::time::sleep(self.poll_interval).await;
				}
				Err(e) => {
					return Err(ContractError::Network(format!(
						"Failed to get receipt: {}",
						e
					)));
				}
			}
		}
	}

	async fn receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, ContractError> {
		let receipt = self
			.provider
			.get_transaction_receipt(hash)
			.await
			.map_err(|e| ContractError::Network(format!("Failed to get receipt: {}", e)))?;
		Ok(receipt.map(|receipt| self.to_receipt(receipt)))
	}
}

/// ERC-20 access through one network's provider.
pub struct AlloyToken {
	provider: DynProvider,
}

impl AlloyToken {
	pub fn new(provider: DynProvider) -> Self {
		Self { provider }
	}
}

#[async_trait]
impl TokenInterface for AlloyToken {
	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, ContractError> {
		IERC20::new(token, self.provider.clone())
			.allowance(owner, spender)
			.call()
			.await
			.map_err(|e| read_error("allowance", e))
	}

	async fn approve(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<TxHash, ContractError> {
		let pending = IERC20::new(token, self.provider.clone())
			.approve(spender, amount)
			.send()
			.await
			.map_err(|e| send_error("approve", e))?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_hash(&tx_hash), token = %token, "Submitted approve");
		Ok(tx_hash)
	}
}
