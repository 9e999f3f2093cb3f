//! Contract access for the GTX order client.
//!
//! The client only ever talks to already deployed contracts: the router
//! (settler) on each network, ERC-20 tokens, and the node that returns
//! receipts. Each of these sits behind an async trait so the lifecycle logic
//! can be driven by simulated contract responses in tests and by the
//! alloy-backed implementations in [`implementations::evm::alloy`] otherwise.

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use gtx_types::{OnchainOrder, OrderId, TxHash};
use std::time::Duration;
use thiserror::Error;

pub mod bindings;
pub mod fallback;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use fallback::{bounded, Fallback, Resolved, Source};

/// Errors that can occur while reading from or writing to contracts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
	/// A view call failed or reverted.
	#[error("Contract read failed: {0}")]
	Read(String),
	/// The transaction was rejected before it reached the chain.
	#[error("Transaction rejected: {0}")]
	Submission(String),
	/// The transaction was mined but reverted.
	#[error("Transaction {0} reverted")]
	Reverted(TxHash),
	/// Transport level failure talking to the node.
	#[error("Network error: {0}")]
	Network(String),
	#[error("Timed out after {0:?}")]
	Timeout(Duration),
}

/// Named status constants exposed by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusConstant {
	Opened,
	Filled,
	Settled,
	Refunded,
	Unknown,
}

impl StatusConstant {
	pub const ALL: [StatusConstant; 5] = [
		StatusConstant::Opened,
		StatusConstant::Filled,
		StatusConstant::Settled,
		StatusConstant::Refunded,
		StatusConstant::Unknown,
	];
}

/// Receipt fields the client cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
	pub hash: TxHash,
	pub block_number: u64,
	pub success: bool,
	/// Id of the order opened by this transaction, if it emitted `Open`.
	pub order_id: Option<OrderId>,
}

/// Router (settler) contract on one network.
#[async_trait]
pub trait RouterInterface: Send + Sync {
	/// Address of the router contract, used as the ERC-20 spender.
	fn address(&self) -> Address;

	async fn local_domain(&self) -> Result<u32, ContractError>;

	async fn host_chain_id(&self) -> Result<u32, ContractError>;

	async fn owner(&self) -> Result<Address, ContractError>;

	/// Remote router enrolled for `domain`; the zero word means none.
	async fn enrolled_router(&self, domain: u32) -> Result<B256, ContractError>;

	async fn last_nonce(&self) -> Result<U256, ContractError>;

	async fn quote_gas_payment(&self, domain: u32) -> Result<U256, ContractError>;

	async fn destination_gas(&self, domain: u32) -> Result<U256, ContractError>;

	/// Submits `open(order)` paying `value`, returning once the node accepted it.
	async fn open(&self, order: &OnchainOrder, value: U256) -> Result<TxHash, ContractError>;

	async fn settle(&self, order_ids: &[OrderId], value: U256) -> Result<TxHash, ContractError>;

	async fn refund(&self, orders: &[OnchainOrder], value: U256) -> Result<TxHash, ContractError>;

	/// Raw status value for an order.
	async fn order_status(&self, order_id: OrderId) -> Result<u8, ContractError>;

	/// Value of one of the router's named status constants.
	async fn status_constant(&self, constant: StatusConstant) -> Result<u8, ContractError>;

	/// Origin data stored for an opened order; empty when unknown.
	async fn open_order(&self, order_id: OrderId) -> Result<Bytes, ContractError>;

	/// Origin and filler data stored for a filled order; empty when unknown.
	async fn filled_order(&self, order_id: OrderId) -> Result<(Bytes, Bytes), ContractError>;
}

/// ERC-20 allowance management.
#[async_trait]
pub trait TokenInterface: Send + Sync {
	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, ContractError>;

	async fn approve(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<TxHash, ContractError>;
}

/// Receipt lookups.
#[async_trait]
pub trait ReceiptInterface: Send + Sync {
	/// Waits until the transaction is mined. Never times out on its own;
	/// callers bound it.
	async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ContractError>;

	/// Returns the receipt if the transaction is already mined.
	async fn receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, ContractError>;
}
