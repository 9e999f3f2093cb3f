//! Simulated contracts for lifecycle tests.

use crate::{OrderLifecycleClient, OrderRequest};
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use gtx_contracts::{
	ContractError, ReceiptInterface, RouterInterface, StatusConstant, TokenInterface, TxReceipt,
};
use gtx_domains::DomainResolver;
use gtx_types::{
	ChainConfig, ClientSettings, NetworkConfig, OnchainOrder, OrderAction, OrderId, TokenConfig,
	TxHash,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SENDER: Address = Address::repeat_byte(0x5e);

pub const ESPRESSO_DOMAIN: u32 = 1_001;
pub const PHAROS_DOMAIN: u32 = 50_002;
pub const HOLESKY_DOMAIN: u32 = 17_000;

pub const ESPRESSO_ROUTER: Address = Address::repeat_byte(0x11);
pub const PHAROS_ROUTER: Address = Address::repeat_byte(0x22);
pub const HOLESKY_ROUTER: Address = Address::repeat_byte(0x33);

pub const WETH_ESPRESSO: Address = Address::repeat_byte(0xe1);
pub const WETH_PHAROS: Address = Address::repeat_byte(0xe2);
pub const WETH_HOLESKY: Address = Address::repeat_byte(0xe3);
pub const USDC_ESPRESSO: Address = Address::repeat_byte(0xc1);

pub const OPEN_TX: TxHash = B256::repeat_byte(0x01);
pub const APPROVE_TX: TxHash = B256::repeat_byte(0x02);
pub const SETTLE_TX: TxHash = B256::repeat_byte(0x03);
pub const REFUND_TX: TxHash = B256::repeat_byte(0x04);
pub const ORDER_ID: OrderId = B256::repeat_byte(0xaa);

pub const UNKNOWN: u8 = 0;
pub const OPENED: u8 = 1;
pub const FILLED: u8 = 2;
pub const SETTLED: u8 = 3;
pub const REFUNDED: u8 = 4;

pub const QUOTED_GAS: U256 = U256::from_limbs([2_000_000_000_000_000, 0, 0, 0]);
pub const DESTINATION_GAS: U256 = U256::from_limbs([3_000_000_000_000_000, 0, 0, 0]);

pub struct MockRouter {
	pub enrolled: Mutex<Result<B256, ContractError>>,
	pub last_nonce: Mutex<Result<U256, ContractError>>,
	pub quote: Mutex<Result<U256, ContractError>>,
	pub destination_gas: Mutex<Result<U256, ContractError>>,
	pub open_result: Mutex<Result<TxHash, ContractError>>,
	pub opened: Mutex<Vec<(OnchainOrder, U256)>>,
	pub settled: Mutex<Vec<(Vec<OrderId>, U256)>>,
	pub refunded: Mutex<Vec<(Vec<OnchainOrder>, U256)>>,
	pub status: Mutex<Result<u8, ContractError>>,
	pub status_queries: Mutex<Vec<OrderId>>,
	/// OPENED, FILLED, SETTLED, REFUNDED, UNKNOWN.
	pub constants: Mutex<Result<[u8; 5], ContractError>>,
	pub open_order: Mutex<Result<Bytes, ContractError>>,
	pub filled_order: Mutex<Result<(Bytes, Bytes), ContractError>>,
}

impl Default for MockRouter {
	fn default() -> Self {
		Self {
			enrolled: Mutex::new(Ok(PHAROS_ROUTER.into_word())),
			last_nonce: Mutex::new(Ok(U256::from(7))),
			quote: Mutex::new(Ok(QUOTED_GAS)),
			destination_gas: Mutex::new(Ok(DESTINATION_GAS)),
			open_result: Mutex::new(Ok(OPEN_TX)),
			opened: Mutex::new(Vec::new()),
			settled: Mutex::new(Vec::new()),
			refunded: Mutex::new(Vec::new()),
			status: Mutex::new(Ok(UNKNOWN)),
			status_queries: Mutex::new(Vec::new()),
			constants: Mutex::new(Ok([OPENED, FILLED, SETTLED, REFUNDED, UNKNOWN])),
			open_order: Mutex::new(Ok(Bytes::new())),
			filled_order: Mutex::new(Ok((Bytes::new(), Bytes::new()))),
		}
	}
}

#[async_trait]
impl RouterInterface for MockRouter {
	fn address(&self) -> Address {
		ESPRESSO_ROUTER
	}

	async fn local_domain(&self) -> Result<u32, ContractError> {
		Ok(ESPRESSO_DOMAIN)
	}

	async fn host_chain_id(&self) -> Result<u32, ContractError> {
		Ok(ESPRESSO_DOMAIN)
	}

	async fn owner(&self) -> Result<Address, ContractError> {
		Ok(Address::repeat_byte(0x0a))
	}

	async fn enrolled_router(&self, _domain: u32) -> Result<B256, ContractError> {
		self.enrolled.lock().unwrap().clone()
	}

	async fn last_nonce(&self) -> Result<U256, ContractError> {
		self.last_nonce.lock().unwrap().clone()
	}

	async fn quote_gas_payment(&self, _domain: u32) -> Result<U256, ContractError> {
		self.quote.lock().unwrap().clone()
	}

	async fn destination_gas(&self, _domain: u32) -> Result<U256, ContractError> {
		self.destination_gas.lock().unwrap().clone()
	}

	/// Yields before the order lands so concurrent callers interleave, then
	/// advances the router nonce like a mined `open` would.
	async fn open(&self, order: &OnchainOrder, value: U256) -> Result<TxHash, ContractError> {
		tokio::task::yield_now().await;

		let result = self.open_result.lock().unwrap().clone();
		if result.is_ok() {
			self.opened.lock().unwrap().push((order.clone(), value));
			if let Ok(nonce) = self.last_nonce.lock().unwrap().as_mut() {
				*nonce += U256::from(1);
			}
		}
		result
	}

	async fn settle(&self, order_ids: &[OrderId], value: U256) -> Result<TxHash, ContractError> {
		self.settled.lock().unwrap().push((order_ids.to_vec(), value));
		Ok(SETTLE_TX)
	}

	async fn refund(&self, orders: &[OnchainOrder], value: U256) -> Result<TxHash, ContractError> {
		self.refunded.lock().unwrap().push((orders.to_vec(), value));
		Ok(REFUND_TX)
	}

	async fn order_status(&self, order_id: OrderId) -> Result<u8, ContractError> {
		self.status_queries.lock().unwrap().push(order_id);
		self.status.lock().unwrap().clone()
	}

	async fn status_constant(&self, constant: StatusConstant) -> Result<u8, ContractError> {
		let constants = self.constants.lock().unwrap().clone()?;
		Ok(match constant {
			StatusConstant::Opened => constants[0],
			StatusConstant::Filled => constants[1],
			StatusConstant::Settled => constants[2],
			StatusConstant::Refunded => constants[3],
			StatusConstant::Unknown => constants[4],
		})
	}

	async fn open_order(&self, _order_id: OrderId) -> Result<Bytes, ContractError> {
		self.open_order.lock().unwrap().clone()
	}

	async fn filled_order(&self, _order_id: OrderId) -> Result<(Bytes, Bytes), ContractError> {
		self.filled_order.lock().unwrap().clone()
	}
}

#[derive(Default)]
pub struct MockTokens {
	allowance: Mutex<U256>,
	/// Number of upcoming approvals that will be rejected.
	failing_approvals: AtomicUsize,
	pub allowance_calls: AtomicUsize,
	pub approve_calls: AtomicUsize,
}

impl MockTokens {
	pub fn set_allowance(&self, allowance: U256) {
		*self.allowance.lock().unwrap() = allowance;
	}

	pub fn fail_approvals(&self, count: usize) {
		self.failing_approvals.store(count, Ordering::SeqCst);
	}
}

#[async_trait]
impl TokenInterface for MockTokens {
	async fn allowance(
		&self,
		_token: Address,
		_owner: Address,
		_spender: Address,
	) -> Result<U256, ContractError> {
		self.allowance_calls.fetch_add(1, Ordering::SeqCst);
		Ok(*self.allowance.lock().unwrap())
	}

	async fn approve(
		&self,
		_token: Address,
		_spender: Address,
		amount: U256,
	) -> Result<TxHash, ContractError> {
		self.approve_calls.fetch_add(1, Ordering::SeqCst);
		let failing = self.failing_approvals.load(Ordering::SeqCst);
		if failing > 0 {
			self.failing_approvals.store(failing - 1, Ordering::SeqCst);
			return Err(ContractError::Submission("approve: nonce too low".into()));
		}
		self.set_allowance(amount);
		Ok(APPROVE_TX)
	}
}

#[derive(Default)]
pub struct MockReceipts {
	hanging: Mutex<HashSet<TxHash>>,
	reverting: Mutex<HashSet<TxHash>>,
}

impl MockReceipts {
	/// The transaction is never mined.
	pub fn hang(&self, hash: TxHash) {
		self.hanging.lock().unwrap().insert(hash);
	}

	pub fn revert(&self, hash: TxHash) {
		self.reverting.lock().unwrap().insert(hash);
	}

	fn mined(&self, hash: TxHash) -> Option<TxReceipt> {
		if self.hanging.lock().unwrap().contains(&hash)
			|| ![OPEN_TX, APPROVE_TX, SETTLE_TX, REFUND_TX].contains(&hash)
		{
			return None;
		}

		let success = !self.reverting.lock().unwrap().contains(&hash);
		Some(TxReceipt {
			hash,
			block_number: 100,
			success,
			order_id: (success && hash == OPEN_TX).then_some(ORDER_ID),
		})
	}
}

#[async_trait]
impl ReceiptInterface for MockReceipts {
	async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ContractError> {
		match self.mined(hash) {
			Some(receipt) => Ok(receipt),
			None => std::future::pending().await,
		}
	}

	async fn receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, ContractError> {
		Ok(self.mined(hash))
	}
}

fn chain_config() -> ChainConfig {
	let network = |chain_id: u64, domain: u32, router: Address| NetworkConfig {
		chain_id,
		domain,
		router,
		rpc_url: None,
		domain_accessor: None,
	};

	let mut networks = HashMap::new();
	networks.insert(
		"espresso".to_string(),
		network(1_001, ESPRESSO_DOMAIN, ESPRESSO_ROUTER),
	);
	networks.insert(
		"pharos".to_string(),
		network(50_002, PHAROS_DOMAIN, PHAROS_ROUTER),
	);
	networks.insert(
		"holesky".to_string(),
		network(17_000, HOLESKY_DOMAIN, HOLESKY_ROUTER),
	);

	let token = |decimals: u8, addresses: &[(&str, Address)]| TokenConfig {
		decimals,
		addresses: addresses
			.iter()
			.map(|(network, address)| (network.to_string(), *address))
			.collect(),
	};

	let mut tokens = HashMap::new();
	tokens.insert(
		"WETH".to_string(),
		token(
			18,
			&[
				("espresso", WETH_ESPRESSO),
				("pharos", WETH_PHAROS),
				("holesky", WETH_HOLESKY),
			],
		),
	);
	tokens.insert(
		"ETH".to_string(),
		token(18, &[("espresso", Address::ZERO), ("pharos", Address::ZERO)]),
	);
	tokens.insert("USDC".to_string(), token(6, &[("espresso", USDC_ESPRESSO)]));

	ChainConfig { networks, tokens }
}

/// WETH from espresso to pharos.
pub fn weth_request(amount: &str) -> OrderRequest {
	OrderRequest {
		destination: "pharos".to_string(),
		target: None,
		input_token: "WETH".to_string(),
		output_token: "WETH".to_string(),
		amount_in: amount.to_string(),
		amount_out: amount.to_string(),
		recipient: None,
		action: OrderAction::Transfer,
	}
}

pub struct Fixture {
	pub resolver: Arc<DomainResolver>,
	pub router: Arc<MockRouter>,
	pub tokens: Arc<MockTokens>,
	pub receipts: Arc<MockReceipts>,
}

impl Fixture {
	pub fn new() -> Self {
		Self {
			resolver: Arc::new(DomainResolver::new(Arc::new(chain_config()))),
			router: Arc::new(MockRouter::default()),
			tokens: Arc::new(MockTokens::default()),
			receipts: Arc::new(MockReceipts::default()),
		}
	}

	pub fn client(&self) -> OrderLifecycleClient {
		self.client_with(ClientSettings::default())
	}

	pub fn client_with(&self, settings: ClientSettings) -> OrderLifecycleClient {
		OrderLifecycleClient::builder("espresso")
			.with_sender(SENDER)
			.with_resolver(self.resolver.clone())
			.with_router(self.router.clone())
			.with_tokens(self.tokens.clone())
			.with_receipts(self.receipts.clone())
			.with_settings(settings)
			.build()
			.unwrap()
	}
}
