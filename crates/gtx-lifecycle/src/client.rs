//! Order creation, settlement and refunds.

use crate::{LifecycleError, OrderRequest, OrderResult};
use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{Address, B256, U256};
use gtx_contracts::{
	bounded, ContractError, Fallback, ReceiptInterface, Resolved, RouterInterface, TokenInterface,
	TxReceipt,
};
use gtx_domains::DomainResolver;
use gtx_encoder::{address_to_bytes32, parse_bytes32_address, OrderEncoder};
use gtx_types::{ClientSettings, OnchainOrder, OrderDraft, OrderId, OrderTarget, TxHash};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Orchestrates orders originating on one network for one sender.
pub struct OrderLifecycleClient {
	pub(crate) origin: String,
	pub(crate) sender: Address,
	pub(crate) resolver: Arc<DomainResolver>,
	pub(crate) router: Arc<dyn RouterInterface>,
	pub(crate) tokens: Arc<dyn TokenInterface>,
	pub(crate) receipts: Arc<dyn ReceiptInterface>,
	pub(crate) settings: ClientSettings,
	/// Held from nonce read to confirmation when submissions are serialized.
	submissions: Option<Mutex<()>>,
}

/// Everything validation resolved for one request.
#[derive(Debug)]
struct OrderPlan {
	draft: OrderDraft,
	input_token: Address,
}

impl OrderPlan {
	fn native_input(&self) -> bool {
		self.input_token == Address::ZERO
	}
}

impl OrderLifecycleClient {
	pub fn builder(origin: impl Into<String>) -> ClientBuilder {
		ClientBuilder::new(origin)
	}

	pub fn origin(&self) -> &str {
		&self.origin
	}

	pub fn sender(&self) -> Address {
		self.sender
	}

	pub fn settings(&self) -> &ClientSettings {
		&self.settings
	}

	/// Validates, approves, quotes, submits and confirms an order.
	///
	/// Never fails outward: every problem ends up in the returned result.
	pub async fn create_order(&self, request: &OrderRequest) -> OrderResult {
		let plan = match self.validate(request).await {
			Ok(plan) => plan,
			Err(e) => {
				tracing::warn!(error = %e, "Order rejected");
				return OrderResult::failed(e);
			}
		};

		if plan.native_input() {
			tracing::debug!("Native input, skipping approval");
		} else if let Err(e) = self
			.ensure_allowance(plan.input_token, plan.draft.amount_in)
			.await
		{
			return OrderResult::failed(e);
		}

		let mut warnings = Vec::new();
		let gas = self.quote_gas(plan.draft.destination_domain).await;
		if let Some(warning) = estimation_warning(&gas) {
			warnings.push(warning);
		}

		let _guard = match &self.submissions {
			Some(lock) => Some(lock.lock().await),
			None => None,
		};

		let last_nonce = match bounded(self.settings.rpc_timeout(), self.router.last_nonce()).await {
			Ok(nonce) => nonce,
			Err(e) => {
				return OrderResult {
					warnings,
					..OrderResult::failed(LifecycleError::SubmissionFailed {
						tx_hash: None,
						reason: format!("could not read router nonce: {}", e),
					})
				};
			}
		};

		let order = match plan.draft.into_order(last_nonce) {
			Ok(order) => order,
			Err(e) => {
				return OrderResult {
					warnings,
					..OrderResult::failed(LifecycleError::SubmissionFailed {
						tx_hash: None,
						reason: e.to_string(),
					})
				};
			}
		};

		let onchain = OnchainOrder {
			fill_deadline: order.fill_deadline,
			order_data_type: OrderEncoder::order_data_type(),
			order_data: OrderEncoder::encode(&order),
		};

		let value = if plan.input_token == Address::ZERO {
			order.amount_in.saturating_add(gas.value)
		} else {
			gas.value
		};

		tracing::info!(
			origin = %self.origin,
			destination_domain = order.destination_domain,
			nonce = %order.nonce,
			value = %value,
			"Opening order"
		);

		let mut result = self
			.submit_and_confirm("open", self.router.open(&onchain, value))
			.await;
		result.order = Some(onchain);
		result.nonce = Some(order.nonce);
		result.gas_payment = Some(gas.value);
		result.warnings = warnings;
		result
	}

	/// Gas payment for bridging to `destination_domain`.
	///
	/// Tries `quoteGasPayment`, then `destinationGas`, then the configured
	/// default. Never fails.
	pub async fn estimate_gas(&self, destination_domain: u32) -> U256 {
		self.quote_gas(destination_domain).await.value
	}

	async fn quote_gas(&self, destination_domain: u32) -> Resolved<U256> {
		Fallback::new("gas payment", self.settings.default_gas_payment())
			.with_timeout(self.settings.rpc_timeout())
			.tier(
				"quoteGasPayment",
				self.router.quote_gas_payment(destination_domain),
			)
			.tier(
				"destinationGas",
				self.router.destination_gas(destination_domain),
			)
			.resolve()
			.await
	}

	/// Settles opened orders, paying for the message to `domain`.
	pub async fn settle_orders(&self, order_ids: &[OrderId], domain: u32) -> OrderResult {
		if order_ids.is_empty() {
			return OrderResult::failed(LifecycleError::Validation(
				"No orders to settle".to_string(),
			));
		}

		let gas = self.quote_gas(domain).await;
		tracing::info!(orders = order_ids.len(), domain, "Settling orders");

		let mut result = self
			.submit_and_confirm("settle", self.router.settle(order_ids, gas.value))
			.await;
		result.gas_payment = Some(gas.value);
		result.warnings.extend(estimation_warning(&gas));
		result
	}

	/// Refunds orders that were never filled, paying for the message to `domain`.
	pub async fn refund_orders(&self, orders: &[OnchainOrder], domain: u32) -> OrderResult {
		if orders.is_empty() {
			return OrderResult::failed(LifecycleError::Validation(
				"No orders to refund".to_string(),
			));
		}

		let gas = self.quote_gas(domain).await;
		tracing::info!(orders = orders.len(), domain, "Refunding orders");

		let mut result = self
			.submit_and_confirm("refund", self.router.refund(orders, gas.value))
			.await;
		result.gas_payment = Some(gas.value);
		result.warnings.extend(estimation_warning(&gas));
		result
	}

	/// Owner of the origin router.
	pub async fn router_owner(&self) -> Result<Address, ContractError> {
		bounded(self.settings.rpc_timeout(), self.router.owner()).await
	}

	async fn validate(&self, request: &OrderRequest) -> Result<OrderPlan, LifecycleError> {
		let config = self.resolver.config();

		let origin_domain = self
			.resolver
			.resolve_domain(&self.origin)
			.await
			.map_err(|e| LifecycleError::Validation(e.to_string()))?;
		let destination_domain = self
			.resolver
			.resolve_domain(&request.destination)
			.await
			.map_err(|e| LifecycleError::Validation(e.to_string()))?;
		let source_settler = self
			.resolver
			.resolve_router(&self.origin)
			.map_err(|e| LifecycleError::Validation(e.to_string()))?;
		let destination_settler = self
			.resolver
			.resolve_router(&request.destination)
			.map_err(|e| LifecycleError::Validation(e.to_string()))?;

		let input_token = self.origin_token(&request.input_token)?;
		let output_token = self.origin_token(&request.output_token)?;

		let amount_in = parse_amount(
			"amount in",
			&request.amount_in,
			token_decimals(config, &request.input_token)?,
		)?;
		let amount_out = parse_amount(
			"amount out",
			&request.amount_out,
			token_decimals(config, &request.output_token)?,
		)?;

		let target = match &request.target {
			Some(network) => Some(self.resolve_target(network, input_token, output_token).await?),
			None => None,
		};

		let sender = address_to_bytes32(self.sender);
		let recipient = match &request.recipient {
			Some(recipient) => parse_bytes32_address(recipient)
				.map_err(|e| LifecycleError::Validation(format!("Invalid recipient: {}", e)))?,
			None => sender,
		};

		self.check_enrollment(destination_domain).await?;

		Ok(OrderPlan {
			draft: OrderDraft {
				sender,
				recipient,
				input_token: address_to_bytes32(input_token),
				output_token: address_to_bytes32(output_token),
				amount_in,
				amount_out,
				origin_domain,
				destination_domain,
				destination_settler: address_to_bytes32(destination_settler),
				source_settler: address_to_bytes32(source_settler),
				fill_deadline: self.fill_deadline()?,
				action: request.action,
				target,
			},
			input_token,
		})
	}

	fn origin_token(&self, symbol: &str) -> Result<Address, LifecycleError> {
		self.resolver
			.token_address(symbol, &self.origin)
			.ok_or_else(|| {
				LifecycleError::Validation(format!(
					"Token {} is not supported on {}",
					symbol, self.origin
				))
			})
	}

	async fn resolve_target(
		&self,
		network: &str,
		input_token: Address,
		output_token: Address,
	) -> Result<OrderTarget, LifecycleError> {
		let domain = self
			.resolver
			.resolve_domain(network)
			.await
			.map_err(|e| LifecycleError::Validation(e.to_string()))?;

		let equivalent = |token: Address| {
			self.resolver
				.equivalent_token(token, &self.origin, network)
				.map(address_to_bytes32)
				.ok_or_else(|| {
					LifecycleError::Validation(format!(
						"Token {} has no equivalent on {}",
						token, network
					))
				})
		};

		Ok(OrderTarget {
			domain,
			input_token: equivalent(input_token)?,
			output_token: equivalent(output_token)?,
		})
	}

	/// Fails fast on a destination the origin router has no peer for. A
	/// failed read is only logged.
	async fn check_enrollment(&self, destination_domain: u32) -> Result<(), LifecycleError> {
		match bounded(
			self.settings.rpc_timeout(),
			self.router.enrolled_router(destination_domain),
		)
		.await
		{
			Ok(router) if router == B256::ZERO => Err(LifecycleError::Validation(format!(
				"Destination domain {} is not enrolled on the {} router",
				destination_domain, self.origin
			))),
			Ok(_) => Ok(()),
			Err(e) => {
				tracing::warn!(
					domain = destination_domain,
					error = %e,
					"Could not verify router enrollment, continuing"
				);
				Ok(())
			}
		}
	}

	fn fill_deadline(&self) -> Result<u32, LifecycleError> {
		let deadline = chrono::Utc::now()
			.timestamp()
			.saturating_add(i64::try_from(self.settings.fill_deadline_secs).unwrap_or(i64::MAX));
		u32::try_from(deadline).map_err(|_| {
			LifecycleError::Validation(format!("Fill deadline {} does not fit in 32 bits", deadline))
		})
	}

	async fn ensure_allowance(&self, token: Address, amount: U256) -> Result<(), LifecycleError> {
		let spender = self.router.address();

		match bounded(
			self.settings.rpc_timeout(),
			self.tokens.allowance(token, self.sender, spender),
		)
		.await
		{
			Ok(current) if current >= amount => {
				tracing::debug!(token = %token, allowance = %current, "Allowance sufficient");
				return Ok(());
			}
			Ok(current) => {
				tracing::info!(token = %token, allowance = %current, required = %amount, "Approving router");
			}
			Err(e) => {
				tracing::warn!(token = %token, error = %e, "Allowance read failed, approving anyway");
			}
		}

		let attempts = 1 + self.settings.approval_retries;
		let mut last_error = String::new();
		for attempt in 1..=attempts {
			match self.approve_once(token, spender, amount).await {
				Ok(tx_hash) => {
					tracing::info!(token = %token, tx_hash = %tx_hash, "Approval confirmed");
					return Ok(());
				}
				Err(e) => {
					tracing::warn!(token = %token, attempt, error = %e, "Approval failed");
					last_error = e.to_string();
				}
			}
		}

		Err(LifecycleError::ApprovalFailed {
			attempts,
			reason: last_error,
		})
	}

	async fn approve_once(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<TxHash, ContractError> {
		let tx_hash = self.tokens.approve(token, spender, amount).await?;
		let receipt = bounded(
			self.settings.confirmation_timeout(),
			self.receipts.wait_for_receipt(tx_hash),
		)
		.await?;

		if receipt.success {
			Ok(tx_hash)
		} else {
			Err(ContractError::Reverted(tx_hash))
		}
	}

	/// Sends a transaction and waits a bounded time for its receipt.
	async fn submit_and_confirm<F>(&self, what: &str, submission: F) -> OrderResult
	where
		F: Future<Output = Result<TxHash, ContractError>>,
	{
		let tx_hash = match submission.await {
			Ok(tx_hash) => tx_hash,
			Err(e) => {
				tracing::error!(what, error = %e, "Submission rejected");
				return OrderResult::failed(LifecycleError::SubmissionFailed {
					tx_hash: None,
					reason: e.to_string(),
				});
			}
		};

		let waited = self.settings.confirmation_timeout();
		let mut result = OrderResult {
			success: true,
			tx_hash: Some(tx_hash),
			..Default::default()
		};

		match tokio::time::timeout(waited, self.receipts.wait_for_receipt(tx_hash)).await {
			Ok(Ok(TxReceipt {
				success: true,
				order_id,
				block_number,
				..
			})) => {
				tracing::info!(what, tx_hash = %tx_hash, block_number, "Confirmed");
				result.order_id = order_id;
			}
			Ok(Ok(_)) => {
				tracing::error!(what, tx_hash = %tx_hash, "Transaction reverted");
				result.success = false;
				result.error = Some(LifecycleError::SubmissionFailed {
					tx_hash: Some(tx_hash),
					reason: ContractError::Reverted(tx_hash).to_string(),
				});
			}
			Ok(Err(e)) => {
				// Sent, but the receipt could not be fetched. Same outcome as
				// a timeout: the caller resumes polling.
				tracing::warn!(what, tx_hash = %tx_hash, error = %e, "Receipt unavailable");
				result.error = Some(LifecycleError::ConfirmationTimeout { tx_hash, waited });
			}
			Err(_) => {
				tracing::warn!(what, tx_hash = %tx_hash, ?waited, "Confirmation timed out");
				result.error = Some(LifecycleError::ConfirmationTimeout { tx_hash, waited });
			}
		}

		result
	}
}

fn estimation_warning(gas: &Resolved<U256>) -> Option<LifecycleError> {
	gas.used_default().then(|| LifecycleError::EstimationFailed {
		default: gas.value,
		reason: gas
			.failures
			.iter()
			.map(|(source, e)| format!("{}: {}", source, e))
			.collect::<Vec<_>>()
			.join("; "),
	})
}

fn token_decimals(config: &gtx_types::ChainConfig, symbol: &str) -> Result<u8, LifecycleError> {
	config
		.token(symbol)
		.map(|token| token.decimals)
		.ok_or_else(|| LifecycleError::Validation(format!("Unknown token {}", symbol)))
}

fn parse_amount(field: &str, amount: &str, decimals: u8) -> Result<U256, LifecycleError> {
	match parse_units(amount.trim(), decimals) {
		Ok(ParseUnits::U256(value)) if !value.is_zero() => Ok(value),
		Ok(_) => Err(LifecycleError::Validation(format!(
			"{} must be greater than zero",
			field
		))),
		Err(e) => Err(LifecycleError::Validation(format!(
			"Invalid {} '{}': {}",
			field, amount, e
		))),
	}
}

/// Assembles an [`OrderLifecycleClient`].
pub struct ClientBuilder {
	origin: String,
	sender: Option<Address>,
	resolver: Option<Arc<DomainResolver>>,
	router: Option<Arc<dyn RouterInterface>>,
	tokens: Option<Arc<dyn TokenInterface>>,
	receipts: Option<Arc<dyn ReceiptInterface>>,
	settings: ClientSettings,
}

impl ClientBuilder {
	pub fn new(origin: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			sender: None,
			resolver: None,
			router: None,
			tokens: None,
			receipts: None,
			settings: ClientSettings::default(),
		}
	}

	pub fn with_sender(mut self, sender: Address) -> Self {
		self.sender = Some(sender);
		self
	}

	pub fn with_resolver(mut self, resolver: Arc<DomainResolver>) -> Self {
		self.resolver = Some(resolver);
		self
	}

	pub fn with_router(mut self, router: Arc<dyn RouterInterface>) -> Self {
		self.router = Some(router);
		self
	}

	pub fn with_tokens(mut self, tokens: Arc<dyn TokenInterface>) -> Self {
		self.tokens = Some(tokens);
		self
	}

	pub fn with_receipts(mut self, receipts: Arc<dyn ReceiptInterface>) -> Self {
		self.receipts = Some(receipts);
		self
	}

	pub fn with_settings(mut self, settings: ClientSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn build(self) -> Result<OrderLifecycleClient, LifecycleError> {
		let resolver = self
			.resolver
			.ok_or_else(|| LifecycleError::Config("Domain resolver not provided".into()))?;

		if resolver.config().network(&self.origin).is_none() {
			return Err(LifecycleError::Config(format!(
				"Origin network {} is not configured",
				self.origin
			)));
		}

		let submissions = self.settings.serialize_submissions.then(|| Mutex::new(()));

		Ok(OrderLifecycleClient {
			origin: self.origin,
			sender: self
				.sender
				.ok_or_else(|| LifecycleError::Config("Sender not provided".into()))?,
			resolver,
			router: self
				.router
				.ok_or_else(|| LifecycleError::Config("Router not provided".into()))?,
			tokens: self
				.tokens
				.ok_or_else(|| LifecycleError::Config("Token access not provided".into()))?,
			receipts: self
				.receipts
				.ok_or_else(|| LifecycleError::Config("Receipt source not provided".into()))?,
			settings: self.settings,
			submissions,
		})
	}
}
