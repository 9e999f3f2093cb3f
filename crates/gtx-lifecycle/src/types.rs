//! Request and result types for lifecycle operations.

use crate::LifecycleError;
use alloy::primitives::U256;
use gtx_types::{OnchainOrder, OrderAction, OrderId, TxHash};
use serde::Serialize;

/// An order as a user describes it: networks by name, tokens by symbol and
/// amounts as decimal strings in token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
	pub destination: String,
	/// Optional onward network past the destination.
	pub target: Option<String>,
	pub input_token: String,
	pub output_token: String,
	pub amount_in: String,
	/// Minimum amount accepted on the destination.
	pub amount_out: String,
	/// Defaults to the sender.
	pub recipient: Option<String>,
	pub action: OrderAction,
}

/// Outcome of an order operation.
///
/// `success` with an `error` set means the transaction went out but its
/// confirmation is pending; callers should keep polling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderResult {
	pub success: bool,
	pub tx_hash: Option<TxHash>,
	pub order_id: Option<OrderId>,
	/// The submitted order, kept so it can be refunded later.
	pub order: Option<OnchainOrder>,
	pub nonce: Option<U256>,
	pub gas_payment: Option<U256>,
	pub error: Option<LifecycleError>,
	/// Non-fatal problems recovered from along the way.
	pub warnings: Vec<LifecycleError>,
}

impl OrderResult {
	pub(crate) fn failed(error: LifecycleError) -> Self {
		Self {
			error: Some(error),
			..Default::default()
		}
	}

	/// User-facing description of the error, if any.
	pub fn message(&self) -> Option<String> {
		self.error.as_ref().map(LifecycleError::user_message)
	}

	/// Sent but not yet known to be mined.
	pub fn is_pending(&self) -> bool {
		self.success && matches!(self.error, Some(LifecycleError::ConfirmationTimeout { .. }))
	}
}
