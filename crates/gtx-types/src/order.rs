//! Order model for cross-chain orders.
//!
//! [`OrderData`] is the canonical order struct carried inside an ERC-7683
//! `OnchainCrossChainOrder`. Orders are never built field by field by callers;
//! an [`OrderDraft`] collects everything known before the router nonce is read
//! and [`OrderDraft::into_order`] applies the construction invariants.

use alloy::primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Transaction hash on any supported network.
pub type TxHash = B256;

/// Router-assigned identifier of an opened order.
pub type OrderId = B256;

/// Errors raised while turning a draft into an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
	/// The router reported the largest representable nonce.
	#[error("Nonce space exhausted: last nonce is {0}")]
	NonceOverflow(U256),
}

/// Whether value changes form while it moves between chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
	#[default]
	Transfer,
	Swap,
}

impl OrderAction {
	/// Wire discriminant understood by the settlement contracts.
	pub fn as_u8(self) -> u8 {
		match self {
			OrderAction::Transfer => 0,
			OrderAction::Swap => 1,
		}
	}
}

impl TryFrom<u8> for OrderAction {
	type Error = u8;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(OrderAction::Transfer),
			1 => Ok(OrderAction::Swap),
			other => Err(other),
		}
	}
}

impl fmt::Display for OrderAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderAction::Transfer => write!(f, "transfer"),
			OrderAction::Swap => write!(f, "swap"),
		}
	}
}

/// Canonical cross-chain order.
///
/// Addresses are stored as 32-byte left-padded words, amounts as raw token
/// units. A `target_domain` of zero means the order stops at the destination
/// domain and both target tokens are the zero word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
	pub sender: B256,
	pub recipient: B256,
	pub input_token: B256,
	pub output_token: B256,
	pub target_input_token: B256,
	pub target_output_token: B256,
	pub amount_in: U256,
	pub amount_out: U256,
	pub origin_domain: u32,
	pub destination_domain: u32,
	pub target_domain: u32,
	pub destination_settler: B256,
	pub source_settler: B256,
	pub fill_deadline: u32,
	pub action: OrderAction,
	pub nonce: U256,
	/// Extension field, empty unless a settler defines a use for it.
	pub data: Bytes,
}

impl OrderData {
	pub fn has_target(&self) -> bool {
		self.target_domain != 0
	}
}

/// Onward leg of an order past its destination domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTarget {
	pub domain: u32,
	pub input_token: B256,
	pub output_token: B256,
}

/// Everything needed to build an [`OrderData`] except the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
	pub sender: B256,
	pub recipient: B256,
	pub input_token: B256,
	pub output_token: B256,
	pub amount_in: U256,
	pub amount_out: U256,
	pub origin_domain: u32,
	pub destination_domain: u32,
	pub destination_settler: B256,
	pub source_settler: B256,
	pub fill_deadline: u32,
	pub action: OrderAction,
	pub target: Option<OrderTarget>,
}

impl OrderDraft {
	/// Builds the order using the nonce after `last_nonce`.
	///
	/// A target with domain zero is treated the same as no target at all, so
	/// the target tokens can never be non-zero while the target domain is.
	pub fn into_order(self, last_nonce: U256) -> Result<OrderData, OrderError> {
		let nonce = last_nonce
			.checked_add(U256::from(1))
			.ok_or(OrderError::NonceOverflow(last_nonce))?;

		let (target_domain, target_input_token, target_output_token) = match self.target {
			Some(target) if target.domain != 0 => {
				(target.domain, target.input_token, target.output_token)
			}
			_ => (0, B256::ZERO, B256::ZERO),
		};

		Ok(OrderData {
			sender: self.sender,
			recipient: self.recipient,
			input_token: self.input_token,
			output_token: self.output_token,
			target_input_token,
			target_output_token,
			amount_in: self.amount_in,
			amount_out: self.amount_out,
			origin_domain: self.origin_domain,
			destination_domain: self.destination_domain,
			target_domain,
			destination_settler: self.destination_settler,
			source_settler: self.source_settler,
			fill_deadline: self.fill_deadline,
			action: self.action,
			nonce,
			data: Bytes::new(),
		})
	}
}

/// ERC-7683 `OnchainCrossChainOrder` passed to the router's `open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnchainOrder {
	pub fill_deadline: u32,
	pub order_data_type: B256,
	pub order_data: Bytes,
}

/// Observed state of an order.
///
/// `Opened`, `Filled`, `Settled` and `Refunded` mirror the router's status
/// constants. `Processing` means the reads were inconclusive and the order is
/// assumed in flight; `Unknown` means the router could not be reached at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
	Opened,
	Filled,
	Settled,
	Refunded,
	Processing,
	Unknown,
}

impl OrderStatus {
	/// Settled and refunded orders never change again.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Settled | OrderStatus::Refunded)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			OrderStatus::Opened => "OPENED",
			OrderStatus::Filled => "FILLED",
			OrderStatus::Settled => "SETTLED",
			OrderStatus::Refunded => "REFUNDED",
			OrderStatus::Processing => "PROCESSING",
			OrderStatus::Unknown => "UNKNOWN",
		};
		f.write_str(label)
	}
}
