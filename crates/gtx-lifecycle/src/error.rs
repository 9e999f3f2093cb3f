//! Lifecycle error taxonomy and user-facing messages.

use alloy::primitives::U256;
use gtx_types::TxHash;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by the lifecycle client.
///
/// None of these are returned as `Err` from order operations; they are
/// carried inside [`crate::OrderResult`] so every path resolves to a value.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LifecycleError {
	/// Bad or missing input, detected before any transaction was sent.
	#[error("Validation failed: {0}")]
	Validation(String),
	#[error("Token approval failed after {attempts} attempt(s): {reason}")]
	ApprovalFailed { attempts: u32, reason: String },
	/// Every gas quote failed. Not fatal; `default` was paid instead.
	#[error("Gas estimation failed, using default payment {default}: {reason}")]
	EstimationFailed { default: U256, reason: String },
	#[error("Submission failed: {reason}")]
	SubmissionFailed {
		tx_hash: Option<TxHash>,
		reason: String,
	},
	/// The transaction was sent but no receipt arrived in time.
	#[error("Transaction {tx_hash} not confirmed within {waited:?}")]
	ConfirmationTimeout { tx_hash: TxHash, waited: Duration },
	#[error("Order status unknown: {0}")]
	StatusUnknown(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl LifecycleError {
	/// Whether the operation still went through.
	pub fn is_fatal(&self) -> bool {
		!matches!(
			self,
			LifecycleError::EstimationFailed { .. } | LifecycleError::ConfirmationTimeout { .. }
		)
	}

	/// Plain text suitable for showing to an end user.
	pub fn user_message(&self) -> String {
		match self {
			LifecycleError::Validation(message) => message.clone(),
			LifecycleError::ApprovalFailed { reason, .. } => {
				format!("Token approval failed. {}", describe_revert(reason))
			}
			LifecycleError::EstimationFailed { .. } => {
				"Bridging gas could not be quoted; a default payment was used.".to_string()
			}
			LifecycleError::SubmissionFailed { reason, .. } => describe_revert(reason),
			LifecycleError::ConfirmationTimeout { tx_hash, .. } => format!(
				"Transaction {} was sent but is not confirmed yet. Check the order status later.",
				tx_hash
			),
			LifecycleError::StatusUnknown(_) => {
				"The order status could not be determined. Please check it manually.".to_string()
			}
			LifecycleError::Config(message) => format!("Client is misconfigured: {}", message),
		}
	}
}

/// Known revert reasons and wallet errors, matched case-insensitively.
const KNOWN_REVERTS: &[(&str, &str)] = &[
	(
		"InvalidNonce",
		"The order nonce was already used. Another order was submitted first; please retry.",
	),
	(
		"InvalidOrderDomain",
		"The router does not accept orders for this destination network.",
	),
	(
		"InvalidOrderStatus",
		"The order is not in a state that allows this action.",
	),
	("OrderFillExpired", "The order's fill deadline has passed."),
	(
		"InvalidOrderType",
		"The router does not recognize this order format.",
	),
	(
		"insufficient allowance",
		"The token allowance is too low for this amount.",
	),
	(
		"exceeds balance",
		"The token balance is too low for this amount.",
	),
	(
		"insufficient funds",
		"Not enough native balance to cover the amount and gas.",
	),
	("user rejected", "The transaction was rejected in the wallet."),
	("user denied", "The transaction was rejected in the wallet."),
];

/// Maps a raw revert or RPC error to plain text.
pub fn describe_revert(raw: &str) -> String {
	let lowered = raw.to_lowercase();
	KNOWN_REVERTS
		.iter()
		.find(|(needle, _)| lowered.contains(&needle.to_lowercase()))
		.map(|(_, message)| message.to_string())
		.unwrap_or_else(|| format!("Transaction failed: {}", raw))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::B256;

	#[test]
	fn test_known_reverts_are_mapped() {
		assert_eq!(
			describe_revert("open: server returned an error response: execution reverted: InvalidNonce()"),
			"The order nonce was already used. Another order was submitted first; please retry."
		);
		assert_eq!(
			describe_revert("User Rejected the request."),
			"The transaction was rejected in the wallet."
		);
		assert_eq!(
			describe_revert("ERC20: transfer amount exceeds balance"),
			"The token balance is too low for this amount."
		);
	}

	#[test]
	fn test_unknown_revert_keeps_raw_text() {
		assert_eq!(describe_revert("weird"), "Transaction failed: weird");
	}

	#[test]
	fn test_timeout_is_not_fatal() {
		let timeout = LifecycleError::ConfirmationTimeout {
			tx_hash: B256::repeat_byte(1),
			waited: Duration::from_secs(60),
		};
		assert!(!timeout.is_fatal());
		assert!(timeout.user_message().contains("not confirmed yet"));
		assert!(LifecycleError::Validation("bad".into()).is_fatal());
	}

	#[test]
	fn test_serializes_with_kind_tag() {
		let json = serde_json::to_value(LifecycleError::Validation("bad amount".into())).unwrap();
		assert_eq!(json["kind"], "validation");
		assert_eq!(json["detail"], "bad amount");
	}
}
