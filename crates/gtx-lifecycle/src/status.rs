//! Order status resolution.
//!
//! The router's own status value is compared against its named constants
//! first. When that is inconclusive the raw `filledOrders` and `openOrders`
//! mappings are used as heuristics. An order nobody can classify is assumed
//! to be in flight; `Unknown` is reserved for a router that answered nothing.
//! A revert is an answer: only network failures and timeouts count as the
//! router being unreachable.

use crate::OrderLifecycleClient;
use alloy::primitives::B256;
use gtx_contracts::{bounded, ContractError, StatusConstant};
use gtx_types::{OrderId, OrderStatus};

/// Result of comparing the raw status against the router's constants.
enum ConstantMatch {
	Matched(OrderStatus),
	/// The router answered but the value was `UNKNOWN`, matched nothing or
	/// the status read reverted.
	Inconclusive,
	/// The router could not be read.
	Unreachable,
}

impl OrderLifecycleClient {
	/// Observed status of an order, given its id or the hash of the
	/// transaction that opened it.
	pub async fn get_order_status(&self, order_or_tx: B256) -> OrderStatus {
		let order_id = self.resolve_order_id(order_or_tx).await;

		let reachable = match self.status_from_constants(order_id).await {
			ConstantMatch::Matched(status) => {
				tracing::debug!(order_id = %order_id, %status, "Status from router constants");
				return status;
			}
			ConstantMatch::Inconclusive => true,
			ConstantMatch::Unreachable => false,
		};

		let timeout = self.settings.rpc_timeout();
		let filled = bounded(timeout, self.router.filled_order(order_id)).await;
		let opened = bounded(timeout, self.router.open_order(order_id)).await;

		match (&filled, &opened) {
			(Ok((origin_data, filler_data)), _)
				if !origin_data.is_empty() || !filler_data.is_empty() =>
			{
				OrderStatus::Filled
			}
			(_, Ok(origin_data)) if !origin_data.is_empty() => OrderStatus::Opened,
			_ if reachable || answered(&filled) || answered(&opened) => {
				tracing::debug!(order_id = %order_id, "Status inconclusive, assuming in flight");
				OrderStatus::Processing
			}
			_ => {
				tracing::warn!(order_id = %order_id, "Router unreachable, status unknown");
				OrderStatus::Unknown
			}
		}
	}

	/// Maps a transaction hash to the order it opened. Anything that is not a
	/// known opening transaction is taken to be an order id already.
	async fn resolve_order_id(&self, order_or_tx: B256) -> OrderId {
		match bounded(self.settings.rpc_timeout(), self.receipts.receipt(order_or_tx)).await {
			Ok(Some(receipt)) => match receipt.order_id {
				Some(order_id) => {
					tracing::debug!(tx_hash = %order_or_tx, order_id = %order_id, "Resolved order id from receipt");
					order_id
				}
				None => order_or_tx,
			},
			Ok(None) => order_or_tx,
			Err(e) => {
				tracing::debug!(key = %order_or_tx, error = %e, "Receipt lookup failed, treating key as order id");
				order_or_tx
			}
		}
	}

	async fn status_from_constants(&self, order_id: OrderId) -> ConstantMatch {
		let timeout = self.settings.rpc_timeout();

		let raw = match bounded(timeout, self.router.order_status(order_id)).await {
			Ok(raw) => raw,
			Err(e) => {
				tracing::debug!(order_id = %order_id, error = %e, "orderStatus read failed");
				return match e {
					ContractError::Read(_) => ConstantMatch::Inconclusive,
					_ => ConstantMatch::Unreachable,
				};
			}
		};

		for constant in StatusConstant::ALL {
			let value = match bounded(timeout, self.router.status_constant(constant)).await {
				Ok(value) => value,
				Err(e) => {
					tracing::debug!(?constant, error = %e, "Status constant read failed");
					return ConstantMatch::Inconclusive;
				}
			};

			if value == raw {
				return match to_status(constant) {
					Some(status) => ConstantMatch::Matched(status),
					None => ConstantMatch::Inconclusive,
				};
			}
		}

		tracing::debug!(order_id = %order_id, raw, "Status matches no router constant");
		ConstantMatch::Inconclusive
	}
}

/// Whether the router responded, even if only with a revert.
fn answered<T>(read: &Result<T, ContractError>) -> bool {
	matches!(read, Ok(_) | Err(ContractError::Read(_)))
}

fn to_status(constant: StatusConstant) -> Option<OrderStatus> {
	match constant {
		StatusConstant::Opened => Some(OrderStatus::Opened),
		StatusConstant::Filled => Some(OrderStatus::Filled),
		StatusConstant::Settled => Some(OrderStatus::Settled),
		StatusConstant::Refunded => Some(OrderStatus::Refunded),
		StatusConstant::Unknown => None,
	}
}
