//! Order encoding for the GTX routers.
//!
//! [`OrderEncoder`] produces the ABI encoding of an [`OrderData`] exactly as
//! Solidity's `abi.encode(order)` does for the router's `OrderData` struct,
//! and the fixed order data type the router uses to pick its decoder.

use alloy::primitives::{keccak256, Bytes, B256};
use alloy::sol_types::SolValue;
use gtx_types::{OrderAction, OrderData};
use thiserror::Error;

pub mod address;

pub use address::{address_to_bytes32, bytes32_to_address, parse_address, parse_bytes32_address};

/// Solidity signature of the encoded struct. Its hash is the order data type.
pub const ORDER_DATA_TYPE_STRING: &str = "OrderData(bytes32 sender,bytes32 recipient,bytes32 inputToken,bytes32 outputToken,bytes32 targetInputToken,bytes32 targetOutputToken,uint256 amountIn,uint256 amountOut,uint32 originDomain,uint32 destinationDomain,uint32 targetDomain,bytes32 destinationSettler,bytes32 sourceSettler,uint32 fillDeadline,uint8 action,uint256 nonce,bytes data)";

pub mod abi {
	alloy::sol! {
		/// Field order must match the router's OrderData struct exactly.
		struct OrderData {
			bytes32 sender;
			bytes32 recipient;
			bytes32 inputToken;
			bytes32 outputToken;
			bytes32 targetInputToken;
			bytes32 targetOutputToken;
			uint256 amountIn;
			uint256 amountOut;
			uint32 originDomain;
			uint32 destinationDomain;
			uint32 targetDomain;
			bytes32 destinationSettler;
			bytes32 sourceSettler;
			uint32 fillDeadline;
			uint8 action;
			uint256 nonce;
			bytes data;
		}
	}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
	#[error("Malformed address: {0}")]
	MalformedAddress(String),
	#[error("Failed to decode order data: {0}")]
	Decode(String),
	#[error("Unknown order action: {0}")]
	UnknownAction(u8),
}

/// Stateless encoder for router order data.
pub struct OrderEncoder;

impl OrderEncoder {
	/// ABI-encodes the order as a single tuple.
	pub fn encode(order: &OrderData) -> Bytes {
		abi::OrderData::from(order).abi_encode().into()
	}

	/// Decodes bytes produced by [`OrderEncoder::encode`].
	pub fn decode(data: &[u8]) -> Result<OrderData, EncodeError> {
		let decoded =
			abi::OrderData::abi_decode(data).map_err(|e| EncodeError::Decode(e.to_string()))?;
		OrderData::try_from(decoded)
	}

	/// Discriminator identifying this order schema to the router.
	pub fn order_data_type() -> B256 {
		keccak256(ORDER_DATA_TYPE_STRING.as_bytes())
	}
}

impl From<&OrderData> for abi::OrderData {
	fn from(order: &OrderData) -> Self {
		Self {
			sender: order.sender,
			recipient: order.recipient,
			inputToken: order.input_token,
			outputToken: order.output_token,
			targetInputToken: order.target_input_token,
			targetOutputToken: order.target_output_token,
			amountIn: order.amount_in,
			amountOut: order.amount_out,
			originDomain: order.origin_domain,
			destinationDomain: order.destination_domain,
			targetDomain: order.target_domain,
			destinationSettler: order.destination_settler,
			sourceSettler: order.source_settler,
			fillDeadline: order.fill_deadline,
			action: order.action.as_u8(),
			nonce: order.nonce,
			data: order.data.clone(),
		}
	}
}

impl TryFrom<abi::OrderData> for OrderData {
	type Error = EncodeError;

	fn try_from(order: abi::OrderData) -> Result<Self, Self::Error> {
		Ok(Self {
			sender: order.sender,
			recipient: order.recipient,
			input_token: order.inputToken,
			output_token: order.outputToken,
			target_input_token: order.targetInputToken,
			target_output_token: order.targetOutputToken,
			amount_in: order.amountIn,
			amount_out: order.amountOut,
			origin_domain: order.originDomain,
			destination_domain: order.destinationDomain,
			target_domain: order.targetDomain,
			destination_settler: order.destinationSettler,
			source_settler: order.sourceSettler,
			fill_deadline: order.fillDeadline,
			action: OrderAction::try_from(order.action).map_err(EncodeError::UnknownAction)?,
			nonce: order.nonce,
			data: order.data,
		})
	}
}
