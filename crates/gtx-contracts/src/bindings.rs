//! Solidity bindings for the router and ERC-20 tokens.

#![allow(clippy::too_many_arguments)]

use alloy::sol;

// Type definitions match the deployed router ABI so `Open` logs decode.
sol! {
	/// Output of a cross-chain order.
	struct Output {
		bytes32 token;
		uint256 amount;
		bytes32 recipient;
		uint256 chainId;
	}

	/// Fill instruction for cross-chain execution.
	struct FillInstruction {
		uint64 destinationChainId;
		bytes32 destinationSettler;
		bytes originData;
	}

	/// Resolved cross-chain order structure.
	struct ResolvedCrossChainOrder {
		address user;
		uint256 originChainId;
		uint32 openDeadline;
		uint32 fillDeadline;
		bytes32 orderId;
		Output[] maxSpent;
		Output[] minReceived;
		FillInstruction[] fillInstructions;
	}

	/// Order accepted by `open`.
	struct OnchainCrossChainOrder {
		uint32 fillDeadline;
		bytes32 orderDataType;
		bytes orderData;
	}

	/// Event emitted when a new cross-chain order is opened.
	event Open(bytes32 indexed orderId, ResolvedCrossChainOrder order);

	#[sol(rpc)]
	interface IGtxRouter {
		function localDomain() external view returns (uint32);
		function GTX_HOST_CHAIN_ID() external view returns (uint32);
		function owner() external view returns (address);
		function routers(uint32 domain) external view returns (bytes32);
		function lastNonce() external view returns (uint256);
		function quoteGasPayment(uint32 destinationDomain) external view returns (uint256);
		function destinationGas(uint32 destinationDomain) external view returns (uint256);

		function open(OnchainCrossChainOrder order) external payable;
		function settle(bytes32[] orderIds) external payable;
		function refund(OnchainCrossChainOrder[] orders) external payable;

		function orderStatus(bytes32 orderId) external view returns (uint8);
		function OPENED() external view returns (uint8);
		function FILLED() external view returns (uint8);
		function SETTLED() external view returns (uint8);
		function REFUNDED() external view returns (uint8);
		function UNKNOWN() external view returns (uint8);
		function openOrders(bytes32 orderId) external view returns (bytes);
		function filledOrders(bytes32 orderId) external view returns (bytes originData, bytes fillerData);
	}

	#[sol(rpc)]
	interface IERC20 {
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}
}
