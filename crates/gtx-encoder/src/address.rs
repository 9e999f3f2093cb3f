//! Address to bytes32 conversion.
//!
//! Routers identify accounts on every domain with 32-byte words. EVM addresses
//! are left-padded with twelve zero bytes. Input that is neither a 20-byte
//! address nor an already padded word is rejected rather than padded.

use crate::EncodeError;
use alloy::primitives::{Address, B256};
use std::str::FromStr;

/// Parses a `0x`-prefixed 20-byte hex address.
pub fn parse_address(value: &str) -> Result<Address, EncodeError> {
	let trimmed = value.trim();
	match trimmed.strip_prefix("0x") {
		Some(hex) if hex.len() == 40 => Address::from_str(trimmed)
			.map_err(|_| EncodeError::MalformedAddress(value.to_string())),
		_ => Err(EncodeError::MalformedAddress(value.to_string())),
	}
}

/// Left-pads an address to a 32-byte word.
pub fn address_to_bytes32(address: Address) -> B256 {
	address.into_word()
}

/// Extracts the address from a padded word.
pub fn bytes32_to_address(word: B256) -> Result<Address, EncodeError> {
	if word[..12].iter().any(|&b| b != 0) {
		return Err(EncodeError::MalformedAddress(word.to_string()));
	}
	Ok(Address::from_word(word))
}

/// Parses either a 20-byte address or a padded 32-byte word into a word.
pub fn parse_bytes32_address(value: &str) -> Result<B256, EncodeError> {
	let trimmed = value.trim();
	match trimmed.strip_prefix("0x").map(str::len) {
		Some(40) => parse_address(trimmed).map(address_to_bytes32),
		Some(64) => {
			let word = B256::from_str(trimmed)
				.map_err(|_| EncodeError::MalformedAddress(value.to_string()))?;
			bytes32_to_address(word)
				.map(|_| word)
				.map_err(|_| EncodeError::MalformedAddress(value.to_string()))
		}
		_ => Err(EncodeError::MalformedAddress(value.to_string())),
	}
}
