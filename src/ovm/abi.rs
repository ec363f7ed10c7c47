//! Minimal contract ABI coder: four-byte selectors plus head/tail encoding
//! for the token kinds the state-manager interface uses.

use crate::ExitError;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// An ABI value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
	/// A 20-byte address, left-padded to a word.
	Address(H160),
	/// An unsigned 256-bit integer.
	Uint(U256),
	/// A fixed 32-byte value (`bytes32`).
	FixedBytes(H256),
	/// Dynamic bytes.
	Bytes(Vec<u8>),
}

impl Token {
	fn is_dynamic(&self) -> bool {
		matches!(self, Self::Bytes(_))
	}
}

/// The declared kind of an ABI parameter, for decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamKind {
	/// `address`
	Address,
	/// `uint256`
	Uint,
	/// `bytes32`
	FixedBytes,
	/// `bytes`
	Bytes,
}

/// Four-byte function selector of a canonical signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
	let hash = Keccak256::digest(signature.as_bytes());
	let mut out = [0u8; 4];
	out.copy_from_slice(&hash[..4]);
	out
}

/// ABI-encode a tuple of tokens.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
	let head_len = 32 * tokens.len();
	let mut head = Vec::with_capacity(head_len);
	let mut tail: Vec<u8> = Vec::new();

	for token in tokens {
		match token {
			Token::Address(address) => {
				head.extend_from_slice(H256::from(*address).as_bytes());
			}
			Token::Uint(value) => {
				let mut word = [0u8; 32];
				value.to_big_endian(&mut word);
				head.extend_from_slice(&word);
			}
			Token::FixedBytes(value) => {
				head.extend_from_slice(value.as_bytes());
			}
			Token::Bytes(bytes) => {
				let mut word = [0u8; 32];
				U256::from(head_len + tail.len()).to_big_endian(&mut word);
				head.extend_from_slice(&word);

				let mut len_word = [0u8; 32];
				U256::from(bytes.len()).to_big_endian(&mut len_word);
				tail.extend_from_slice(&len_word);
				tail.extend_from_slice(bytes);
				while tail.len() % 32 != 0 {
					tail.push(0);
				}
			}
		}
	}

	head.extend_from_slice(&tail);
	head
}

/// ABI-encode a function call: selector followed by the encoded arguments.
#[must_use]
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&selector(signature));
	out.extend_from_slice(&encode(tokens));
	out
}

fn word(data: &[u8], offset: usize) -> Result<H256, ExitError> {
	let end = offset.checked_add(32).ok_or(ExitError::OvmError)?;
	if end > data.len() {
		return Err(ExitError::OvmError);
	}
	Ok(H256::from_slice(&data[offset..end]))
}

/// Decode an ABI-encoded tuple of the given kinds.
pub fn decode(kinds: &[ParamKind], data: &[u8]) -> Result<Vec<Token>, ExitError> {
	let mut tokens = Vec::with_capacity(kinds.len());

	for (index, kind) in kinds.iter().enumerate() {
		let head = word(data, 32 * index)?;
		let token = match kind {
			ParamKind::Address => Token::Address(H160::from(head)),
			ParamKind::Uint => Token::Uint(U256::from_big_endian(head.as_bytes())),
			ParamKind::FixedBytes => Token::FixedBytes(head),
			ParamKind::Bytes => {
				let offset = U256::from_big_endian(head.as_bytes());
				if offset > U256::from(usize::MAX) {
					return Err(ExitError::OvmError);
				}
				let offset = offset.as_usize();

				let len = U256::from_big_endian(word(data, offset)?.as_bytes());
				if len > U256::from(usize::MAX) {
					return Err(ExitError::OvmError);
				}
				let len = len.as_usize();

				let start = offset.checked_add(32).ok_or(ExitError::OvmError)?;
				let end = start.checked_add(len).ok_or(ExitError::OvmError)?;
				if end > data.len() {
					return Err(ExitError::OvmError);
				}
				Token::Bytes(data[start..end].to_vec())
			}
		};
		tokens.push(token);
	}

	Ok(tokens)
}

impl Token {
	/// The token as an address, if it is one.
	pub fn to_address(&self) -> Result<H160, ExitError> {
		match self {
			Self::Address(address) => Ok(*address),
			_ => Err(ExitError::OvmError),
		}
	}

	/// The token as a fixed 32-byte value, if it is one.
	pub fn to_fixed_bytes(&self) -> Result<H256, ExitError> {
		match self {
			Self::FixedBytes(value) => Ok(*value),
			_ => Err(ExitError::OvmError),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selector_matches_known_value() {
		// keccak256("transfer(address,uint256)")[..4] == a9059cbb
		assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
	}

	#[test]
	fn encode_decode_static_tuple() {
		let tokens = [
			Token::Address(H160::repeat_byte(0x11)),
			Token::FixedBytes(H256::repeat_byte(0x22)),
		];
		let encoded = encode(&tokens);
		assert_eq!(encoded.len(), 64);

		let decoded = decode(&[ParamKind::Address, ParamKind::FixedBytes], &encoded).unwrap();
		assert_eq!(&decoded[..], &tokens[..]);
	}

	#[test]
	fn encode_decode_dynamic_bytes() {
		let tokens = [
			Token::Address(H160::repeat_byte(0x11)),
			Token::Bytes(vec![1, 2, 3, 4, 5]),
		];
		let encoded = encode(&tokens);
		// head (2 words) + length word + one padded data word
		assert_eq!(encoded.len(), 128);
		assert_eq!(U256::from_big_endian(&encoded[32..64]), U256::from(64));

		let decoded = decode(&[ParamKind::Address, ParamKind::Bytes], &encoded).unwrap();
		assert_eq!(&decoded[..], &tokens[..]);
	}

	#[test]
	fn decode_truncated_input_errors() {
		assert_eq!(
			decode(&[ParamKind::Uint], &[0u8; 16]),
			Err(ExitError::OvmError)
		);
	}
}
