//! The OVM sandbox surface: the well-known pseudo-contract addresses, the
//! mock ECDSA contract-account bytecode, the entry calldata encoding and the
//! state-manager bridge.

pub mod abi;
pub mod state_manager;

use self::abi::Token;
use alloc::vec::Vec;
use primitive_types::{H160, H256};

/// Address of the Execution Manager pseudo-contract. Entry messages are
/// re-targeted here.
pub const EXECUTION_MANAGER: H160 = H160([
	0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	0x00, 0x00, 0x00, 0x00, 0x01,
]);

/// Address of the State Manager pseudo-contract. Calls routed here are
/// served by the host instead of running byte-code.
pub const STATE_MANAGER: H160 = H160([
	0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	0x00, 0x00, 0x00, 0x00, 0x02,
]);

/// Execution Manager storage slot holding the address of the most recently
/// deployed contract. Creations on the entry path read their address here.
pub const DEPLOYED_CONTRACT_SLOT: H256 = H256([
	0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	0x00, 0x0f,
]);

/// The mock ECDSA contract-account bytecode: returns a single true word.
/// Installed at fresh externally-owned entry callers, and used to recognise
/// wrapper accounts by their deployed code.
pub const MOCK_ACCOUNT_CODE: &[u8] = &[
	0x60, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
];

/// Number of flag-prefix bytes the Execution Manager prepends to revert
/// data. Stripped before the revert payload is surfaced to the caller.
pub const REVERT_FLAG_PREFIX_LEN: usize = 160;

/// A contract the engine knows by address or by deployed code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OvmContract {
	/// The Execution Manager pseudo-contract.
	ExecutionManager,
	/// The State Manager pseudo-contract.
	StateManager,
	/// A mock ECDSA contract account wrapping an externally-owned account.
	EcdsaContractAccount,
}

/// Recognise a contract from its address and deployed code.
#[must_use]
pub fn contract_kind(address: H160, code: &[u8]) -> Option<OvmContract> {
	if address == EXECUTION_MANAGER {
		Some(OvmContract::ExecutionManager)
	} else if address == STATE_MANAGER {
		Some(OvmContract::StateManager)
	} else if code == MOCK_ACCOUNT_CODE {
		Some(OvmContract::EcdsaContractAccount)
	} else {
		None
	}
}

/// Encode the Execution Manager entry call wrapping the original message:
/// `executeTransaction(address,bytes)` over the pre-rewrite target (zero for
/// creations) and the original call data.
#[must_use]
pub fn entry_calldata(target: Option<H160>, data: &[u8]) -> Vec<u8> {
	abi::encode_call(
		"executeTransaction(address,bytes)",
		&[
			Token::Address(target.unwrap_or_default()),
			Token::Bytes(data.to_vec()),
		],
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wrapper_code_is_recognised_anywhere() {
		let address = H160::repeat_byte(0xaa);
		assert_eq!(
			contract_kind(address, MOCK_ACCOUNT_CODE),
			Some(OvmContract::EcdsaContractAccount)
		);
		assert_eq!(contract_kind(address, &[0x60, 0x01]), None);
	}

	#[test]
	fn system_addresses_win_over_code() {
		assert_eq!(
			contract_kind(EXECUTION_MANAGER, MOCK_ACCOUNT_CODE),
			Some(OvmContract::ExecutionManager)
		);
		assert_eq!(
			contract_kind(STATE_MANAGER, &[]),
			Some(OvmContract::StateManager)
		);
	}

	#[test]
	fn entry_calldata_embeds_target_and_payload() {
		let target = H160::repeat_byte(0x77);
		let data = entry_calldata(Some(target), &[0xde, 0xad]);
		assert_eq!(&data[..4], &abi::selector("executeTransaction(address,bytes)"));
		assert_eq!(&data[16..36], target.as_bytes());
		// length word of the dynamic payload
		assert_eq!(data[4 + 64 + 31], 2);
	}
}
