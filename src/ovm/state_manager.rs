//! The State-Manager bridge: calls addressed at the State Manager
//! pseudo-contract are decoded by selector and served directly out of the
//! backend, without running any byte-code.

use super::abi::{self, ParamKind, Token};
use crate::backend::Backend;
use crate::executor::Message;
use crate::ExitError;
use alloc::vec::Vec;

/// Handle a call to the State Manager pseudo-contract, returning the
/// ABI-encoded return tuple. Unknown selectors and malformed arguments are
/// explicit errors; the bridge never guesses.
pub fn handle_call<B: Backend>(backend: &mut B, message: &Message) -> Result<Vec<u8>, ExitError> {
	if message.data.len() < 4 {
		return Err(ExitError::OvmError);
	}

	let mut selector = [0u8; 4];
	selector.copy_from_slice(&message.data[..4]);
	let args = &message.data[4..];

	if selector == abi::selector("setStorage(address,bytes32,bytes32)") {
		let tokens = abi::decode(
			&[ParamKind::Address, ParamKind::FixedBytes, ParamKind::FixedBytes],
			args,
		)?;
		let address = tokens[0].to_address()?;
		let slot = tokens[1].to_fixed_bytes()?;
		let value = tokens[2].to_fixed_bytes()?;

		log::trace!(target: "ovm", "state manager setStorage {:?} {:?}", address, slot);
		backend.set_storage(address, slot, value);
		Ok(Vec::new())
	} else if selector == abi::selector("getStorage(address,bytes32)")
		|| selector == abi::selector("getStorageView(address,bytes32)")
	{
		let tokens = abi::decode(&[ParamKind::Address, ParamKind::FixedBytes], args)?;
		let address = tokens[0].to_address()?;
		let slot = tokens[1].to_fixed_bytes()?;

		let value = backend.storage(address, slot);
		Ok(abi::encode(&[Token::FixedBytes(value)]))
	} else if selector == abi::selector("getOvmContractNonce(address)") {
		let tokens = abi::decode(&[ParamKind::Address], args)?;
		let address = tokens[0].to_address()?;

		let nonce = backend.basic(address).nonce;
		Ok(abi::encode(&[Token::Uint(nonce)]))
	} else if selector == abi::selector("getCodeContractBytecode(address)") {
		let tokens = abi::decode(&[ParamKind::Address], args)?;
		let address = tokens[0].to_address()?;

		let code = backend.code(address);
		Ok(abi::encode(&[Token::Bytes(code)]))
	} else if selector == abi::selector("incrementOvmContractNonce(address)") {
		let tokens = abi::decode(&[ParamKind::Address], args)?;
		let address = tokens[0].to_address()?;

		backend.inc_nonce(address);
		Ok(Vec::new())
	} else if selector == abi::selector("registerCreatedContract(address)") {
		let tokens = abi::decode(&[ParamKind::Address], args)?;
		tokens[0].to_address()?;

		// Hook for extensions; the core records nothing.
		Ok(Vec::new())
	} else if selector == abi::selector("associateCodeContract(address,address)") {
		let tokens = abi::decode(&[ParamKind::Address, ParamKind::Address], args)?;
		tokens[0].to_address()?;
		tokens[1].to_address()?;

		Ok(Vec::new())
	} else if selector == abi::selector("getCodeContractAddressFromOvmAddress(address)") {
		let tokens = abi::decode(&[ParamKind::Address], args)?;
		let address = tokens[0].to_address()?;

		// Identity in this build.
		Ok(abi::encode(&[Token::Address(address)]))
	} else {
		log::debug!(target: "ovm", "state manager call with unknown selector {:02x?}", selector);
		Err(ExitError::OvmError)
	}
}
