#[macro_use]
mod macros;
mod system;

use crate::{CallScheme, ExitError, ExitReason, Handler, Opcode, Runtime};
use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::{H160, H256, U256};

/// Control state after resolving one trapped opcode.
pub enum Control {
	/// Continue the step loop.
	Continue,
	/// Exit with the given reason.
	Exit(ExitReason),
}

pub fn eval<H: Handler>(runtime: &mut Runtime, opcode: Opcode, handler: &mut H) -> Control {
	match opcode {
		Opcode::SHA3 => system::sha3(runtime),
		Opcode::ADDRESS => system::address(runtime),
		Opcode::BALANCE => system::balance(runtime, handler),
		Opcode::SELFBALANCE => system::selfbalance(runtime, handler),
		Opcode::ORIGIN => system::origin(runtime, handler),
		Opcode::CALLER => system::caller(runtime),
		Opcode::CALLVALUE => system::callvalue(runtime),
		Opcode::GASPRICE => system::gasprice(runtime, handler),
		Opcode::EXTCODESIZE => system::extcodesize(runtime, handler),
		Opcode::EXTCODEHASH => system::extcodehash(runtime, handler),
		Opcode::EXTCODECOPY => system::extcodecopy(runtime, handler),
		Opcode::RETURNDATASIZE => system::returndatasize(runtime),
		Opcode::RETURNDATACOPY => system::returndatacopy(runtime),
		Opcode::BLOCKHASH => system::blockhash(runtime, handler),
		Opcode::COINBASE => system::coinbase(runtime, handler),
		Opcode::TIMESTAMP => system::timestamp(runtime, handler),
		Opcode::NUMBER => system::number(runtime, handler),
		Opcode::DIFFICULTY => system::difficulty(runtime, handler),
		Opcode::GASLIMIT => system::gaslimit(runtime, handler),
		Opcode::CHAINID => system::chainid(runtime, handler),
		Opcode::SLOAD => system::sload(runtime, handler),
		Opcode::SSTORE => system::sstore(runtime, handler),
		Opcode::GAS => system::gas(runtime, handler),
		Opcode::LOG0 => system::log(runtime, 0, handler),
		Opcode::LOG1 => system::log(runtime, 1, handler),
		Opcode::LOG2 => system::log(runtime, 2, handler),
		Opcode::LOG3 => system::log(runtime, 3, handler),
		Opcode::LOG4 => system::log(runtime, 4, handler),
		Opcode::SUICIDE => system::suicide(runtime, handler),
		Opcode::CREATE => system::create(runtime, false, handler),
		Opcode::CREATE2 => system::create(runtime, true, handler),
		Opcode::CALL => system::call(runtime, CallScheme::Call, handler),
		Opcode::CALLCODE => system::call(runtime, CallScheme::CallCode, handler),
		Opcode::DELEGATECALL => system::call(runtime, CallScheme::DelegateCall, handler),
		Opcode::STATICCALL => system::call(runtime, CallScheme::StaticCall, handler),
		_ => Control::Exit(ExitError::InvalidOpcode(opcode).into()),
	}
}

pub fn finish_call(
	runtime: &mut Runtime,
	out_len: usize,
	out_offset: usize,
	reason: ExitReason,
	return_data: Vec<u8>,
) -> Control {
	runtime.return_data_buffer = return_data;
	let target_len = min(out_len, runtime.return_data_buffer.len());

	match reason {
		ExitReason::Succeed(_) => {
			let buffer = runtime.return_data_buffer.clone();
			match runtime
				.machine
				.memory_mut()
				.copy_large(out_offset, U256::zero(), target_len, &buffer)
			{
				Ok(()) => {
					push_u256!(runtime, U256::one());
					Control::Continue
				}
				Err(_) => {
					push_u256!(runtime, U256::zero());
					Control::Continue
				}
			}
		}
		ExitReason::Revert(_) => {
			push_u256!(runtime, U256::zero());

			let buffer = runtime.return_data_buffer.clone();
			let _ = runtime
				.machine
				.memory_mut()
				.copy_large(out_offset, U256::zero(), target_len, &buffer);

			Control::Continue
		}
		ExitReason::Error(_) => {
			runtime.return_data_buffer = Vec::new();
			push_u256!(runtime, U256::zero());

			Control::Continue
		}
		ExitReason::Fatal(e) => {
			push_u256!(runtime, U256::zero());

			Control::Exit(e.into())
		}
	}
}

pub fn finish_create(
	runtime: &mut Runtime,
	reason: ExitReason,
	address: Option<H160>,
	return_data: Vec<u8>,
) -> Control {
	match reason {
		ExitReason::Succeed(_) => {
			runtime.return_data_buffer = Vec::new();
			let create_address: H256 = address.map(H256::from).unwrap_or_default();
			push_h256!(runtime, create_address);

			Control::Continue
		}
		ExitReason::Revert(_) => {
			runtime.return_data_buffer = return_data;
			push_h256!(runtime, H256::default());

			Control::Continue
		}
		ExitReason::Error(_) => {
			runtime.return_data_buffer = Vec::new();
			push_h256!(runtime, H256::default());

			Control::Continue
		}
		ExitReason::Fatal(e) => {
			push_h256!(runtime, H256::default());

			Control::Exit(e.into())
		}
	}
}
