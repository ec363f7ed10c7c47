//! Gas metering for the OVM message-execution engine.
//!
//! Base fees for synchronous opcodes come from a static cost table; opcodes
//! whose price depends on their operands or on state are priced by
//! [`dynamic_opcode_cost`], which peeks the stack before the handler runs.
//! Memory expansion cost is tracked monotonically: within one interpreter
//! run the recorded memory gas never decreases.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod consts;
mod costs;
mod utils;

use crate::consts::*;
use core::cmp::max;
use ovm_evm_core::{ExitError, Opcode, Stack};
use ovm_evm_runtime::{Config, Handler};
use primitive_types::{H160, H256, U256};

macro_rules! try_or_fail {
	( $inner:expr, $e:expr ) => {
		match $e {
			Ok(value) => value,
			Err(e) => {
				$inner = Err(e.clone());
				return Err(e);
			}
		}
	};
}

/// EVM gasometer.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	config: &'config Config,
	inner: Result<Inner<'config>, ExitError>,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	#[must_use]
	pub fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			config,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
				refunded_gas: 0,
				config,
			}),
		}
	}

	#[inline]
	fn inner_mut(&mut self) -> Result<&mut Inner<'config>, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	/// Reference to the config.
	#[must_use]
	pub const fn config(&self) -> &'config Config {
		self.config
	}

	/// Gas limit of this frame.
	#[must_use]
	pub const fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	/// Remaining gas.
	#[must_use]
	pub fn gas(&self) -> u64 {
		match &self.inner {
			Ok(inner) => self.gas_limit - inner.used_gas - inner.memory_gas,
			Err(_) => 0,
		}
	}

	/// Total used gas, including memory gas. Equals the gas limit after the
	/// gasometer has failed.
	#[must_use]
	pub fn total_used_gas(&self) -> u64 {
		match &self.inner {
			Ok(inner) => inner.used_gas + inner.memory_gas,
			Err(_) => self.gas_limit,
		}
	}

	/// Refunded gas recorded on this frame.
	#[must_use]
	pub fn refunded_gas(&self) -> i64 {
		match &self.inner {
			Ok(inner) => inner.refunded_gas,
			Err(_) => 0,
		}
	}

	/// Explicitly fail the gasometer, consuming the entire gas limit.
	pub fn fail(&mut self) {
		self.inner = Err(ExitError::OutOfGas);
	}

	/// Record an explicit cost.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		let all_gas_cost = self.total_used_gas().checked_add(cost);
		match all_gas_cost {
			Some(all_gas_cost) if self.gas_limit >= all_gas_cost => {
				let inner = self.inner_mut()?;
				inner.used_gas += cost;
				Ok(())
			}
			_ => {
				self.inner = Err(ExitError::OutOfGas);
				Err(ExitError::OutOfGas)
			}
		}
	}

	/// Record an explicit refund.
	pub fn record_refund(&mut self, refund: i64) -> Result<(), ExitError> {
		let inner = self.inner_mut()?;
		inner.refunded_gas += refund;
		Ok(())
	}

	/// Record a stipend: gas returned to this frame, typically the remaining
	/// gas of a finished child frame.
	pub fn record_stipend(&mut self, stipend: u64) -> Result<(), ExitError> {
		let inner = self.inner_mut()?;
		inner.used_gas -= stipend;
		Ok(())
	}

	/// Record the code-deposit charge of a successful contract creation.
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = (len as u64)
			.checked_mul(self.config.gas_create_data)
			.ok_or(ExitError::OutOfGas)?;
		self.record_cost(cost)
	}

	/// Record the dynamic cost of one opcode, together with its memory
	/// expansion, and accrue any refund it carries. On insufficient gas the
	/// gasometer fails.
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory: Option<MemoryCost>,
	) -> Result<(), ExitError> {
		let gas = self.gas();

		let memory_gas = match memory {
			Some(memory) => try_or_fail!(self.inner, self.inner_mut()?.memory_gas(memory)),
			None => self.inner_mut()?.memory_gas,
		};
		let gas_cost = try_or_fail!(self.inner, self.inner_mut()?.gas_cost(cost, gas));
		let gas_refund = self.inner_mut()?.gas_refund(cost);
		let used_gas = self.inner_mut()?.used_gas;

		let used_gas = match used_gas.checked_add(gas_cost) {
			Some(used_gas) => used_gas,
			None => {
				self.inner = Err(ExitError::OutOfGas);
				return Err(ExitError::OutOfGas);
			}
		};
		let all_gas_cost = match memory_gas.checked_add(used_gas) {
			Some(all_gas_cost) => all_gas_cost,
			None => {
				self.inner = Err(ExitError::OutOfGas);
				return Err(ExitError::OutOfGas);
			}
		};

		if self.gas_limit < all_gas_cost {
			self.inner = Err(ExitError::OutOfGas);
			return Err(ExitError::OutOfGas);
		}

		let inner = self.inner_mut()?;
		inner.used_gas = used_gas;
		inner.memory_gas = memory_gas;
		inner.refunded_gas += gas_refund;

		Ok(())
	}
}

#[derive(Clone, Debug)]
struct Inner<'config> {
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
	config: &'config Config,
}

impl<'config> Inner<'config> {
	/// Memory gas after covering the given region. Monotonic: never below
	/// the already-recorded memory gas.
	fn memory_gas(&self, memory: MemoryCost) -> Result<u64, ExitError> {
		let from = memory.offset;
		let len = memory.len;

		if len.is_zero() {
			return Ok(self.memory_gas);
		}

		let end = from.checked_add(len).ok_or(ExitError::OutOfGas)?;

		if end > U256::from(usize::MAX) {
			return Err(ExitError::OutOfGas);
		}
		let end = end.as_usize();

		let rem = end % 32;
		let new = if rem == 0 { end / 32 } else { end / 32 + 1 };

		Ok(max(self.memory_gas, memory_expansion_gas(new as u64)?))
	}

	fn gas_cost(&self, cost: GasCost, gas: u64) -> Result<u64, ExitError> {
		Ok(match cost {
			GasCost::Zero => G_ZERO,
			GasCost::VeryLow => G_VERYLOW,
			GasCost::ExtCodeSize => self.config.gas_ext_code,
			GasCost::ExtCodeHash => self.config.gas_ext_code_hash,
			GasCost::Balance => self.config.gas_balance,
			GasCost::BlockHash => G_BLOCKHASH,
			GasCost::SLoad => self.config.gas_sload,
			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			GasCost::ExtCodeCopy { len } => costs::extcodecopy_cost(len, self.config)?,
			GasCost::Exp { power } => costs::exp_cost(power, self.config)?,
			GasCost::Create => G_CREATE,
			GasCost::Create2 { len } => costs::create2_cost(len)?,
			GasCost::SStore {
				original,
				current,
				new,
			} => costs::sstore_cost(original, current, new, gas, self.config)?,
			GasCost::Suicide {
				value,
				target_exists,
				..
			} => costs::suicide_cost(value, target_exists, self.config),
			GasCost::Call {
				value,
				target_exists,
			} => costs::call_cost(value, true, true, !target_exists, self.config),
			GasCost::CallCode {
				value,
				target_exists,
			} => costs::call_cost(value, true, false, !target_exists, self.config),
			GasCost::DelegateCall { target_exists } => {
				costs::call_cost(U256::zero(), false, false, !target_exists, self.config)
			}
			GasCost::StaticCall { target_exists } => {
				costs::call_cost(U256::zero(), false, true, !target_exists, self.config)
			}
		})
	}

	fn gas_refund(&self, cost: GasCost) -> i64 {
		match cost {
			GasCost::SStore {
				original,
				current,
				new,
			} => costs::sstore_refund(original, current, new, self.config),
			GasCost::Suicide {
				already_deleted, ..
			} => costs::suicide_refund(already_deleted, self.config),
			_ => 0,
		}
	}
}

fn memory_expansion_gas(words: u64) -> Result<u64, ExitError> {
	let linear = words.checked_mul(G_MEMORY).ok_or(ExitError::OutOfGas)?;
	let quadratic = words
		.checked_mul(words)
		.map(|w| w / 512)
		.ok_or(ExitError::OutOfGas)?;
	linear.checked_add(quadratic).ok_or(ExitError::OutOfGas)
}

/// Gas cost of an opcode whose price depends on its operands or on state.
#[derive(Clone, Copy, Debug)]
pub enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,
	/// Gas cost for `EXTCODESIZE`.
	ExtCodeSize,
	/// Gas cost for `EXTCODEHASH`.
	ExtCodeHash,
	/// Gas cost for `BALANCE`.
	Balance,
	/// Gas cost for `BLOCKHASH`.
	BlockHash,
	/// Gas cost for `SLOAD`.
	SLoad,
	/// Gas cost for `SHA3`.
	Sha3 { len: U256 },
	/// Gas cost for `LOGn`.
	Log { n: u8, len: U256 },
	/// Gas cost for copy opcodes priced at very-low plus per-word copy.
	VeryLowCopy { len: U256 },
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy { len: U256 },
	/// Gas cost for `EXP`.
	Exp { power: U256 },
	/// Gas cost for `CREATE`.
	Create,
	/// Gas cost for `CREATE2`.
	Create2 { len: U256 },
	/// Gas cost for `SSTORE`.
	SStore {
		original: H256,
		current: H256,
		new: H256,
	},
	/// Gas cost for `SELFDESTRUCT`.
	Suicide {
		value: U256,
		target_exists: bool,
		already_deleted: bool,
	},
	/// Gas cost for `CALL`.
	Call { value: U256, target_exists: bool },
	/// Gas cost for `CALLCODE`.
	CallCode { value: U256, target_exists: bool },
	/// Gas cost for `DELEGATECALL`.
	DelegateCall { target_exists: bool },
	/// Gas cost for `STATICCALL`.
	StaticCall { target_exists: bool },
}

/// Memory region touched by an opcode.
#[derive(Clone, Copy, Debug)]
pub struct MemoryCost {
	/// Region offset.
	pub offset: U256,
	/// Region length.
	pub len: U256,
}

impl MemoryCost {
	/// Join two memory regions, keeping the one reaching further.
	#[must_use]
	pub fn join(self, other: Self) -> Self {
		if self.len.is_zero() {
			return other;
		}
		if other.len.is_zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}
}

/// Base fee of an opcode whose cost is operand-independent. `None` for
/// opcodes that must be priced dynamically, and for undefined opcodes.
#[must_use]
pub const fn static_opcode_cost(opcode: Opcode) -> Option<u64> {
	STATIC_COST_TABLE[opcode.as_usize()]
}

const STATIC_COST_TABLE: [Option<u64>; 256] = {
	let mut table = [None; 256];

	table[Opcode::STOP.as_usize()] = Some(G_ZERO);

	table[Opcode::ADD.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SUB.as_usize()] = Some(G_VERYLOW);
	table[Opcode::MUL.as_usize()] = Some(G_LOW);
	table[Opcode::DIV.as_usize()] = Some(G_LOW);
	table[Opcode::SDIV.as_usize()] = Some(G_LOW);
	table[Opcode::MOD.as_usize()] = Some(G_LOW);
	table[Opcode::SMOD.as_usize()] = Some(G_LOW);
	table[Opcode::ADDMOD.as_usize()] = Some(G_MID);
	table[Opcode::MULMOD.as_usize()] = Some(G_MID);
	table[Opcode::SIGNEXTEND.as_usize()] = Some(G_LOW);

	table[Opcode::LT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::GT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SLT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SGT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::EQ.as_usize()] = Some(G_VERYLOW);
	table[Opcode::ISZERO.as_usize()] = Some(G_VERYLOW);
	table[Opcode::AND.as_usize()] = Some(G_VERYLOW);
	table[Opcode::OR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::XOR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::NOT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::BYTE.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SHL.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SHR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SAR.as_usize()] = Some(G_VERYLOW);

	table[Opcode::ADDRESS.as_usize()] = Some(G_BASE);
	table[Opcode::ORIGIN.as_usize()] = Some(G_BASE);
	table[Opcode::CALLER.as_usize()] = Some(G_BASE);
	table[Opcode::CALLVALUE.as_usize()] = Some(G_BASE);
	table[Opcode::CALLDATALOAD.as_usize()] = Some(G_VERYLOW);
	table[Opcode::CALLDATASIZE.as_usize()] = Some(G_BASE);
	table[Opcode::CODESIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GASPRICE.as_usize()] = Some(G_BASE);
	table[Opcode::RETURNDATASIZE.as_usize()] = Some(G_BASE);

	table[Opcode::COINBASE.as_usize()] = Some(G_BASE);
	table[Opcode::TIMESTAMP.as_usize()] = Some(G_BASE);
	table[Opcode::NUMBER.as_usize()] = Some(G_BASE);
	table[Opcode::DIFFICULTY.as_usize()] = Some(G_BASE);
	table[Opcode::GASLIMIT.as_usize()] = Some(G_BASE);
	table[Opcode::CHAINID.as_usize()] = Some(G_BASE);
	table[Opcode::SELFBALANCE.as_usize()] = Some(G_LOW);

	table[Opcode::POP.as_usize()] = Some(G_BASE);
	table[Opcode::PC.as_usize()] = Some(G_BASE);
	table[Opcode::MSIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GAS.as_usize()] = Some(G_BASE);
	table[Opcode::JUMP.as_usize()] = Some(G_MID);
	table[Opcode::JUMPI.as_usize()] = Some(G_HIGH);
	table[Opcode::JUMPDEST.as_usize()] = Some(G_JUMPDEST);

	let mut opcode = Opcode::PUSH1.as_usize();
	while opcode <= Opcode::SWAP16.as_usize() {
		table[opcode] = Some(G_VERYLOW);
		opcode += 1;
	}

	table
};

/// Compute the gas and memory cost of an opcode that is not statically
/// priced. Undefined opcodes yield `InvalidOpcode`; mutations attempted in a
/// static context yield `StaticStateChange`.
pub fn dynamic_opcode_cost<H: Handler>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	is_static: bool,
	config: &Config,
	handler: &H,
) -> Result<(GasCost, Option<MemoryCost>), ExitError> {
	let gas_cost = match opcode {
		Opcode::RETURN => GasCost::Zero,
		Opcode::REVERT if config.has_revert => GasCost::Zero,

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::EXP => GasCost::Exp {
			power: peek_u256(stack, 1)?,
		},
		Opcode::SHA3 => GasCost::Sha3 {
			len: peek_u256(stack, 1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY => GasCost::VeryLowCopy {
			len: peek_u256(stack, 2)?,
		},
		Opcode::RETURNDATACOPY if config.has_return_data => GasCost::VeryLowCopy {
			len: peek_u256(stack, 2)?,
		},
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: peek_u256(stack, 3)?,
		},
		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::EXTCODEHASH if config.has_ext_code_hash => GasCost::ExtCodeHash,
		Opcode::BALANCE => GasCost::Balance,
		Opcode::BLOCKHASH => GasCost::BlockHash,
		Opcode::SLOAD => GasCost::SLoad,

		Opcode::SSTORE => {
			if is_static {
				return Err(ExitError::StaticStateChange);
			}

			let index = peek_h256(stack, 0)?;
			let value = peek_h256(stack, 1)?;

			GasCost::SStore {
				original: handler.original_storage(address, index),
				current: handler.storage(address, index),
				new: value,
			}
		}
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			if is_static {
				return Err(ExitError::StaticStateChange);
			}

			GasCost::Log {
				n: opcode.as_u8() - Opcode::LOG0.as_u8(),
				len: peek_u256(stack, 1)?,
			}
		}
		Opcode::CREATE => {
			if is_static {
				return Err(ExitError::StaticStateChange);
			}

			GasCost::Create
		}
		Opcode::CREATE2 if config.has_create2 => {
			if is_static {
				return Err(ExitError::StaticStateChange);
			}

			GasCost::Create2 {
				len: peek_u256(stack, 2)?,
			}
		}
		Opcode::SUICIDE => {
			if is_static {
				return Err(ExitError::StaticStateChange);
			}

			let target = peek_address(stack, 0)?;

			GasCost::Suicide {
				value: handler.balance(address),
				target_exists: handler.exists(target),
				already_deleted: handler.deleted(address),
			}
		}
		Opcode::CALL => {
			let value = peek_u256(stack, 2)?;
			if is_static && !value.is_zero() {
				return Err(ExitError::StaticStateChange);
			}

			GasCost::Call {
				value,
				target_exists: handler.exists(peek_address(stack, 1)?),
			}
		}
		Opcode::CALLCODE => GasCost::CallCode {
			value: peek_u256(stack, 2)?,
			target_exists: handler.exists(peek_address(stack, 1)?),
		},
		Opcode::DELEGATECALL if config.has_delegate_call => GasCost::DelegateCall {
			target_exists: handler.exists(peek_address(stack, 1)?),
		},
		Opcode::STATICCALL if config.has_static_call => GasCost::StaticCall {
			target_exists: handler.exists(peek_address(stack, 1)?),
		},

		_ => return Err(ExitError::InvalidOpcode(opcode)),
	};

	let memory_cost = match opcode {
		Opcode::SHA3
		| Opcode::RETURN
		| Opcode::REVERT
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4 => Some(MemoryCost {
			offset: peek_u256(stack, 0)?,
			len: peek_u256(stack, 1)?,
		}),

		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: peek_u256(stack, 0)?,
			len: peek_u256(stack, 2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: peek_u256(stack, 1)?,
			len: peek_u256(stack, 3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: peek_u256(stack, 0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: peek_u256(stack, 0)?,
			len: U256::from(1),
		}),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: peek_u256(stack, 1)?,
			len: peek_u256(stack, 2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: peek_u256(stack, 3)?,
				len: peek_u256(stack, 4)?,
			}
			.join(MemoryCost {
				offset: peek_u256(stack, 5)?,
				len: peek_u256(stack, 6)?,
			}),
		),

		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: peek_u256(stack, 2)?,
				len: peek_u256(stack, 3)?,
			}
			.join(MemoryCost {
				offset: peek_u256(stack, 4)?,
				len: peek_u256(stack, 5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}

fn peek_u256(stack: &Stack, no_from_top: usize) -> Result<U256, ExitError> {
	stack
		.peek(no_from_top)
		.map(|value| U256::from_big_endian(&value[..]))
}

fn peek_h256(stack: &Stack, no_from_top: usize) -> Result<H256, ExitError> {
	stack.peek(no_from_top)
}

fn peek_address(stack: &Stack, no_from_top: usize) -> Result<H160, ExitError> {
	stack.peek(no_from_top).map(|value| H160::from(value))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> Config {
		Config::istanbul()
	}

	#[test]
	fn record_cost_fails_past_limit() {
		let config = config();
		let mut gasometer = Gasometer::new(100, &config);
		gasometer.record_cost(60).unwrap();
		assert_eq!(gasometer.gas(), 40);
		assert_eq!(gasometer.record_cost(41), Err(ExitError::OutOfGas));
		// Failure consumes everything.
		assert_eq!(gasometer.gas(), 0);
		assert_eq!(gasometer.total_used_gas(), 100);
	}

	#[test]
	fn memory_gas_is_monotonic() {
		let config = config();
		let mut gasometer = Gasometer::new(10_000, &config);

		gasometer
			.record_dynamic_cost(
				GasCost::VeryLow,
				Some(MemoryCost {
					offset: U256::zero(),
					len: U256::from(64),
				}),
			)
			.unwrap();
		let after_large = gasometer.total_used_gas();

		// Touching a smaller region must not shrink the recorded memory gas.
		gasometer
			.record_dynamic_cost(
				GasCost::VeryLow,
				Some(MemoryCost {
					offset: U256::zero(),
					len: U256::from(32),
				}),
			)
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), after_large + G_VERYLOW);
	}

	#[test]
	fn sstore_refund_on_clear() {
		let config = config();
		let gasometer = Gasometer::new(100_000, &config);
		let refund = match &gasometer.inner {
			Ok(inner) => inner.gas_refund(GasCost::SStore {
				original: H256::from_low_u64_be(1),
				current: H256::from_low_u64_be(1),
				new: H256::zero(),
			}),
			Err(_) => panic!("fresh gasometer"),
		};
		assert_eq!(refund, config.refund_sstore_clears);
	}

	#[test]
	fn static_costs_cover_push_dup_swap() {
		assert_eq!(static_opcode_cost(Opcode::PUSH1), Some(G_VERYLOW));
		assert_eq!(static_opcode_cost(Opcode::DUP16), Some(G_VERYLOW));
		assert_eq!(static_opcode_cost(Opcode::SWAP16), Some(G_VERYLOW));
		assert_eq!(static_opcode_cost(Opcode::SSTORE), None);
		assert_eq!(static_opcode_cost(Opcode(0x0c)), None);
	}
}
