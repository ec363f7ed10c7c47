use crate::backend::Log;
use crate::ExitReason;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// One unit of execution. Created by the caller, or recursively by the
/// CALL/CREATE opcode handlers, and discarded when `execute_message`
/// returns.
#[derive(Clone, Debug)]
pub struct Message {
	/// Message sender.
	pub caller: H160,
	/// Message target. Absent exactly when the message creates a contract.
	pub to: Option<H160>,
	/// Transferred value.
	pub value: U256,
	/// Call data. For creations this holds the init code until dispatch
	/// promotes it.
	pub data: Vec<u8>,
	/// Code to run. Resolved lazily before interpretation begins.
	pub code: Option<Vec<u8>>,
	/// Gas limit of this message.
	pub gas_limit: u64,
	/// Call depth; zero at entry.
	pub depth: usize,
	/// Whether state mutation is forbidden.
	pub is_static: bool,
	/// Whether this message suppresses value transfer and keeps the parent's
	/// caller and value.
	pub delegatecall: bool,
	/// Salt for deterministic creation.
	pub salt: Option<H256>,
	/// Address whose code is being executed. Differs from `to` under
	/// delegate and callcode schemes.
	pub code_address: H160,
	/// The pre-rewrite target, recorded by the OVM entry rewrite.
	pub original_target_address: Option<H160>,
}

impl Message {
	/// A call message at entry depth.
	#[must_use]
	pub fn call(caller: H160, to: H160, value: U256, data: Vec<u8>, gas_limit: u64) -> Self {
		Self {
			caller,
			to: Some(to),
			value,
			data,
			code: None,
			gas_limit,
			depth: 0,
			is_static: false,
			delegatecall: false,
			salt: None,
			code_address: to,
			original_target_address: None,
		}
	}

	/// A contract-creation message at entry depth.
	#[must_use]
	pub fn create(caller: H160, value: U256, init_code: Vec<u8>, gas_limit: u64) -> Self {
		Self {
			caller,
			to: None,
			value,
			data: init_code,
			code: None,
			gas_limit,
			depth: 0,
			is_static: false,
			delegatecall: false,
			salt: None,
			code_address: H160::default(),
			original_target_address: None,
		}
	}

	/// Whether this message is the user-visible target of an OVM trace whose
	/// entry rewrite recorded `entry_target`. The first nested message
	/// addressed at the recorded target (or, for deployments, the first
	/// nested creation) latches.
	#[must_use]
	pub fn is_target_message(&self, entry_target: Option<H160>) -> bool {
		if self.depth == 0 {
			return false;
		}

		match (entry_target, self.to) {
			(Some(target), Some(to)) => to == target,
			(None, None) => true,
			_ => false,
		}
	}
}

/// Result of running one message's code.
#[derive(Clone, Debug)]
pub struct ExecResult {
	/// The typed error this message exited with, or `None` on success.
	pub exception: Option<ExitReason>,
	/// Returned bytes.
	pub return_value: Vec<u8>,
	/// Gas consumed by this message. Equals the gas limit for every failing
	/// non-revert message.
	pub gas_used: u64,
	/// Gas handed back to the caller. Non-zero on success and on revert.
	pub gas: u64,
	/// The executor's refund counter as of this message's exit.
	pub gas_refund: i64,
	/// Logs accumulated by this message and its committed children.
	pub logs: Vec<Log>,
	/// Accounts marked for destruction, with their beneficiaries.
	pub selfdestruct: BTreeMap<H160, H160>,
}

impl ExecResult {
	pub(crate) fn empty_success(gas_limit: u64) -> Self {
		Self {
			exception: None,
			return_value: Vec::new(),
			gas_used: 0,
			gas: gas_limit,
			gas_refund: 0,
			logs: Vec::new(),
			selfdestruct: BTreeMap::new(),
		}
	}

	pub(crate) fn failed(reason: ExitReason, gas_limit: u64) -> Self {
		Self {
			exception: Some(reason),
			return_value: Vec::new(),
			gas_used: gas_limit,
			gas: 0,
			gas_refund: 0,
			logs: Vec::new(),
			selfdestruct: BTreeMap::new(),
		}
	}

	/// The exit reason of this result: the carried exception, or success.
	#[must_use]
	pub fn reason(&self) -> ExitReason {
		self.exception
			.clone()
			.unwrap_or(ExitReason::Succeed(crate::ExitSucceed::Returned))
	}
}

/// Result of one `execute_message` invocation.
#[derive(Clone, Debug)]
pub struct ExecutedMessage {
	/// Total gas consumed by the message.
	pub gas_used: u64,
	/// Address of the created contract, for successful creations.
	pub created_address: Option<H160>,
	/// The execution result.
	pub exec: ExecResult,
}
