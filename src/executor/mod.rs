//! The recursive message executor.
//!
//! `execute_message` is the single entry point: it opens a state checkpoint,
//! rewrites depth-zero messages into the OVM sandbox, dispatches calls and
//! creations, and matches the checkpoint with a commit or revert on exit.
//! Child messages spawned by the CALL and CREATE opcode families recurse
//! through the same path; the executor itself is the [`Handler`] the
//! interpreter runs against.

mod message;
mod precompile;

pub use self::message::{ExecResult, ExecutedMessage, Message};
pub use self::precompile::{PrecompileFailure, PrecompileFn, PrecompileOutput, Precompiles};

use crate::backend::{Backend, Basic, Log};
use crate::gasometer::{self, Gasometer};
use crate::ovm::{self, state_manager};
use crate::tracing::{Event, EventListener, NoopListener};
use crate::{
	Config, Context, CreateScheme, ExitError, ExitReason, ExitRevert, Handler, Machine, Opcode,
	Runtime, Transfer,
};
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::{max, min};
use core::mem;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

fn l64(gas: u64) -> u64 {
	gas - gas / 64
}

/// Per-interpreter-run bookkeeping: the frame's gasometer and the context
/// flags the opcode handlers consult.
struct Frame<'config> {
	gasometer: Gasometer<'config>,
	is_static: bool,
	depth: usize,
}

/// State of one OVM trace, latched by the depth-zero entry rewrite and
/// consumed by the exit reconciliation.
struct OvmTrace {
	entry_target: Option<H160>,
	target_message: Option<Message>,
	target_result: Option<ExecutedMessage>,
	account_message_result: Option<ExecResult>,
	initial_em_state: (Basic, Vec<u8>),
	initial_sm_state: (Basic, Vec<u8>),
}

/// The message executor. Owns the backend for the duration of one or more
/// transactions and borrows the fork configuration and precompile registry.
pub struct Executor<'config, 'precompiles, B, L = NoopListener> {
	backend: B,
	config: &'config Config,
	precompiles: &'precompiles Precompiles,
	listener: L,
	frame: Option<Frame<'config>>,
	logs: Vec<Log>,
	selfdestructs: BTreeMap<H160, H160>,
	ovm: Option<OvmTrace>,
}

impl<'config, 'precompiles, B: Backend> Executor<'config, 'precompiles, B, NoopListener> {
	/// Create a new executor with no event listener.
	pub fn new(backend: B, config: &'config Config, precompiles: &'precompiles Precompiles) -> Self {
		Self::new_with_listener(backend, config, precompiles, NoopListener)
	}
}

impl<'config, 'precompiles, B: Backend, L: EventListener> Executor<'config, 'precompiles, B, L> {
	/// Create a new executor with the given event listener.
	pub fn new_with_listener(
		backend: B,
		config: &'config Config,
		precompiles: &'precompiles Precompiles,
		listener: L,
	) -> Self {
		Self {
			backend,
			config,
			precompiles,
			listener,
			frame: None,
			logs: Vec::new(),
			selfdestructs: BTreeMap::new(),
			ovm: None,
		}
	}

	/// Reference to the config.
	#[must_use]
	pub const fn config(&self) -> &'config Config {
		self.config
	}

	/// Reference to the backend.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Mutable reference to the backend.
	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}

	/// Deconstruct the executor, returning the backend.
	pub fn into_backend(self) -> B {
		self.backend
	}

	/// All logs committed so far.
	#[must_use]
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	fn frame(&self) -> &Frame<'config> {
		self.frame
			.as_ref()
			.expect("opcode handlers only run inside an interpreter frame")
	}

	fn frame_mut(&mut self) -> &mut Frame<'config> {
		self.frame
			.as_mut()
			.expect("opcode handlers only run inside an interpreter frame")
	}

	/// Execute one message and reconcile its state effects.
	pub fn execute_message(&mut self, mut message: Message) -> ExecutedMessage {
		self.listener.event(Event::BeforeMessage { message: &message });
		self.backend.checkpoint();

		let logs_mark = self.logs.len();
		let selfdestructs_mark = self.selfdestructs.clone();

		// The sandbox boundary: entry messages are rewritten into Execution
		// Manager calls when an Execution Manager is deployed.
		if message.depth == 0 && !self.backend.code(ovm::EXECUTION_MANAGER).is_empty() {
			self.rewrite_entry(&mut message);
		}

		let mut latched_here = false;
		if let Some(trace) = &mut self.ovm {
			if trace.target_message.is_none() && message.is_target_message(trace.entry_target) {
				trace.target_message = Some(message.clone());
				latched_here = true;
			}
		}

		let (created_address, mut exec) = match message.to {
			Some(to) => {
				// The deployed code decides what the callee is: the state
				// manager bypasses interpretation entirely, a recognised
				// wrapper account runs like any other contract.
				let kind = ovm::contract_kind(to, &self.backend.code(to));
				if kind == Some(ovm::OvmContract::StateManager) {
					match state_manager::handle_call(&mut self.backend, &message) {
						Ok(return_value) => {
							let mut exec = ExecResult::empty_success(message.gas_limit);
							exec.return_value = return_value;
							(None, exec)
						}
						Err(e) => (None, ExecResult::failed(e.into(), message.gas_limit)),
					}
				} else {
					if kind == Some(ovm::OvmContract::EcdsaContractAccount) {
						log::trace!(target: "ovm", "calling wrapper account {}", to);
					}
					(None, self.execute_call(&mut message, to))
				}
			}
			None => self.execute_create(&mut message),
		};

		if exec.exception.is_some() {
			// Typed error: logs are cleared and the checkpoint rolls back.
			self.logs.truncate(logs_mark);
			self.selfdestructs = selfdestructs_mark;
			self.backend.revert();
		} else {
			exec.logs = self.logs[logs_mark..].to_vec();
			self.backend.commit();
		}
		exec.selfdestruct = self.selfdestructs.clone();

		let mut result = ExecutedMessage {
			gas_used: exec.gas_used,
			created_address,
			exec,
		};

		if latched_here {
			if let Some(trace) = &mut self.ovm {
				trace.target_result = Some(result.clone());
			}
		}

		if message.depth == 1 && message.to != Some(ovm::STATE_MANAGER) {
			if let Some(trace) = &mut self.ovm {
				trace.account_message_result = Some(result.exec.clone());
			}
		}

		if message.depth == 0 && self.ovm.is_some() {
			result = self.reconcile_ovm_exit(result);
		}

		self.listener.event(Event::AfterMessage { result: &result });
		result
	}

	/// Install the sandbox entry: give fresh externally-owned callers the
	/// mock wrapper code, snapshot the pseudo-contracts, and re-target the
	/// message at the Execution Manager.
	fn rewrite_entry(&mut self, message: &mut Message) {
		if self.backend.code(message.caller).is_empty() {
			self.backend
				.set_code(message.caller, ovm::MOCK_ACCOUNT_CODE.to_vec());
		}

		let initial_em_state = (
			self.backend.basic(ovm::EXECUTION_MANAGER),
			self.backend.code(ovm::EXECUTION_MANAGER),
		);
		let initial_sm_state = (
			self.backend.basic(ovm::STATE_MANAGER),
			self.backend.code(ovm::STATE_MANAGER),
		);

		let target = message.to;
		log::debug!(target: "ovm", "rewriting entry message, target {:?}", target);

		message.original_target_address = target;
		message.data = ovm::entry_calldata(target, &message.data);
		message.to = Some(ovm::EXECUTION_MANAGER);
		message.code_address = ovm::EXECUTION_MANAGER;
		message.code = None;

		self.ovm = Some(OvmTrace {
			entry_target: target,
			target_message: None,
			target_result: None,
			account_message_result: None,
			initial_em_state,
			initial_sm_state,
		});
	}

	/// Compose the outer result of an OVM trace from the latched target
	/// message, and restore the pseudo-contract accounts.
	fn reconcile_ovm_exit(&mut self, outer: ExecutedMessage) -> ExecutedMessage {
		let trace = match self.ovm.take() {
			Some(trace) => trace,
			None => return outer,
		};

		// The pseudo-contracts are scaffolding; leave them as they were
		// found.
		let (em_basic, em_code) = trace.initial_em_state;
		self.backend.put_basic(ovm::EXECUTION_MANAGER, em_basic);
		self.backend.set_code(ovm::EXECUTION_MANAGER, em_code);
		let (sm_basic, sm_code) = trace.initial_sm_state;
		self.backend.put_basic(ovm::STATE_MANAGER, sm_basic);
		self.backend.set_code(ovm::STATE_MANAGER, sm_code);

		let target = match trace.target_result {
			Some(target) => target,
			None => {
				log::debug!(target: "ovm", "trace produced no target message");
				let mut exec = outer.exec;
				exec.exception = Some(ExitError::OvmError.into());
				exec.return_value = Vec::new();
				return ExecutedMessage {
					gas_used: outer.gas_used,
					created_address: None,
					exec,
				};
			}
		};

		let mut exec = outer.exec;
		exec.logs.retain(|log| log.address != ovm::EXECUTION_MANAGER);
		exec.exception = target.exec.exception.clone();
		exec.return_value = target.exec.return_value;

		// The Execution Manager prefixes revert data with its flag words.
		if matches!(exec.exception, Some(ExitReason::Revert(_)))
			&& exec.return_value.len() >= ovm::REVERT_FLAG_PREFIX_LEN
		{
			exec.return_value = exec.return_value.split_off(ovm::REVERT_FLAG_PREFIX_LEN);
		}

		// An EOA wrapper reporting a false word marks a failed deployment
		// even when the deployment itself exited cleanly.
		if exec.exception.is_none() {
			if let Some(account) = &trace.account_message_result {
				if account.return_value.len() == 32
					&& account.return_value.iter().all(|b| *b == 0)
				{
					exec.exception = Some(ExitRevert::Reverted.into());
				}
			}
		}

		ExecutedMessage {
			gas_used: outer.gas_used,
			created_address: target.created_address,
			exec,
		}
	}

	fn execute_call(&mut self, message: &mut Message, to: H160) -> ExecResult {
		let mut transfer_error = None;
		if !message.delegatecall {
			if let Err(e) = self.backend.withdraw(message.caller, message.value) {
				let mut exec = ExecResult::empty_success(message.gas_limit);
				exec.exception = Some(e.into());
				return exec;
			}
			if let Err(e) = self.backend.deposit(to, message.value) {
				// Captured; surfaced once the code has been resolved.
				transfer_error = Some(e);
			}
		}

		if message.code.is_none() {
			if let Some(precompile) = self.precompiles.get(&message.code_address).copied() {
				if let Some(e) = transfer_error {
					let mut exec = ExecResult::empty_success(message.gas_limit);
					exec.exception = Some(e.into());
					return exec;
				}
				return self.run_precompile(precompile, message);
			}
			message.code = Some(self.backend.code(message.code_address));
		}

		let code = message.code.clone().unwrap_or_default();
		if code.is_empty() || transfer_error.is_some() {
			let mut exec = ExecResult::empty_success(message.gas_limit);
			exec.exception = transfer_error.map(|e| e.into());
			return exec;
		}

		let (reason, return_value, gasometer) = self.run_interpreter(message, code, to);
		finish_frame(reason, return_value, &gasometer)
	}

	fn execute_create(&mut self, message: &mut Message) -> (Option<H160>, ExecResult) {
		if let Err(e) = self.backend.withdraw(message.caller, message.value) {
			let mut exec = ExecResult::empty_success(message.gas_limit);
			exec.exception = Some(e.into());
			return (None, exec);
		}

		// Promote the call data to init code.
		let init_code = mem::take(&mut message.data);
		message.code = Some(init_code.clone());

		let address = self.create_address_for(message);
		message.code_address = address;

		let prospect = self.backend.basic(address);
		if prospect.nonce > U256::zero() || !self.backend.code(address).is_empty() {
			log::debug!(target: "ovm", "create collision at {}", address);
			return (
				None,
				ExecResult::failed(ExitError::CreateCollision.into(), message.gas_limit),
			);
		}

		self.backend.reset_storage(address);
		self.listener.event(Event::NewContract {
			address,
			code: &init_code,
		});

		if self.config.create_increase_nonce {
			self.backend.inc_nonce(address);
		}

		if let Err(e) = self.backend.deposit(address, message.value) {
			let mut exec = ExecResult::empty_success(message.gas_limit);
			exec.exception = Some(e.into());
			return (None, exec);
		}

		let (reason, return_value, mut gasometer) = self.run_interpreter(message, init_code, address);

		match reason {
			ExitReason::Succeed(_) => {
				let out = return_value;

				if let Some(limit) = self.config.create_contract_limit {
					if out.len() > limit {
						gasometer.fail();
						return (
							None,
							ExecResult::failed(
								ExitError::CreateContractLimit.into(),
								message.gas_limit,
							),
						);
					}
				}

				if gasometer.record_deposit(out.len()).is_err() {
					return (
						None,
						ExecResult::failed(ExitError::OutOfGas.into(), message.gas_limit),
					);
				}

				log::debug!(target: "ovm", "created contract at {} ({} bytes)", address, out.len());
				self.backend.set_code(address, out);

				let mut exec = ExecResult::empty_success(message.gas_limit);
				exec.gas_used = gasometer.total_used_gas();
				exec.gas = gasometer.gas();
				exec.gas_refund = max(0, gasometer.refunded_gas());
				(Some(address), exec)
			}
			reason => (None, finish_frame(reason, return_value, &gasometer)),
		}
	}

	/// Resolve the deploy address of a creation message.
	fn create_address_for(&self, message: &Message) -> H160 {
		if self.ovm.is_some() {
			// Entry path: the Execution Manager dictates the address.
			let slot = self
				.backend
				.storage(ovm::EXECUTION_MANAGER, ovm::DEPLOYED_CONTRACT_SLOT);
			return H160::from(slot);
		}

		let scheme = match message.salt {
			Some(salt) => {
				let code_hash = H256::from_slice(
					Keccak256::digest(message.code.as_deref().unwrap_or_default()).as_slice(),
				);
				CreateScheme::Create2 {
					caller: message.caller,
					code_hash,
					salt,
				}
			}
			None => CreateScheme::Legacy {
				caller: message.caller,
			},
		};
		self.create_address(scheme)
	}

	/// Get the create address from the given scheme.
	#[must_use]
	pub fn create_address(&self, scheme: CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Create2 {
				caller,
				code_hash,
				salt,
			} => {
				let mut hasher = Keccak256::new();
				hasher.update([0xff]);
				hasher.update(&caller[..]);
				hasher.update(&salt[..]);
				hasher.update(&code_hash[..]);
				H256::from_slice(hasher.finalize().as_slice()).into()
			}
			CreateScheme::Legacy { caller } => {
				// The CREATE handler bumps the caller's nonce before
				// dispatch; derive from the pre-bump value.
				let nonce = self
					.backend
					.basic(caller)
					.nonce
					.saturating_sub(U256::one());
				let mut stream = rlp::RlpStream::new_list(2);
				stream.append(&caller);
				stream.append(&nonce);
				H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
			}
			CreateScheme::Fixed(address) => address,
		}
	}

	fn run_precompile(&mut self, precompile: PrecompileFn, message: &Message) -> ExecResult {
		match precompile(&message.data, Some(message.gas_limit), self.config) {
			Ok((output, cost)) => {
				if cost > message.gas_limit {
					return ExecResult::failed(ExitError::OutOfGas.into(), message.gas_limit);
				}
				let mut exec = ExecResult::empty_success(message.gas_limit);
				exec.return_value = output.output;
				exec.gas_used = cost;
				exec.gas = message.gas_limit - cost;
				exec
			}
			Err(PrecompileFailure::Error { exit_status }) => {
				ExecResult::failed(exit_status.into(), message.gas_limit)
			}
			Err(PrecompileFailure::Revert { output }) => {
				let mut exec = ExecResult::failed(
					ExitReason::Revert(ExitRevert::Reverted),
					message.gas_limit,
				);
				exec.return_value = output;
				exec
			}
		}
	}

	/// Run the interpreter over one frame and return the exit reason, the
	/// returned bytes and the frame's gasometer.
	fn run_interpreter(
		&mut self,
		message: &Message,
		code: Vec<u8>,
		address: H160,
	) -> (ExitReason, Vec<u8>, Gasometer<'config>) {
		let context = Context {
			address,
			caller: message.caller,
			apparent_value: message.value,
		};

		let parent = self.frame.take();
		self.frame = Some(Frame {
			gasometer: Gasometer::new(message.gas_limit, self.config),
			is_static: message.is_static,
			depth: message.depth,
		});

		let mut runtime = Runtime::new(
			Rc::new(code),
			Rc::new(message.data.clone()),
			context,
			self.config.stack_limit,
			self.config.memory_limit,
		);
		let reason = runtime.run(self);
		let return_value = runtime.machine().return_value();

		let frame = self
			.frame
			.take()
			.expect("the frame opened above is intact after the run");
		self.frame = parent;

		(reason, return_value, frame.gasometer)
	}
}

/// Post-run charging: non-revert failures consume the entire gas limit;
/// reverts hand the remaining gas back; refunds survive only success.
fn finish_frame(reason: ExitReason, return_value: Vec<u8>, gasometer: &Gasometer) -> ExecResult {
	match reason {
		ExitReason::Succeed(_) => {
			let mut exec = ExecResult::empty_success(gasometer.gas_limit());
			exec.return_value = return_value;
			exec.gas_used = gasometer.total_used_gas();
			exec.gas = gasometer.gas();
			exec.gas_refund = max(0, gasometer.refunded_gas());
			exec
		}
		reason @ ExitReason::Revert(_) => {
			let mut exec = ExecResult::failed(reason, gasometer.gas_limit());
			exec.return_value = return_value;
			exec.gas_used = gasometer.total_used_gas();
			exec.gas = gasometer.gas_limit() - exec.gas_used;
			exec
		}
		reason => ExecResult::failed(reason, gasometer.gas_limit()),
	}
}

impl<'config, 'precompiles, B: Backend, L: EventListener> Handler
	for Executor<'config, 'precompiles, B, L>
{
	fn balance(&self, address: H160) -> U256 {
		self.backend.basic(address).balance
	}

	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.backend.code(address).len())
	}

	fn code_hash(&self, address: H160) -> H256 {
		if !self.exists(address) {
			return H256::default();
		}

		let code = self.backend.code(address);
		if code.is_empty() {
			H256::default()
		} else {
			H256::from_slice(Keccak256::digest(&code).as_slice())
		}
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.backend.code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.backend.storage(address, index)
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.backend.original_storage(address, index)
	}

	fn exists(&self, address: H160) -> bool {
		if self.config.empty_considered_exists {
			self.backend.exists(address)
		} else {
			let basic = self.backend.basic(address);
			self.backend.exists(address)
				&& !(basic.balance.is_zero()
					&& basic.nonce.is_zero()
					&& self.backend.code(address).is_empty())
		}
	}

	fn deleted(&self, address: H160) -> bool {
		self.selfdestructs.contains_key(&address)
	}

	fn gas_left(&self) -> U256 {
		U256::from(self.frame().gasometer.gas())
	}

	fn gas_price(&self) -> U256 {
		self.backend.gas_price()
	}

	fn origin(&self) -> H160 {
		self.backend.origin()
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.backend.block_hash(number)
	}

	fn block_number(&self) -> U256 {
		self.backend.block_number()
	}

	fn block_coinbase(&self) -> H160 {
		self.backend.block_coinbase()
	}

	fn block_timestamp(&self) -> U256 {
		self.backend.block_timestamp()
	}

	fn block_difficulty(&self) -> U256 {
		self.backend.block_difficulty()
	}

	fn block_gas_limit(&self) -> U256 {
		self.backend.block_gas_limit()
	}

	fn chain_id(&self) -> U256 {
		self.backend.chain_id()
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.backend.set_storage(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		self.logs.push(Log {
			address,
			topics,
			data,
		});
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.backend.basic(address).balance;
		self.backend.withdraw(address, balance)?;
		self.backend.deposit(target, balance)?;
		self.selfdestructs.insert(address, target);
		Ok(())
	}

	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		let (depth, is_static) = {
			let frame = self.frame();
			(frame.depth, frame.is_static)
		};

		if depth + 1 > self.config.call_stack_limit {
			return (ExitError::CallTooDeep.into(), None, Vec::new());
		}
		if self.balance(caller) < value {
			return (ExitError::OutOfFund.into(), None, Vec::new());
		}

		let after_gas = if self.config.call_l64_after_gas {
			l64(self.frame().gasometer.gas())
		} else {
			self.frame().gasometer.gas()
		};
		let target_gas = target_gas.unwrap_or(after_gas);
		let gas_limit = min(after_gas, target_gas);
		if let Err(e) = self.frame_mut().gasometer.record_cost(gas_limit) {
			return (e.into(), None, Vec::new());
		}

		// The deploy address derives from the pre-bump nonce.
		self.backend.inc_nonce(caller);

		let salt = match scheme {
			CreateScheme::Create2 { salt, .. } => Some(salt),
			_ => None,
		};

		let message = Message {
			caller,
			to: None,
			value,
			data: init_code,
			code: None,
			gas_limit,
			depth: depth + 1,
			is_static,
			delegatecall: false,
			salt,
			code_address: H160::default(),
			original_target_address: None,
		};

		let result = self.execute_message(message);
		let _ = self.frame_mut().gasometer.record_stipend(result.exec.gas);
		if result.exec.exception.is_none() {
			let _ = self
				.frame_mut()
				.gasometer
				.record_refund(result.exec.gas_refund);
		}

		(
			result.exec.reason(),
			result.created_address,
			result.exec.return_value,
		)
	}

	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		is_static: bool,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		let (depth, frame_static) = {
			let frame = self.frame();
			(frame.depth, frame.is_static)
		};

		if depth + 1 > self.config.call_stack_limit {
			return (ExitError::CallTooDeep.into(), Vec::new());
		}

		let after_gas = if self.config.call_l64_after_gas {
			l64(self.frame().gasometer.gas())
		} else {
			self.frame().gasometer.gas()
		};
		let target_gas = target_gas.unwrap_or(after_gas);
		let mut gas_limit = min(after_gas, target_gas);
		if let Err(e) = self.frame_mut().gasometer.record_cost(gas_limit) {
			return (e.into(), Vec::new());
		}

		if let Some(transfer) = &transfer {
			if !transfer.value.is_zero() {
				gas_limit = gas_limit.saturating_add(self.config.call_stipend);
			}
		}

		let message = Message {
			caller: context.caller,
			to: Some(context.address),
			value: context.apparent_value,
			data: input,
			code: None,
			gas_limit,
			depth: depth + 1,
			is_static: is_static || frame_static,
			delegatecall: transfer.is_none(),
			salt: None,
			code_address,
			original_target_address: None,
		};

		let result = self.execute_message(message);
		let _ = self.frame_mut().gasometer.record_stipend(result.exec.gas);
		if result.exec.exception.is_none() {
			let _ = self
				.frame_mut()
				.gasometer
				.record_refund(result.exec.gas_refund);
		}

		(result.exec.reason(), result.exec.return_value)
	}

	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		machine: &Machine,
	) -> Result<(), ExitError> {
		{
			let frame = self
				.frame
				.as_ref()
				.expect("opcode handlers only run inside an interpreter frame");
			self.listener.event(Event::Step {
				address: context.address,
				depth: frame.depth,
				opcode,
				position: machine.position().clone().unwrap_or_default(),
				gas_left: frame.gasometer.gas(),
				stack: machine.stack(),
				memory: machine.memory(),
			});
		}

		if let Some(cost) = gasometer::static_opcode_cost(opcode) {
			self.frame_mut().gasometer.record_cost(cost)?;
		} else {
			let is_static = self.frame().is_static;
			let (gas_cost, memory_cost) = gasometer::dynamic_opcode_cost(
				context.address,
				opcode,
				machine.stack(),
				is_static,
				self.config,
				&*self,
			)?;
			self.frame_mut()
				.gasometer
				.record_dynamic_cost(gas_cost, memory_cost)?;
		}

		Ok(())
	}
}
