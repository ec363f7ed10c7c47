use ovm_evm::backend::{Backend, Basic, MemoryAccount, MemoryBackend, MemoryVicinity};
use ovm_evm::tracing::{Event, EventListener};
use ovm_evm::{
	Config, CreateScheme, Executor, ExitError, ExitReason, ExitRevert, Message, Opcode,
	PrecompileFailure, PrecompileOutput, Precompiles,
};
use primitive_types::{H160, H256, U256};
use std::collections::BTreeMap;

const CONFIG: Config = Config::istanbul();

fn account(balance: u64, nonce: u64, code: &[u8]) -> MemoryAccount {
	MemoryAccount {
		balance: U256::from(balance),
		nonce: U256::from(nonce),
		storage: BTreeMap::new(),
		code: code.to_vec(),
	}
}

fn code(hex: &str) -> Vec<u8> {
	hex::decode(hex).unwrap()
}

#[derive(Default)]
struct StepRecorder {
	steps: Vec<(Opcode, Vec<H256>)>,
}

impl EventListener for StepRecorder {
	fn event(&mut self, event: Event<'_>) {
		if let Event::Step { opcode, stack, .. } = event {
			self.steps.push((opcode, stack.data().clone()));
		}
	}
}

#[test]
fn empty_code_call_transfers_value() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(caller, account(100, 0, &[]));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::from(5),
		Vec::new(),
		21000,
	));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.gas_used, 0);
	assert!(result.exec.return_value.is_empty());

	assert_eq!(executor.backend().basic(caller).balance, U256::from(95));
	assert_eq!(executor.backend().basic(target).balance, U256::from(5));
	assert_eq!(executor.backend().checkpoint_depth(), 0);
}

#[test]
fn push_add_stop_runs_cleanly() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// PUSH1 1; PUSH1 2; ADD; STOP
	state.insert(target, account(0, 0, &code("600160020100")));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut recorder = StepRecorder::default();
	let mut executor =
		Executor::new_with_listener(backend, &CONFIG, &precompiles, &mut recorder);

	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		100_000,
	));

	assert!(result.exec.exception.is_none());
	assert!(result.exec.return_value.is_empty());
	// PUSH1 + PUSH1 + ADD at three gas each, STOP is free.
	assert_eq!(result.exec.gas_used, 9);
	assert!(result.exec.gas_used <= 100_000);

	drop(executor);
	let (_, stack_at_stop) = recorder
		.steps
		.iter()
		.find(|(opcode, _)| *opcode == Opcode::STOP)
		.expect("a STOP step was observed");
	assert_eq!(stack_at_stop, &vec![H256::from_low_u64_be(3)]);
}

#[test]
fn jump_to_non_jumpdest_consumes_all_gas() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// PUSH1 3; JUMP; STOP; JUMPDEST
	state.insert(target, account(0, 0, &code("600356005b")));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let gas_limit = 50_000;
	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		gas_limit,
	));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Error(ExitError::InvalidJump))
	);
	assert_eq!(result.exec.gas_used, gas_limit);
	assert_eq!(result.exec.gas, 0);
	assert_eq!(executor.backend().checkpoint_depth(), 0);
}

#[test]
fn revert_refunds_remaining_gas() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// PUSH1 0; PUSH1 0; REVERT
	state.insert(target, account(0, 0, &code("60006000fd")));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let gas_limit = 50_000;
	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		gas_limit,
	));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Revert(ExitRevert::Reverted))
	);
	assert!(result.exec.return_value.is_empty());
	assert!(result.exec.gas > 0);
	assert_eq!(result.exec.gas, gas_limit - result.exec.gas_used);
}

#[test]
fn create_collision_fails_with_all_gas() {
	let caller = H160::repeat_byte(0x10);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(caller, account(0, 1, &[]));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let address = executor.create_address(CreateScheme::Legacy { caller });
	executor.backend_mut().put_basic(
		address,
		Basic {
			balance: U256::zero(),
			nonce: U256::one(),
		},
	);

	let gas_limit = 60_000;
	let result =
		executor.execute_message(Message::create(caller, U256::zero(), code("00"), gas_limit));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Error(ExitError::CreateCollision))
	);
	assert_eq!(result.exec.gas_used, gas_limit);
	assert_eq!(result.created_address, None);
}

#[test]
fn create_deploys_returned_code() {
	let caller = H160::repeat_byte(0x10);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(caller, account(0, 1, &[]));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	// Init code returning the two bytes `0x6001` as the deployed code:
	// PUSH2 0x6001; PUSH1 0; MSTORE; PUSH1 2; PUSH1 30; RETURN
	let init = code("6160016000526002601ef3");
	let result =
		executor.execute_message(Message::create(caller, U256::zero(), init, 200_000));

	assert!(result.exec.exception.is_none());
	let address = result.created_address.expect("create succeeded");
	assert_eq!(executor.backend().code(address), code("6001"));
	// A Spurious Dragon fork bumps the fresh contract's nonce.
	assert_eq!(executor.backend().basic(address).nonce, U256::one());
}

#[test]
fn nested_call_splices_return_data() {
	let caller = H160::repeat_byte(0x10);
	let a = H160::repeat_byte(0xaa);
	let b = H160::repeat_byte(0xbb);

	// B: return the 32-byte word 42.
	let b_code = code("602a60005260206000f3");
	// A: CALL B, then return the copied 32 bytes.
	let mut a_code = code("6020600060006000600073");
	a_code.extend_from_slice(b.as_bytes());
	a_code.extend_from_slice(&code("61fffff160206000f3"));

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(a, account(0, 0, &a_code));
	state.insert(b, account(0, 0, &b_code));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		a,
		U256::zero(),
		Vec::new(),
		500_000,
	));

	assert!(result.exec.exception.is_none());
	assert_eq!(
		result.exec.return_value,
		H256::from_low_u64_be(42).as_bytes().to_vec()
	);
	assert_eq!(executor.backend().checkpoint_depth(), 0);
}

#[test]
fn static_call_rejects_storage_writes() {
	let caller = H160::repeat_byte(0x10);
	let a = H160::repeat_byte(0xaa);
	let b = H160::repeat_byte(0xbb);

	// B: PUSH1 1; PUSH1 0; SSTORE
	let b_code = code("6001600055");
	// A: STATICCALL B, store the success flag, return it.
	let mut a_code = code("600060006000600073");
	a_code.extend_from_slice(b.as_bytes());
	a_code.extend_from_slice(&code("61fffffa60005260206000f3"));

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(a, account(0, 0, &a_code));
	state.insert(b, account(0, 0, &b_code));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		a,
		U256::zero(),
		Vec::new(),
		500_000,
	));

	assert!(result.exec.exception.is_none());
	// The child raised `StaticStateChange`, so the flag word is zero.
	assert_eq!(result.exec.return_value, vec![0u8; 32]);
	// Nothing was stored.
	assert_eq!(
		executor.backend().storage(b, H256::zero()),
		H256::zero()
	);
}

#[test]
fn static_entry_message_rejects_storage_writes() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(target, account(0, 0, &code("6001600055")));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let gas_limit = 50_000;
	let mut message = Message::call(caller, target, U256::zero(), Vec::new(), gas_limit);
	message.is_static = true;
	let result = executor.execute_message(message);

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Error(ExitError::StaticStateChange))
	);
	assert_eq!(result.exec.gas_used, gas_limit);
}

#[test]
fn reverted_message_leaves_state_untouched() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// PUSH1 1; PUSH1 0; SSTORE; PUSH1 0; PUSH1 0; REVERT
	state.insert(target, account(7, 0, &code("600160005560006000fd")));
	let backend = MemoryBackend::new(&vicinity, state);
	let initial = backend.state().clone();

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		100_000,
	));

	assert!(matches!(
		result.exec.exception,
		Some(ExitReason::Revert(_))
	));
	assert_eq!(executor.backend().state(), &initial);
	assert_eq!(executor.backend().checkpoint_depth(), 0);
}

#[test]
fn storage_clear_accrues_refund() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// PUSH1 0; PUSH1 0; SSTORE clears the pre-existing slot.
	let mut target_account = account(0, 0, &code("6000600055"));
	target_account
		.storage
		.insert(H256::zero(), H256::from_low_u64_be(1));
	state.insert(target, target_account);
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		100_000,
	));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.gas_refund, CONFIG.refund_sstore_clears);
	assert_eq!(
		executor.backend().storage(target, H256::zero()),
		H256::zero()
	);
}

#[test]
fn selfdestruct_moves_balance_and_marks_account() {
	let caller = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x20);
	let beneficiary = H160::repeat_byte(0x30);

	// PUSH20 beneficiary; SELFDESTRUCT
	let mut target_code = code("73");
	target_code.extend_from_slice(beneficiary.as_bytes());
	target_code.push(0xff);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(target, account(9, 0, &target_code));
	let backend = MemoryBackend::new(&vicinity, state);

	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		target,
		U256::zero(),
		Vec::new(),
		100_000,
	));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.selfdestruct.get(&target), Some(&beneficiary));
	assert_eq!(
		executor.backend().basic(beneficiary).balance,
		U256::from(9)
	);
	assert_eq!(executor.backend().basic(target).balance, U256::zero());
}

#[test]
fn precompile_dispatch_bypasses_code() {
	fn identity(
		data: &[u8],
		_gas_limit: Option<u64>,
		_config: &Config,
	) -> Result<(PrecompileOutput, u64), PrecompileFailure> {
		Ok((
			PrecompileOutput {
				output: data.to_vec(),
			},
			18,
		))
	}

	let caller = H160::repeat_byte(0x10);
	let address = H160::from_low_u64_be(4);

	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());

	let mut precompiles = Precompiles::new();
	precompiles.insert(address, identity as ovm_evm::PrecompileFn);

	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		caller,
		address,
		U256::zero(),
		vec![1, 2, 3],
		30_000,
	));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.return_value, vec![1, 2, 3]);
	assert_eq!(result.exec.gas_used, 18);
}

#[test]
fn checkpoint_then_revert_is_a_noop() {
	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(H160::repeat_byte(0x10), account(1, 2, &[0x00]));
	let mut backend = MemoryBackend::new(&vicinity, state);
	let initial = backend.state().clone();

	backend.checkpoint();
	backend.put_basic(
		H160::repeat_byte(0x99),
		Basic {
			balance: U256::from(5),
			nonce: U256::zero(),
		},
	);
	backend.revert();
	assert_eq!(backend.state(), &initial);

	backend.checkpoint();
	backend.set_storage(
		H160::repeat_byte(0x10),
		H256::zero(),
		H256::from_low_u64_be(3),
	);
	backend.commit();
	assert_eq!(
		backend.storage(H160::repeat_byte(0x10), H256::zero()),
		H256::from_low_u64_be(3)
	);
	assert_eq!(backend.checkpoint_depth(), 0);
}
