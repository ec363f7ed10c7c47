use ovm_evm::backend::{Backend, MemoryAccount, MemoryBackend, MemoryVicinity};
use ovm_evm::ovm::abi::{self, Token};
use ovm_evm::ovm::{
	DEPLOYED_CONTRACT_SLOT, EXECUTION_MANAGER, MOCK_ACCOUNT_CODE, STATE_MANAGER,
};
use ovm_evm::{Config, Executor, ExitError, ExitReason, ExitRevert, Message, Precompiles};
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

fn code(s: &str) -> Vec<u8> {
	hex::decode(s).unwrap()
}

fn state_manager_call(data: Vec<u8>) -> Message {
	Message::call(
		H160::repeat_byte(0x10),
		STATE_MANAGER,
		U256::zero(),
		data,
		100_000,
	)
}

#[test]
fn state_manager_storage_round_trips() {
	let subject = H160::repeat_byte(0x77);
	let slot = H256::from_low_u64_be(3);
	let value = H256::repeat_byte(0xab);

	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"setStorage(address,bytes32,bytes32)",
		&[
			Token::Address(subject),
			Token::FixedBytes(slot),
			Token::FixedBytes(value),
		],
	)));

	assert!(result.exec.exception.is_none());
	assert!(result.exec.return_value.is_empty());
	assert_eq!(result.exec.gas_used, 0);
	assert_eq!(executor.backend().storage(subject, slot), value);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getStorage(address,bytes32)",
		&[Token::Address(subject), Token::FixedBytes(slot)],
	)));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.return_value, value.as_bytes().to_vec());
}

#[test]
fn state_manager_unset_storage_reads_zero() {
	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getStorageView(address,bytes32)",
		&[
			Token::Address(H160::repeat_byte(0x77)),
			Token::FixedBytes(H256::from_low_u64_be(9)),
		],
	)));

	assert!(result.exec.exception.is_none());
	assert_eq!(result.exec.return_value, vec![0u8; 32]);
}

#[test]
fn state_manager_nonce_round_trips() {
	let subject = H160::repeat_byte(0x77);

	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getOvmContractNonce(address)",
		&[Token::Address(subject)],
	)));
	assert_eq!(result.exec.return_value, vec![0u8; 32]);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"incrementOvmContractNonce(address)",
		&[Token::Address(subject)],
	)));
	assert!(result.exec.exception.is_none());

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getOvmContractNonce(address)",
		&[Token::Address(subject)],
	)));
	assert_eq!(
		result.exec.return_value,
		H256::from_low_u64_be(1).as_bytes().to_vec()
	);
}

#[test]
fn state_manager_returns_deployed_bytecode() {
	let subject = H160::repeat_byte(0x77);
	let deployed = code("6001600101");

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(subject, account(0, 0, &deployed));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getCodeContractBytecode(address)",
		&[Token::Address(subject)],
	)));

	assert!(result.exec.exception.is_none());
	assert_eq!(
		result.exec.return_value,
		abi::encode(&[Token::Bytes(deployed)])
	);
}

#[test]
fn state_manager_address_lookup_is_identity() {
	let subject = H160::repeat_byte(0x77);

	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(state_manager_call(abi::encode_call(
		"getCodeContractAddressFromOvmAddress(address)",
		&[Token::Address(subject)],
	)));

	assert_eq!(
		result.exec.return_value,
		abi::encode(&[Token::Address(subject)])
	);
}

#[test]
fn state_manager_rejects_unknown_selector() {
	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result =
		executor.execute_message(state_manager_call(vec![0xde, 0xad, 0xbe, 0xef]));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Error(ExitError::OvmError))
	);
}

/// Execution Manager bytecode that forwards to `target` with a 32-byte
/// return area, then returns those 32 bytes.
fn forwarding_em_code(target: H160) -> Vec<u8> {
	let mut em = code("6020600060006000600073");
	em.extend_from_slice(target.as_bytes());
	em.extend_from_slice(&code("61fffff160206000f3"));
	em
}

#[test]
fn entry_message_is_rewritten_and_target_latched() {
	let user = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x77);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(
		EXECUTION_MANAGER,
		account(0, 0, &forwarding_em_code(target)),
	);
	// Target returns the word 42.
	state.insert(target, account(0, 0, &code("602a60005260206000f3")));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		user,
		target,
		U256::zero(),
		code("deadbeef"),
		1_000_000,
	));

	// The outer result is composed from the latched target message.
	assert!(result.exec.exception.is_none());
	assert_eq!(
		result.exec.return_value,
		H256::from_low_u64_be(42).as_bytes().to_vec()
	);

	// The fresh externally-owned caller received the wrapper code.
	assert_eq!(executor.backend().code(user), MOCK_ACCOUNT_CODE.to_vec());
	assert_eq!(executor.backend().checkpoint_depth(), 0);
}

#[test]
fn trace_without_target_is_an_ovm_error() {
	let user = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x77);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	// The Execution Manager stops without producing any nested message.
	state.insert(EXECUTION_MANAGER, account(0, 0, &code("00")));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		user,
		target,
		U256::zero(),
		Vec::new(),
		1_000_000,
	));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Error(ExitError::OvmError))
	);
}

#[test]
fn target_revert_data_is_stripped_of_flag_prefix() {
	let user = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x77);

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(
		EXECUTION_MANAGER,
		account(0, 0, &forwarding_em_code(target)),
	);
	// Target reverts with 162 zero bytes: PUSH1 162; PUSH1 0; REVERT.
	state.insert(target, account(0, 0, &code("60a26000fd")));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let result = executor.execute_message(Message::call(
		user,
		target,
		U256::zero(),
		Vec::new(),
		1_000_000,
	));

	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Revert(ExitRevert::Reverted))
	);
	// The 160 flag-prefix bytes are stripped from the revert payload.
	assert_eq!(result.exec.return_value.len(), 2);
}

#[test]
fn eoa_wrapper_false_word_marks_failed_deployment() {
	let user = H160::repeat_byte(0x10);
	let deploy_address = H160::repeat_byte(0x99);

	// Execution Manager: CREATE an empty contract, then call the wrapper
	// account (the entry caller), then stop.
	let em = code("600060006000f050600060006000600060003361fffff15000");

	// Wrapper returning 32 zero bytes.
	let wrapper = code("60206000f3");

	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	let mut em_account = account(0, 0, &em);
	let mut slot = H256::zero();
	slot.0[12..].copy_from_slice(deploy_address.as_bytes());
	em_account.storage.insert(DEPLOYED_CONTRACT_SLOT, slot);
	state.insert(EXECUTION_MANAGER, em_account);
	state.insert(user, account(0, 0, &wrapper));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	// A deployment entry: `to` is absent.
	let result = executor.execute_message(Message::create(
		user,
		U256::zero(),
		Vec::new(),
		1_000_000,
	));

	// The creation itself succeeded at the dictated address, but the
	// wrapper reported failure, so the outer result is a revert.
	assert_eq!(result.created_address, Some(deploy_address));
	assert_eq!(
		result.exec.exception,
		Some(ExitReason::Revert(ExitRevert::Reverted))
	);
}

#[test]
fn pseudo_contract_accounts_are_restored_after_the_trace() {
	let user = H160::repeat_byte(0x10);
	let target = H160::repeat_byte(0x77);

	let em_code = forwarding_em_code(target);
	let vicinity = MemoryVicinity::default();
	let mut state = BTreeMap::new();
	state.insert(EXECUTION_MANAGER, account(55, 7, &em_code));
	state.insert(target, account(0, 0, &code("602a60005260206000f3")));
	let backend = MemoryBackend::new(&vicinity, state);
	let precompiles = Precompiles::new();
	let mut executor = Executor::new(backend, &CONFIG, &precompiles);

	let _ = executor.execute_message(Message::call(
		user,
		target,
		U256::zero(),
		Vec::new(),
		1_000_000,
	));

	assert_eq!(executor.backend().code(EXECUTION_MANAGER), em_code);
	assert_eq!(
		executor.backend().basic(EXECUTION_MANAGER).balance,
		U256::from(55)
	);
	assert_eq!(
		executor.backend().basic(EXECUTION_MANAGER).nonce,
		U256::from(7)
	);
}
