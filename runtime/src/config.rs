/// Runtime configuration: the parameters and feature switches of one hard
/// fork schedule.
#[derive(Clone, Debug)]
pub struct Config {
	/// Gas paid for EXTCODESIZE and EXTCODECOPY.
	pub gas_ext_code: u64,
	/// Gas paid for EXTCODEHASH.
	pub gas_ext_code_hash: u64,
	/// Gas paid for BALANCE opcode.
	pub gas_balance: u64,
	/// Gas paid for SLOAD opcode.
	pub gas_sload: u64,
	/// Gas paid for SSTORE opcode when the storage value is set from zero.
	pub gas_sstore_set: u64,
	/// Gas paid for SSTORE opcode otherwise.
	pub gas_sstore_reset: u64,
	/// Gas refunded for an SSTORE that clears a storage value.
	pub refund_sstore_clears: i64,
	/// Gas refunded for SELFDESTRUCT.
	pub refund_suicide: i64,
	/// Gas paid for SELFDESTRUCT opcode.
	pub gas_suicide: u64,
	/// Gas paid for SELFDESTRUCT opcode when it hits a new account.
	pub gas_suicide_new_account: u64,
	/// Gas paid for CALL opcode.
	pub gas_call: u64,
	/// Gas paid for EXP opcode for every byte of the exponent.
	pub gas_expbyte: u64,
	/// Gas paid per byte of deployed contract code.
	pub gas_create_data: u64,
	/// Gas stipend forwarded to value-bearing calls.
	pub call_stipend: u64,
	/// EIP-2200-style net gas metering for SSTORE.
	pub sstore_gas_metering: bool,
	/// EIP-1706: SSTORE reverts when gas left is below the call stipend.
	pub sstore_revert_under_stipend: bool,
	/// Take l64 of the remaining gas when forwarding to calls and creates.
	pub call_l64_after_gas: bool,
	/// Whether empty account is considered to exist.
	pub empty_considered_exists: bool,
	/// Whether contract creation bumps the fresh contract's nonce.
	pub create_increase_nonce: bool,
	/// Stack limit.
	pub stack_limit: usize,
	/// Memory limit.
	pub memory_limit: usize,
	/// Call stack depth limit.
	pub call_stack_limit: usize,
	/// Deployed code size limit. `None` allows unlimited contract size.
	pub create_contract_limit: Option<usize>,
	/// Maximum portion of consumed gas redeemable through refunds, as the
	/// divisor of total gas used.
	pub max_refund_quotient: u64,
	/// Whether the EVM has DELEGATECALL.
	pub has_delegate_call: bool,
	/// Whether the EVM has CREATE2.
	pub has_create2: bool,
	/// Whether the EVM has REVERT.
	pub has_revert: bool,
	/// Whether the EVM has RETURNDATASIZE and RETURNDATACOPY.
	pub has_return_data: bool,
	/// Whether the EVM has SHL, SHR and SAR.
	pub has_bitwise_shifting: bool,
	/// Whether the EVM has CHAINID.
	pub has_chain_id: bool,
	/// Whether the EVM has SELFBALANCE.
	pub has_self_balance: bool,
	/// Whether the EVM has EXTCODEHASH.
	pub has_ext_code_hash: bool,
	/// Whether the EVM has STATICCALL.
	pub has_static_call: bool,
}

impl Config {
	/// Frontier hard fork configuration.
	#[must_use]
	pub const fn frontier() -> Self {
		Self {
			gas_ext_code: 20,
			gas_ext_code_hash: 20,
			gas_balance: 20,
			gas_sload: 50,
			gas_sstore_set: 20000,
			gas_sstore_reset: 5000,
			refund_sstore_clears: 15000,
			refund_suicide: 24000,
			gas_suicide: 0,
			gas_suicide_new_account: 0,
			gas_call: 40,
			gas_expbyte: 10,
			gas_create_data: 200,
			call_stipend: 2300,
			sstore_gas_metering: false,
			sstore_revert_under_stipend: false,
			call_l64_after_gas: false,
			empty_considered_exists: true,
			create_increase_nonce: false,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			create_contract_limit: None,
			max_refund_quotient: 2,
			has_delegate_call: false,
			has_create2: false,
			has_revert: false,
			has_return_data: false,
			has_bitwise_shifting: false,
			has_chain_id: false,
			has_self_balance: false,
			has_ext_code_hash: false,
			has_static_call: false,
		}
	}

	/// Homestead hard fork configuration.
	#[must_use]
	pub const fn homestead() -> Self {
		let mut config = Self::frontier();
		config.has_delegate_call = true;
		config
	}

	/// Tangerine Whistle hard fork configuration.
	#[must_use]
	pub const fn tangerine_whistle() -> Self {
		let mut config = Self::homestead();
		config.gas_ext_code = 700;
		config.gas_ext_code_hash = 700;
		config.gas_balance = 400;
		config.gas_sload = 200;
		config.gas_call = 700;
		config.gas_suicide = 5000;
		config.gas_suicide_new_account = 25000;
		config.call_l64_after_gas = true;
		config
	}

	/// Spurious Dragon hard fork configuration.
	#[must_use]
	pub const fn spurious_dragon() -> Self {
		let mut config = Self::tangerine_whistle();
		config.gas_expbyte = 50;
		config.empty_considered_exists = false;
		config.create_increase_nonce = true;
		config.create_contract_limit = Some(0x6000);
		config
	}

	/// Byzantium hard fork configuration.
	#[must_use]
	pub const fn byzantium() -> Self {
		let mut config = Self::spurious_dragon();
		config.has_revert = true;
		config.has_return_data = true;
		config.has_static_call = true;
		config
	}

	/// Petersburg hard fork configuration.
	#[must_use]
	pub const fn petersburg() -> Self {
		let mut config = Self::byzantium();
		config.has_bitwise_shifting = true;
		config.has_create2 = true;
		config.has_ext_code_hash = true;
		config
	}

	/// Istanbul hard fork configuration.
	#[must_use]
	pub const fn istanbul() -> Self {
		let mut config = Self::petersburg();
		config.gas_balance = 700;
		config.gas_sload = 800;
		config.sstore_gas_metering = true;
		config.sstore_revert_under_stipend = true;
		config.has_chain_id = true;
		config.has_self_balance = true;
		config
	}
}
