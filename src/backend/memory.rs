use super::{Backend, Basic};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Vicinity value of a memory backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryVicinity {
	/// Gas price.
	pub gas_price: U256,
	/// Origin.
	pub origin: H160,
	/// Chain ID.
	pub chain_id: U256,
	/// Environmental block hashes.
	pub block_hashes: Vec<H256>,
	/// Environmental block number.
	pub block_number: U256,
	/// Environmental coinbase.
	pub block_coinbase: H160,
	/// Environmental block timestamp.
	pub block_timestamp: U256,
	/// Environmental block difficulty.
	pub block_difficulty: U256,
	/// Environmental block gas limit.
	pub block_gas_limit: U256,
}

impl Default for MemoryVicinity {
	fn default() -> Self {
		Self {
			gas_price: U256::zero(),
			origin: H160::default(),
			chain_id: U256::one(),
			block_hashes: Vec::new(),
			block_number: U256::zero(),
			block_coinbase: H160::default(),
			block_timestamp: U256::zero(),
			block_difficulty: U256::zero(),
			block_gas_limit: U256::MAX,
		}
	}
}

/// Account information of a memory backend.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: U256,
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

/// Memory backend: stores all state in `BTreeMap` layers. Each checkpoint
/// pushes a copy of the topmost layer; commits collapse the top into its
/// parent and reverts drop it.
#[derive(Clone, Debug)]
pub struct MemoryBackend<'vicinity> {
	vicinity: &'vicinity MemoryVicinity,
	layers: Vec<BTreeMap<H160, MemoryAccount>>,
}

impl<'vicinity> MemoryBackend<'vicinity> {
	/// Create a new memory backend.
	#[must_use]
	pub fn new(
		vicinity: &'vicinity MemoryVicinity,
		state: BTreeMap<H160, MemoryAccount>,
	) -> Self {
		let mut layers = Vec::new();
		layers.push(state);
		Self { vicinity, layers }
	}

	/// The current state map.
	#[must_use]
	pub fn state(&self) -> &BTreeMap<H160, MemoryAccount> {
		self.layers.last().expect("at least one layer is always present")
	}

	fn state_mut(&mut self) -> &mut BTreeMap<H160, MemoryAccount> {
		self.layers
			.last_mut()
			.expect("at least one layer is always present")
	}
}

impl<'vicinity> Backend for MemoryBackend<'vicinity> {
	fn gas_price(&self) -> U256 {
		self.vicinity.gas_price
	}

	fn origin(&self) -> H160 {
		self.vicinity.origin
	}

	fn block_hash(&self, number: U256) -> H256 {
		if number >= self.vicinity.block_number
			|| self.vicinity.block_number - number - U256::one()
				>= U256::from(self.vicinity.block_hashes.len())
		{
			H256::default()
		} else {
			let index = (self.vicinity.block_number - number - U256::one()).as_usize();
			self.vicinity.block_hashes[index]
		}
	}

	fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}

	fn block_coinbase(&self) -> H160 {
		self.vicinity.block_coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.vicinity.block_timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.vicinity.block_difficulty
	}

	fn block_gas_limit(&self) -> U256 {
		self.vicinity.block_gas_limit
	}

	fn chain_id(&self) -> U256 {
		self.vicinity.chain_id
	}

	fn exists(&self, address: H160) -> bool {
		self.state().contains_key(&address)
	}

	fn basic(&self, address: H160) -> Basic {
		self.state()
			.get(&address)
			.map(|a| Basic {
				balance: a.balance,
				nonce: a.nonce,
			})
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state()
			.get(&address)
			.map(|a| a.code.clone())
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state()
			.get(&address)
			.map(|a| a.storage.get(&index).copied().unwrap_or_default())
			.unwrap_or_default()
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.layers[0]
			.get(&address)
			.map(|a| a.storage.get(&index).copied().unwrap_or_default())
			.unwrap_or_default()
	}

	fn put_basic(&mut self, address: H160, basic: Basic) {
		let account = self.state_mut().entry(address).or_default();
		account.balance = basic.balance;
		account.nonce = basic.nonce;
	}

	fn inc_nonce(&mut self, address: H160) {
		let account = self.state_mut().entry(address).or_default();
		account.nonce += U256::one();
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		let account = self.state_mut().entry(address).or_default();
		account.code = code;
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		let account = self.state_mut().entry(address).or_default();
		if value == H256::default() {
			account.storage.remove(&index);
		} else {
			account.storage.insert(index, value);
		}
	}

	fn reset_storage(&mut self, address: H160) {
		if let Some(account) = self.state_mut().get_mut(&address) {
			account.storage = BTreeMap::new();
		}
	}

	fn checkpoint(&mut self) {
		let top = self.state().clone();
		self.layers.push(top);
	}

	fn commit(&mut self) {
		let top = self
			.layers
			.pop()
			.expect("commit is always matched with a checkpoint");
		*self.state_mut() = top;
	}

	fn revert(&mut self) {
		self.layers
			.pop()
			.expect("revert is always matched with a checkpoint");
	}

	fn checkpoint_depth(&self) -> usize {
		self.layers.len() - 1
	}
}
