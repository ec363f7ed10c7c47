//! # Backend-related traits and implementations
//!
//! A backend exposes external information that is available to the engine:
//! block information such as the current coinbase and gas limit, as well as
//! the state itself (account balances, nonces, storage and code).
//!
//! The backend also owns the checkpoint stack. The executor opens one
//! checkpoint per message and matches it with exactly one `commit` or
//! `revert` on exit.

mod memory;

pub use self::memory::{MemoryAccount, MemoryBackend, MemoryVicinity};

use crate::{ExitError, Transfer};
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Basic account information: nonce and balance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Basic {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: U256,
}

/// An emitted log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	/// Address that emitted the log.
	pub address: H160,
	/// Log topics.
	pub topics: Vec<H256>,
	/// Log payload.
	pub data: Vec<u8>,
}

/// The state view the executor runs against.
pub trait Backend {
	/// Gas price of the transaction.
	fn gas_price(&self) -> U256;
	/// Origin of the transaction.
	fn origin(&self) -> H160;
	/// Environmental block hash.
	fn block_hash(&self, number: U256) -> H256;
	/// Environmental block number.
	fn block_number(&self) -> U256;
	/// Environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Environmental block gas limit.
	fn block_gas_limit(&self) -> U256;
	/// Environmental chain ID.
	fn chain_id(&self) -> U256;

	/// Whether an account exists.
	fn exists(&self, address: H160) -> bool;
	/// Account balance and nonce.
	fn basic(&self, address: H160) -> Basic;
	/// Deployed code of an account.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Storage value at index; an unset slot reads as 32 zero bytes.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Storage value at index as of the beginning of the transaction.
	fn original_storage(&self, address: H160, index: H256) -> H256;

	/// Write back account balance and nonce.
	fn put_basic(&mut self, address: H160, basic: Basic);
	/// Increment account nonce by one.
	fn inc_nonce(&mut self, address: H160);
	/// Replace deployed code of an account.
	fn set_code(&mut self, address: H160, code: Vec<u8>);
	/// Write a storage slot. Writing 32 zero bytes clears the slot.
	fn set_storage(&mut self, address: H160, index: H256, value: H256);
	/// Clear the whole storage of an account.
	fn reset_storage(&mut self, address: H160);

	/// Debit `value` from an account. Fails with `OutOfFund` when the
	/// balance is insufficient.
	fn withdraw(&mut self, address: H160, value: U256) -> Result<(), ExitError> {
		if value.is_zero() {
			return Ok(());
		}

		let mut basic = self.basic(address);
		basic.balance = basic
			.balance
			.checked_sub(value)
			.ok_or(ExitError::OutOfFund)?;
		self.put_basic(address, basic);
		Ok(())
	}

	/// Credit `value` to an account. Fails with `ValueOverflow` when the
	/// balance would exceed the 256-bit range.
	fn deposit(&mut self, address: H160, value: U256) -> Result<(), ExitError> {
		if value.is_zero() {
			return Ok(());
		}

		let mut basic = self.basic(address);
		basic.balance = basic
			.balance
			.checked_add(value)
			.ok_or(ExitError::ValueOverflow)?;
		self.put_basic(address, basic);
		Ok(())
	}

	/// Move value between two accounts.
	fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError> {
		self.withdraw(transfer.source, transfer.value)?;
		self.deposit(transfer.target, transfer.value)
	}

	/// Open a new checkpoint.
	fn checkpoint(&mut self);
	/// Merge the topmost checkpoint into its parent.
	fn commit(&mut self);
	/// Discard the topmost checkpoint.
	fn revert(&mut self);
	/// Number of open checkpoints.
	fn checkpoint_depth(&self) -> usize;
}
