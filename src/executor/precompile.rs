use crate::{Config, ExitError};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::H160;

/// Data returned by a precompile on success.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct PrecompileOutput {
	/// Returned bytes.
	pub output: Vec<u8>,
}

/// Data returned by a precompile in case of failure.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PrecompileFailure {
	/// Reverts the state changes and consumes all the gas.
	Error {
		/// The wrapped error.
		exit_status: ExitError,
	},
	/// Reverts the state changes and returns the provided output.
	Revert {
		/// Revert payload.
		output: Vec<u8>,
	},
}

impl From<ExitError> for PrecompileFailure {
	fn from(error: ExitError) -> Self {
		Self::Error { exit_status: error }
	}
}

/// A native function standing in for expensive cryptographic byte-code.
/// Takes the call data, the gas limit and the active fork configuration; on
/// success returns the output together with the gas cost.
pub type PrecompileFn =
	fn(&[u8], Option<u64>, &Config) -> Result<(PrecompileOutput, u64), PrecompileFailure>;

/// The precompile registry, keyed by code address.
pub type Precompiles = BTreeMap<H160, PrecompileFn>;
