//! # OVM message-execution engine
//!
//! An Ethereum-style virtual machine fork adapted to run Optimistic VM
//! transaction traces. The engine is a recursive message executor: entry
//! messages are rewritten into Execution Manager calls, nested calls and
//! creations run through a byte-code interpreter against transactional
//! state checkpoints, and calls addressed at the State Manager
//! pseudo-contract are served by the host out of the backing state.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use ovm_evm_core::*;
pub use ovm_evm_gasometer as gasometer;
pub use ovm_evm_runtime::*;

pub mod backend;
pub mod executor;
pub mod ovm;
pub mod tracing;

pub use crate::executor::{
	ExecResult, ExecutedMessage, Executor, Message, PrecompileFailure, PrecompileFn,
	PrecompileOutput, Precompiles,
};
