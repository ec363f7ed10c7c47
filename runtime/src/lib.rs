//! Runtime layer for the OVM message-execution engine: the interpreter step
//! loop and the execution environment interface it runs against.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod context;
mod eval;
mod handler;

pub use ovm_evm_core::*;

pub use crate::config::Config;
pub use crate::context::{CallScheme, Context, CreateScheme};
pub use crate::handler::{Handler, Transfer};

use alloc::rc::Rc;
use alloc::vec::Vec;

/// EVM runtime: one interpreter invocation over a machine, with the call
/// context and the return-data buffer of the frame.
pub struct Runtime {
	machine: Machine,
	status: Result<(), ExitReason>,
	return_data_buffer: Vec<u8>,
	context: Context,
}

impl Runtime {
	/// Create a new runtime with given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		context: Context,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		Self {
			machine: Machine::new(code, data, stack_limit, memory_limit),
			status: Ok(()),
			return_data_buffer: Vec::new(),
			context,
		}
	}

	/// Reference to the machine.
	#[must_use]
	pub fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Mutable reference to the machine. Used by hosts that start the
	/// interpreter at a non-zero program counter.
	pub fn machine_mut(&mut self) -> &mut Machine {
		&mut self.machine
	}

	/// Reference to the runtime context.
	#[must_use]
	pub const fn context(&self) -> &Context {
		&self.context
	}

	/// Step the runtime: charge the next opcode through the handler's
	/// pre-validation, execute it, and resolve it against the handler if it
	/// traps. `Err` carries the exit reason once the runtime has finished.
	pub fn step<H: Handler>(&mut self, handler: &mut H) -> Result<(), ExitReason> {
		if let Some((opcode, _stack)) = self.machine.inspect() {
			if let Err(error) = handler.pre_validate(&self.context, opcode, &self.machine) {
				self.machine.exit(error.clone().into());
				self.status = Err(error.into());
			}
		}

		match &self.status {
			Ok(()) => (),
			Err(exit) => return Err(exit.clone()),
		}

		match self.machine.step() {
			Ok(()) => Ok(()),
			Err(Capture::Exit(exit)) => {
				self.status = Err(exit.clone());
				Err(exit)
			}
			Err(Capture::Trap(opcode)) => match eval::eval(self, opcode, handler) {
				eval::Control::Continue => Ok(()),
				eval::Control::Exit(exit) => {
					self.machine.exit(exit.clone());
					self.status = Err(exit.clone());
					Err(exit)
				}
			},
		}
	}

	/// Loop stepping the runtime until it exits.
	pub fn run<H: Handler>(&mut self, handler: &mut H) -> ExitReason {
		loop {
			match self.step(handler) {
				Ok(()) => (),
				Err(exit) => return exit,
			}
		}
	}
}
