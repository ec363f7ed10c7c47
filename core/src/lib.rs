//! Core layer for the OVM message-execution engine: the program-counter
//! driven machine together with its stack, memory and jump-destination
//! analysis.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod eval;
mod memory;
mod opcode;
mod stack;
pub mod utils;
mod valids;

pub use crate::error::{
	Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed,
};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::Stack;
pub use crate::valids::Valids;

use crate::eval::{eval, Control};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;
use primitive_types::U256;

/// Core execution layer: the mutable run state of a single interpreter
/// invocation.
#[derive(Clone)]
pub struct Machine {
	/// Program data.
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter.
	position: Result<usize, ExitReason>,
	/// Return value.
	return_range: Range<U256>,
	/// Code validity maps.
	valids: Valids,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
}

impl Machine {
	/// Create a new machine with given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Reference of machine stack.
	#[must_use]
	pub fn stack(&self) -> &Stack {
		&self.stack
	}

	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}

	/// Reference of machine memory.
	#[must_use]
	pub fn memory(&self) -> &Memory {
		&self.memory
	}

	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}

	/// Program code being run.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Return a reference of the program counter.
	#[must_use]
	pub const fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}

	/// Jump-destination analysis of the running code.
	#[must_use]
	pub const fn valids(&self) -> &Valids {
		&self.valids
	}

	/// Move the program counter to an arbitrary offset. Supports interpreter
	/// invocations that begin mid-code.
	pub fn seek(&mut self, position: usize) {
		self.position = Ok(position);
	}

	/// Explicit exit of the machine. Further step will return error.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack.
	#[must_use]
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	#[must_use]
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.start > U256::from(usize::MAX) {
			let mut ret = Vec::new();
			ret.resize(
				(self.return_range.end - self.return_range.start).as_usize(),
				0,
			);
			ret
		} else if self.return_range.end > U256::from(usize::MAX) {
			let mut ret = self.memory.get(
				self.return_range.start.as_usize(),
				usize::MAX - self.return_range.start.as_usize(),
			);
			while ret.len() < (self.return_range.end - self.return_range.start).as_usize() {
				ret.push(0);
			}
			ret
		} else {
			self.memory.get(
				self.return_range.start.as_usize(),
				(self.return_range.end - self.return_range.start).as_usize(),
			)
		}
	}

	/// Loop stepping the machine, until it stops.
	pub fn run(&mut self) -> Capture<ExitReason, Opcode> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	/// Step the machine, executing one opcode. It then returns.
	#[inline]
	pub fn step(&mut self) -> Result<(), Capture<ExitReason, Opcode>> {
		let position = *self
			.position
			.as_ref()
			.map_err(|reason| Capture::Exit(reason.clone()))?;

		match self.code.get(position).map(|v| Opcode(*v)) {
			Some(opcode) => match eval(self, opcode, position) {
				Control::Continue(p) => {
					self.position = Ok(position + p);
					Ok(())
				}
				Control::Exit(e) => {
					self.position = Err(e.clone());
					Err(Capture::Exit(e))
				}
				Control::Jump(p) => {
					self.position = Ok(p);
					Ok(())
				}
				Control::Trap(opcode) => {
					self.position = Ok(position + 1);
					Err(Capture::Trap(opcode))
				}
			},
			None => {
				self.position = Err(ExitSucceed::Stopped.into());
				Err(Capture::Exit(ExitSucceed::Stopped.into()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use primitive_types::H256;

	fn run_code(code: &[u8]) -> (Machine, Capture<ExitReason, Opcode>) {
		let mut machine = Machine::new(Rc::new(code.to_vec()), Rc::new(Vec::new()), 1024, 0x10000);
		let reason = machine.run();
		(machine, reason)
	}

	#[test]
	fn push_add_stop() {
		// PUSH1 1; PUSH1 2; ADD; STOP
		let (machine, reason) = run_code(&[0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
		assert_eq!(reason, Capture::Exit(ExitSucceed::Stopped.into()));
		assert_eq!(machine.stack().peek(0), Ok(H256::from_low_u64_be(3)));
		assert!(machine.return_value().is_empty());
	}

	#[test]
	fn jump_to_push_immediate_is_invalid() {
		// PUSH1 3; JUMP; STOP; JUMPDEST (offset 3 is the STOP, not a JUMPDEST)
		let (_machine, reason) = run_code(&[0x60, 0x03, 0x56, 0x00, 0x5b]);
		assert_eq!(reason, Capture::Exit(ExitError::InvalidJump.into()));
	}

	#[test]
	fn running_off_the_code_end_stops() {
		let (_machine, reason) = run_code(&[0x60, 0x01]);
		assert_eq!(reason, Capture::Exit(ExitSucceed::Stopped.into()));
	}

	#[test]
	fn external_opcode_traps() {
		// SLOAD with one stack item.
		let (_machine, reason) = run_code(&[0x60, 0x00, 0x54]);
		assert_eq!(reason, Capture::Trap(Opcode::SLOAD));
	}

	#[test]
	fn revert_reports_range() {
		// PUSH1 0; PUSH1 0; REVERT
		let (machine, reason) = run_code(&[0x60, 0x00, 0x60, 0x00, 0xfd]);
		assert_eq!(reason, Capture::Exit(ExitRevert::Reverted.into()));
		assert!(machine.return_value().is_empty());
	}
}
