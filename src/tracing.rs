//! Typed observer for engine events. A listener is handed to the executor
//! explicitly; events are advisory and never influence execution.

use crate::executor::{ExecutedMessage, Message};
use crate::{Memory, Opcode, Stack};
use primitive_types::H160;

/// Listener for engine events.
pub trait EventListener {
	/// Observe one event.
	fn event(&mut self, event: Event<'_>);
}

/// An engine event.
#[derive(Debug)]
pub enum Event<'a> {
	/// A message is about to be executed, before any OVM entry rewrite.
	BeforeMessage {
		/// The message as submitted.
		message: &'a Message,
	},
	/// A message finished executing.
	AfterMessage {
		/// The finished result.
		result: &'a ExecutedMessage,
	},
	/// A contract creation reserved its address, before running init code.
	NewContract {
		/// The address of the new contract.
		address: H160,
		/// The init code about to run.
		code: &'a [u8],
	},
	/// The interpreter is about to execute one opcode.
	Step {
		/// Executing address.
		address: H160,
		/// Call depth.
		depth: usize,
		/// The opcode.
		opcode: Opcode,
		/// Program counter.
		position: usize,
		/// Remaining gas before the opcode's fee is charged.
		gas_left: u64,
		/// Current stack.
		stack: &'a Stack,
		/// Current memory.
		memory: &'a Memory,
	},
}

impl<T: EventListener + ?Sized> EventListener for &mut T {
	fn event(&mut self, event: Event<'_>) {
		(**self).event(event);
	}
}

/// A listener that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl EventListener for NoopListener {
	fn event(&mut self, _event: Event<'_>) {}
}
