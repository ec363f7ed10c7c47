use super::Control;
use crate::{
	CallScheme, Context, CreateScheme, ExitError, ExitSucceed, Handler, Runtime, Transfer,
};
use alloc::vec::Vec;
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

pub fn sha3(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, from, len);

	let len = as_usize_or_fail!(len);
	let data = if len == 0 {
		Vec::new()
	} else {
		let from = as_usize_or_fail!(from);
		try_or_fail!(runtime.machine.memory_mut().resize_offset(from, len));
		runtime.machine.memory().get(from, len)
	};

	let ret = Keccak256::digest(data.as_slice());
	push_h256!(runtime, H256::from_slice(ret.as_slice()));

	Control::Continue
}

pub fn chainid<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.chain_id());

	Control::Continue
}

pub fn address(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.address);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn balance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.balance(address.into()));

	Control::Continue
}

pub fn selfbalance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.balance(runtime.context.address));

	Control::Continue
}

pub fn origin<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	let ret = H256::from(handler.origin());
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn caller(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.caller);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn callvalue(runtime: &mut Runtime) -> Control {
	push_u256!(runtime, runtime.context.apparent_value);

	Control::Continue
}

pub fn gasprice<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_price());

	Control::Continue
}

pub fn extcodesize<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.code_size(address.into()));

	Control::Continue
}

pub fn extcodehash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_h256!(runtime, handler.code_hash(address.into()));

	Control::Continue
}

pub fn extcodecopy<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	pop_u256!(runtime, memory_offset, code_offset, len);

	let len = as_usize_or_fail!(len);
	if len == 0 {
		return Control::Continue;
	}
	let memory_offset = as_usize_or_fail!(memory_offset);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	match runtime.machine.memory_mut().copy_large(
		memory_offset,
		code_offset,
		len,
		&handler.code(address.into()),
	) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	};

	Control::Continue
}

pub fn returndatasize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.return_data_buffer.len());
	push_u256!(runtime, size);

	Control::Continue
}

pub fn returndatacopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	let len = as_usize_or_fail!(len);
	let memory_offset = if len == 0 {
		0
	} else {
		as_usize_or_fail!(memory_offset)
	};

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	if data_offset
		.checked_add(len.into())
		.map_or(true, |l| l > U256::from(runtime.return_data_buffer.len()))
	{
		return Control::Exit(ExitError::InvalidRange.into());
	}

	let buffer = runtime.return_data_buffer.clone();
	match runtime
		.machine
		.memory_mut()
		.copy_large(memory_offset, data_offset, len, &buffer)
	{
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn blockhash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_u256!(runtime, number);
	push_h256!(runtime, handler.block_hash(number));

	Control::Continue
}

pub fn coinbase<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_h256!(runtime, H256::from(handler.block_coinbase()));
	Control::Continue
}

pub fn timestamp<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_timestamp());
	Control::Continue
}

pub fn number<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_number());
	Control::Continue
}

pub fn difficulty<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_difficulty());
	Control::Continue
}

pub fn gaslimit<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_gas_limit());
	Control::Continue
}

pub fn sload<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, index);
	let value = handler.storage(runtime.context.address, index);
	push_h256!(runtime, value);

	Control::Continue
}

pub fn sstore<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, index, value);

	match handler.set_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn gas<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_left());

	Control::Continue
}

pub fn log<H: Handler>(runtime: &mut Runtime, n: u8, handler: &mut H) -> Control {
	pop_u256!(runtime, offset, len);

	let len = as_usize_or_fail!(len);
	let data = if len == 0 {
		Vec::new()
	} else {
		let offset = as_usize_or_fail!(offset);
		try_or_fail!(runtime.machine.memory_mut().resize_offset(offset, len));
		runtime.machine.memory().get(offset, len)
	};

	let mut topics = Vec::new();
	for _ in 0..(n as usize) {
		match runtime.machine.stack_mut().pop() {
			Ok(value) => {
				topics.push(value);
			}
			Err(e) => return Control::Exit(e.into()),
		}
	}

	match handler.log(runtime.context.address, topics, data) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn suicide<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, target);

	match handler.mark_delete(runtime.context.address, target.into()) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Exit(ExitSucceed::Suicided.into())
}

pub fn create<H: Handler>(runtime: &mut Runtime, is_create2: bool, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, value, code_offset, len);

	let len = as_usize_or_fail!(len);
	let code = if len == 0 {
		Vec::new()
	} else {
		let code_offset = as_usize_or_fail!(code_offset);
		try_or_fail!(runtime.machine.memory_mut().resize_offset(code_offset, len));
		runtime.machine.memory().get(code_offset, len)
	};

	let scheme = if is_create2 {
		pop_h256!(runtime, salt);
		let code_hash = H256::from_slice(Keccak256::digest(&code).as_slice());
		CreateScheme::Create2 {
			caller: runtime.context.address,
			salt,
			code_hash,
		}
	} else {
		CreateScheme::Legacy {
			caller: runtime.context.address,
		}
	};

	let (reason, address, return_data) =
		handler.create(runtime.context.address, scheme, value, code, None);
	super::finish_create(runtime, reason, address, return_data)
}

pub fn call<H: Handler>(runtime: &mut Runtime, scheme: CallScheme, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, gas);
	pop_h256!(runtime, to);
	let gas = if gas > U256::from(u64::MAX) {
		None
	} else {
		Some(gas.as_u64())
	};

	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => {
			pop_u256!(runtime, value);
			value
		}
		CallScheme::DelegateCall | CallScheme::StaticCall => U256::zero(),
	};

	pop_u256!(runtime, in_offset, in_len);
	pop_u256!(runtime, out_offset, out_len);

	let in_len = as_usize_or_fail!(in_len);
	let input = if in_len == 0 {
		Vec::new()
	} else {
		let in_offset = as_usize_or_fail!(in_offset);
		try_or_fail!(runtime
			.machine
			.memory_mut()
			.resize_offset(in_offset, in_len));
		runtime.machine.memory().get(in_offset, in_len)
	};

	let out_len = as_usize_or_fail!(out_len);
	let out_offset = if out_len == 0 {
		0
	} else {
		let out_offset = as_usize_or_fail!(out_offset);
		try_or_fail!(runtime
			.machine
			.memory_mut()
			.resize_offset(out_offset, out_len));
		out_offset
	};

	let context = match scheme {
		CallScheme::Call | CallScheme::StaticCall => Context {
			address: to.into(),
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::CallCode => Context {
			address: runtime.context.address,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::DelegateCall => Context {
			address: runtime.context.address,
			caller: runtime.context.caller,
			apparent_value: runtime.context.apparent_value,
		},
	};

	let transfer = if scheme == CallScheme::Call {
		Some(Transfer {
			source: runtime.context.address,
			target: to.into(),
			value,
		})
	} else if scheme == CallScheme::CallCode {
		Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		})
	} else {
		None
	};

	let (reason, return_data) = handler.call(
		to.into(),
		transfer,
		input,
		gas,
		scheme == CallScheme::StaticCall,
		context,
	);
	super::finish_call(runtime, out_len, out_offset, reason, return_data)
}
