#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;

use crate::{ExitError, ExitReason, Machine, Opcode};
use core::ops::{BitAnd, BitOr, BitXor};
use primitive_types::{H256, U256};

/// Control state after evaluating one opcode.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Control {
	/// Continue, advancing the program counter by the given amount.
	Continue(usize),
	/// Exit with the given reason.
	Exit(ExitReason),
	/// Jump to the given absolute position.
	Jump(usize),
	/// Trap: the opcode needs the execution environment to be resolved.
	Trap(Opcode),
}

type OpEval = fn(state: &mut Machine, opcode: Opcode, position: usize) -> Control;

fn eval_stop(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::stop(state)
}

fn eval_add(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_tuple!(state, overflowing_add)
}

fn eval_mul(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_tuple!(state, overflowing_mul)
}

fn eval_sub(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_tuple!(state, overflowing_sub)
}

fn eval_div(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::div)
}

fn eval_sdiv(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::sdiv)
}

fn eval_mod(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::rem)
}

fn eval_smod(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::srem)
}

fn eval_addmod(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op3_u256_fn!(state, self::arithmetic::addmod)
}

fn eval_mulmod(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op3_u256_fn!(state, self::arithmetic::mulmod)
}

fn eval_exp(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::exp)
}

fn eval_signextend(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::arithmetic::signextend)
}

fn eval_lt(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_bool_ref!(state, lt)
}

fn eval_gt(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_bool_ref!(state, gt)
}

fn eval_slt(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::slt)
}

fn eval_sgt(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::sgt)
}

fn eval_eq(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_bool_ref!(state, eq)
}

fn eval_iszero(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op1_u256_fn!(state, self::bitwise::iszero)
}

fn eval_and(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256!(state, bitand)
}

fn eval_or(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256!(state, bitor)
}

fn eval_xor(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256!(state, bitxor)
}

fn eval_not(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op1_u256_fn!(state, self::bitwise::not)
}

fn eval_byte(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::byte)
}

fn eval_shl(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::shl)
}

fn eval_shr(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::shr)
}

fn eval_sar(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	op2_u256_fn!(state, self::bitwise::sar)
}

fn eval_calldataload(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::calldataload(state)
}

fn eval_calldatasize(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::calldatasize(state)
}

fn eval_calldatacopy(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::calldatacopy(state)
}

fn eval_codesize(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::codesize(state)
}

fn eval_codecopy(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::codecopy(state)
}

fn eval_pop(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::pop(state)
}

fn eval_mload(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::mload(state)
}

fn eval_mstore(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::mstore(state)
}

fn eval_mstore8(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::mstore8(state)
}

fn eval_jump(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::jump(state)
}

fn eval_jumpi(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::jumpi(state)
}

fn eval_pc(state: &mut Machine, _opcode: Opcode, position: usize) -> Control {
	misc::pc(state, position)
}

fn eval_msize(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::msize(state)
}

fn eval_jumpdest(_state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	Control::Continue(1)
}

fn eval_push<const N: usize>(state: &mut Machine, _opcode: Opcode, position: usize) -> Control {
	misc::push(state, N, position)
}

fn eval_dup<const N: usize>(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::dup(state, N)
}

fn eval_swap<const N: usize>(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::swap(state, N)
}

fn eval_return(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::ret(state)
}

fn eval_revert(state: &mut Machine, _opcode: Opcode, _position: usize) -> Control {
	misc::revert(state)
}

fn eval_invalid(_state: &mut Machine, opcode: Opcode, _position: usize) -> Control {
	Control::Exit(ExitError::InvalidOpcode(opcode).into())
}

fn eval_external(_state: &mut Machine, opcode: Opcode, _position: usize) -> Control {
	Control::Trap(opcode)
}

const fn table() -> [OpEval; 256] {
	let mut table = [eval_external as OpEval; 256];

	table[Opcode::STOP.as_usize()] = eval_stop as _;
	table[Opcode::ADD.as_usize()] = eval_add as _;
	table[Opcode::MUL.as_usize()] = eval_mul as _;
	table[Opcode::SUB.as_usize()] = eval_sub as _;
	table[Opcode::DIV.as_usize()] = eval_div as _;
	table[Opcode::SDIV.as_usize()] = eval_sdiv as _;
	table[Opcode::MOD.as_usize()] = eval_mod as _;
	table[Opcode::SMOD.as_usize()] = eval_smod as _;
	table[Opcode::ADDMOD.as_usize()] = eval_addmod as _;
	table[Opcode::MULMOD.as_usize()] = eval_mulmod as _;
	table[Opcode::EXP.as_usize()] = eval_exp as _;
	table[Opcode::SIGNEXTEND.as_usize()] = eval_signextend as _;
	table[Opcode::LT.as_usize()] = eval_lt as _;
	table[Opcode::GT.as_usize()] = eval_gt as _;
	table[Opcode::SLT.as_usize()] = eval_slt as _;
	table[Opcode::SGT.as_usize()] = eval_sgt as _;
	table[Opcode::EQ.as_usize()] = eval_eq as _;
	table[Opcode::ISZERO.as_usize()] = eval_iszero as _;
	table[Opcode::AND.as_usize()] = eval_and as _;
	table[Opcode::OR.as_usize()] = eval_or as _;
	table[Opcode::XOR.as_usize()] = eval_xor as _;
	table[Opcode::NOT.as_usize()] = eval_not as _;
	table[Opcode::BYTE.as_usize()] = eval_byte as _;
	table[Opcode::SHL.as_usize()] = eval_shl as _;
	table[Opcode::SHR.as_usize()] = eval_shr as _;
	table[Opcode::SAR.as_usize()] = eval_sar as _;
	table[Opcode::CALLDATALOAD.as_usize()] = eval_calldataload as _;
	table[Opcode::CALLDATASIZE.as_usize()] = eval_calldatasize as _;
	table[Opcode::CALLDATACOPY.as_usize()] = eval_calldatacopy as _;
	table[Opcode::CODESIZE.as_usize()] = eval_codesize as _;
	table[Opcode::CODECOPY.as_usize()] = eval_codecopy as _;
	table[Opcode::POP.as_usize()] = eval_pop as _;
	table[Opcode::MLOAD.as_usize()] = eval_mload as _;
	table[Opcode::MSTORE.as_usize()] = eval_mstore as _;
	table[Opcode::MSTORE8.as_usize()] = eval_mstore8 as _;
	table[Opcode::JUMP.as_usize()] = eval_jump as _;
	table[Opcode::JUMPI.as_usize()] = eval_jumpi as _;
	table[Opcode::PC.as_usize()] = eval_pc as _;
	table[Opcode::MSIZE.as_usize()] = eval_msize as _;
	table[Opcode::JUMPDEST.as_usize()] = eval_jumpdest as _;

	table[Opcode(0x60).as_usize()] = eval_push::<1> as _;
	table[Opcode(0x61).as_usize()] = eval_push::<2> as _;
	table[Opcode(0x62).as_usize()] = eval_push::<3> as _;
	table[Opcode(0x63).as_usize()] = eval_push::<4> as _;
	table[Opcode(0x64).as_usize()] = eval_push::<5> as _;
	table[Opcode(0x65).as_usize()] = eval_push::<6> as _;
	table[Opcode(0x66).as_usize()] = eval_push::<7> as _;
	table[Opcode(0x67).as_usize()] = eval_push::<8> as _;
	table[Opcode(0x68).as_usize()] = eval_push::<9> as _;
	table[Opcode(0x69).as_usize()] = eval_push::<10> as _;
	table[Opcode(0x6a).as_usize()] = eval_push::<11> as _;
	table[Opcode(0x6b).as_usize()] = eval_push::<12> as _;
	table[Opcode(0x6c).as_usize()] = eval_push::<13> as _;
	table[Opcode(0x6d).as_usize()] = eval_push::<14> as _;
	table[Opcode(0x6e).as_usize()] = eval_push::<15> as _;
	table[Opcode(0x6f).as_usize()] = eval_push::<16> as _;
	table[Opcode(0x70).as_usize()] = eval_push::<17> as _;
	table[Opcode(0x71).as_usize()] = eval_push::<18> as _;
	table[Opcode(0x72).as_usize()] = eval_push::<19> as _;
	table[Opcode(0x73).as_usize()] = eval_push::<20> as _;
	table[Opcode(0x74).as_usize()] = eval_push::<21> as _;
	table[Opcode(0x75).as_usize()] = eval_push::<22> as _;
	table[Opcode(0x76).as_usize()] = eval_push::<23> as _;
	table[Opcode(0x77).as_usize()] = eval_push::<24> as _;
	table[Opcode(0x78).as_usize()] = eval_push::<25> as _;
	table[Opcode(0x79).as_usize()] = eval_push::<26> as _;
	table[Opcode(0x7a).as_usize()] = eval_push::<27> as _;
	table[Opcode(0x7b).as_usize()] = eval_push::<28> as _;
	table[Opcode(0x7c).as_usize()] = eval_push::<29> as _;
	table[Opcode(0x7d).as_usize()] = eval_push::<30> as _;
	table[Opcode(0x7e).as_usize()] = eval_push::<31> as _;
	table[Opcode(0x7f).as_usize()] = eval_push::<32> as _;

	table[Opcode(0x80).as_usize()] = eval_dup::<1> as _;
	table[Opcode(0x81).as_usize()] = eval_dup::<2> as _;
	table[Opcode(0x82).as_usize()] = eval_dup::<3> as _;
	table[Opcode(0x83).as_usize()] = eval_dup::<4> as _;
	table[Opcode(0x84).as_usize()] = eval_dup::<5> as _;
	table[Opcode(0x85).as_usize()] = eval_dup::<6> as _;
	table[Opcode(0x86).as_usize()] = eval_dup::<7> as _;
	table[Opcode(0x87).as_usize()] = eval_dup::<8> as _;
	table[Opcode(0x88).as_usize()] = eval_dup::<9> as _;
	table[Opcode(0x89).as_usize()] = eval_dup::<10> as _;
	table[Opcode(0x8a).as_usize()] = eval_dup::<11> as _;
	table[Opcode(0x8b).as_usize()] = eval_dup::<12> as _;
	table[Opcode(0x8c).as_usize()] = eval_dup::<13> as _;
	table[Opcode(0x8d).as_usize()] = eval_dup::<14> as _;
	table[Opcode(0x8e).as_usize()] = eval_dup::<15> as _;
	table[Opcode(0x8f).as_usize()] = eval_dup::<16> as _;

	table[Opcode(0x90).as_usize()] = eval_swap::<1> as _;
	table[Opcode(0x91).as_usize()] = eval_swap::<2> as _;
	table[Opcode(0x92).as_usize()] = eval_swap::<3> as _;
	table[Opcode(0x93).as_usize()] = eval_swap::<4> as _;
	table[Opcode(0x94).as_usize()] = eval_swap::<5> as _;
	table[Opcode(0x95).as_usize()] = eval_swap::<6> as _;
	table[Opcode(0x96).as_usize()] = eval_swap::<7> as _;
	table[Opcode(0x97).as_usize()] = eval_swap::<8> as _;
	table[Opcode(0x98).as_usize()] = eval_swap::<9> as _;
	table[Opcode(0x99).as_usize()] = eval_swap::<10> as _;
	table[Opcode(0x9a).as_usize()] = eval_swap::<11> as _;
	table[Opcode(0x9b).as_usize()] = eval_swap::<12> as _;
	table[Opcode(0x9c).as_usize()] = eval_swap::<13> as _;
	table[Opcode(0x9d).as_usize()] = eval_swap::<14> as _;
	table[Opcode(0x9e).as_usize()] = eval_swap::<15> as _;
	table[Opcode(0x9f).as_usize()] = eval_swap::<16> as _;

	table[Opcode::RETURN.as_usize()] = eval_return as _;
	table[Opcode::REVERT.as_usize()] = eval_revert as _;
	table[Opcode::INVALID.as_usize()] = eval_invalid as _;

	table
}

static TABLE: [OpEval; 256] = table();

#[inline]
pub fn eval(state: &mut Machine, opcode: Opcode, position: usize) -> Control {
	TABLE[opcode.as_usize()](state, opcode, position)
}
