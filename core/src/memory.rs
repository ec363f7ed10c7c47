use crate::{ExitError, ExitFatal};
use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::U256;

/// A sequential memory. It uses Rust's `Vec` for internal representation.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given limit.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Memory limit.
	#[inline]
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// Get the length of the current effective memory range.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Return true if current effective memory range is zero.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Resize the memory, making it cover the memory region of `offset..offset + len`,
	/// aligned to the next 32-byte word.
	pub fn resize_offset(&mut self, offset: usize, len: usize) -> Result<(), ExitError> {
		if len == 0 {
			return Ok(());
		}

		let end = offset.checked_add(len).ok_or(ExitError::InvalidRange)?;
		self.resize_end(end)
	}

	/// Resize the memory, making it cover to `end`, aligned to the next
	/// 32-byte word.
	pub fn resize_end(&mut self, mut end: usize) -> Result<(), ExitError> {
		if end <= self.data.len() {
			return Ok(());
		}

		while end % 32 != 0 {
			end = end.checked_add(1).ok_or(ExitError::InvalidRange)?;
		}

		if end > self.limit {
			return Err(ExitError::OutOfGas);
		}

		self.data.resize(end, 0);
		Ok(())
	}

	/// Get memory region at given offset. Zero-filled past the effective
	/// range.
	#[must_use]
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = Vec::new();
		ret.resize(size, 0);

		#[allow(clippy::needless_range_loop)]
		for index in 0..size {
			let position = offset + index;
			if position >= self.data.len() {
				break;
			}

			ret[index] = self.data[position];
		}

		ret
	}

	/// Set memory region at given offset. The offset and value are considered
	/// untrusted.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		if offset
			.checked_add(target_size)
			.map_or(true, |pos| pos > self.limit)
		{
			return Err(ExitFatal::NotSupported);
		}

		if self.data.len() < offset + target_size {
			self.data.resize(offset + target_size, 0);
		}

		if target_size > value.len() {
			self.data[offset..((value.len()) + offset)].clone_from_slice(value);
			for index in (value.len())..target_size {
				self.data[offset + index] = 0;
			}
		} else {
			self.data[offset..(target_size + offset)].clone_from_slice(&value[..target_size]);
		}

		Ok(())
	}

	/// Copy `data` into the memory, of given `len`. Any part of the source
	/// beyond its length reads as zero.
	pub fn copy_large(
		&mut self,
		memory_offset: usize,
		data_offset: U256,
		len: usize,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		if len == 0 {
			return Ok(());
		}

		let data = if let Some(end) = data_offset.checked_add(len.into()) {
			if data_offset > U256::from(usize::MAX) {
				&[]
			} else {
				let data_offset = data_offset.as_usize();
				if data_offset > data.len() {
					&[]
				} else {
					let end = min(end, U256::from(data.len())).as_usize();
					&data[data_offset..end]
				}
			}
		} else {
			&[]
		};

		self.set(memory_offset, data, Some(len))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resize_aligns_to_words() {
		let mut memory = Memory::new(1024);
		memory.resize_offset(0, 1).unwrap();
		assert_eq!(memory.len(), 32);
		memory.resize_offset(30, 3).unwrap();
		assert_eq!(memory.len(), 64);
	}

	#[test]
	fn resize_over_limit_fails() {
		let mut memory = Memory::new(64);
		assert_eq!(memory.resize_offset(64, 1), Err(ExitError::OutOfGas));
	}

	#[test]
	fn get_zero_fills_past_end() {
		let mut memory = Memory::new(1024);
		memory.set(0, &[1, 2, 3], None).unwrap();
		assert_eq!(memory.get(1, 4), vec![2, 3, 0, 0]);
	}

	#[test]
	fn copy_large_reads_past_source_as_zero() {
		let mut memory = Memory::new(1024);
		memory
			.copy_large(0, U256::zero(), 4, &[0xaa, 0xbb])
			.unwrap();
		assert_eq!(memory.get(0, 4), vec![0xaa, 0xbb, 0, 0]);
	}
}
