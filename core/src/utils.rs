use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// Sign of an `I256` value.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Sign {
	Plus,
	Minus,
	Zero,
}

const SIGN_BIT_MASK: U256 = U256([
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0x7fff_ffff_ffff_ffff,
]);

/// Signed 256-bit integer, represented as sign and magnitude over `U256`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct I256(pub Sign, pub U256);

impl I256 {
	/// Zero value of `I256`.
	#[must_use]
	pub fn zero() -> Self {
		I256(Sign::Zero, U256::zero())
	}

	/// Minimum value of `I256`.
	#[must_use]
	pub fn min_value() -> Self {
		I256(Sign::Minus, (U256::MAX & SIGN_BIT_MASK) + U256::one())
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.0, other.0) {
			(Sign::Zero, Sign::Zero) => Ordering::Equal,
			(Sign::Zero, Sign::Plus) => Ordering::Less,
			(Sign::Zero, Sign::Minus) => Ordering::Greater,
			(Sign::Minus, Sign::Zero) => Ordering::Less,
			(Sign::Minus, Sign::Plus) => Ordering::Less,
			(Sign::Minus, Sign::Minus) => self.1.cmp(&other.1).reverse(),
			(Sign::Plus, Sign::Minus) => Ordering::Greater,
			(Sign::Plus, Sign::Zero) => Ordering::Greater,
			(Sign::Plus, Sign::Plus) => self.1.cmp(&other.1),
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl From<U256> for I256 {
	fn from(val: U256) -> Self {
		if val.is_zero() {
			I256::zero()
		} else if val & SIGN_BIT_MASK == val {
			I256(Sign::Plus, val)
		} else {
			I256(Sign::Minus, !val + U256::one())
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> Self {
		let sign = value.0;
		if sign == Sign::Zero {
			U256::zero()
		} else if sign == Sign::Plus {
			value.1
		} else {
			!value.1 + U256::one()
		}
	}
}

impl Div for I256 {
	type Output = I256;

	fn div(self, other: I256) -> I256 {
		if other == I256::zero() {
			return I256::zero();
		}

		if self == I256::min_value() && other.1 == U256::one() && other.0 == Sign::Minus {
			return I256::min_value();
		}

		let d = (self.1 / other.1) & SIGN_BIT_MASK;
		if d.is_zero() {
			return I256::zero();
		}

		match (self.0, other.0) {
			(Sign::Zero, _)
			| (Sign::Plus, Sign::Plus)
			| (Sign::Minus, Sign::Minus) => I256(Sign::Plus, d),
			(Sign::Plus, Sign::Minus)
			| (Sign::Minus, Sign::Plus) => I256(Sign::Minus, d),
			(_, Sign::Zero) => I256::zero(),
		}
	}
}

impl Rem for I256 {
	type Output = I256;

	fn rem(self, other: I256) -> I256 {
		if other.1.is_zero() {
			return I256::zero();
		}

		let r = (self.1 % other.1) & SIGN_BIT_MASK;

		if r.is_zero() {
			return I256::zero();
		}

		I256(self.0, r)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn two_complement_round_trips() {
		let neg_one = U256::MAX;
		let signed = I256::from(neg_one);
		assert_eq!(signed, I256(Sign::Minus, U256::one()));
		assert_eq!(U256::from(signed), neg_one);
	}

	#[test]
	fn division_overflow_case() {
		// MIN / -1 == MIN in two's complement.
		let min = I256::min_value();
		let neg_one = I256::from(U256::MAX);
		assert_eq!(min / neg_one, I256::min_value());
	}

	#[test]
	fn signed_division() {
		let a = I256::from(U256::from(100u64));
		let b = I256::from(U256::MAX - U256::from(2u64)); // -3
		assert_eq!(U256::from(a / b), !U256::from(33u64) + U256::one());
	}
}
