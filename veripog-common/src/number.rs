//! Exact rational arithmetic for ring evaluation
//!
//! Values have the shape `±digits · 2^pow2 · 5^pow5` with `digits` coprime
//! to 10 (except for zero). This covers every weight that can be written as
//! a finite decimal, and every intermediate ring value, without rounding.
//! Reciprocals exist only when the magnitude is a pure power of 2 and 5; an
//! invalid marker propagates through all operations so the caller can check
//! once at the end.

use num_bigint::BigUint;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Counts additions and multiplications, for the end-of-run statistics.
static OPERATION_COUNT: AtomicU64 = AtomicU64::new(0);

/// Number of ring operations performed since process start.
pub fn operation_count() -> u64 {
    OPERATION_COUNT.load(Ordering::Relaxed)
}

fn count_operation() {
    OPERATION_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Number {
    valid: bool,
    negative: bool,
    digits: BigUint,
    pow2: i32,
    pow5: i32,
}

fn pow5(exponent: u32) -> BigUint {
    let mut result = BigUint::from(1_u32);
    for _ in 0..exponent {
        result *= 5_u32;
    }
    result
}

/// Multiply by the given nonnegative powers of 2 and 5.
fn scale_up(digits: &BigUint, twos: i32, fives: i32) -> BigUint {
    requires!(twos >= 0 && fives >= 0);
    (digits.clone() << twos as usize) * pow5(fives as u32)
}

fn is_biguint_zero(value: &BigUint) -> bool {
    value.bits() == 0
}

impl Number {
    /// The poison value returned by impossible operations.
    pub fn invalid() -> Number {
        Number {
            valid: false,
            negative: false,
            digits: BigUint::from(0_u32),
            pow2: 0,
            pow5: 0,
        }
    }
    pub fn zero() -> Number {
        Number {
            valid: true,
            negative: false,
            digits: BigUint::from(0_u32),
            pow2: 0,
            pow5: 0,
        }
    }
    pub fn from_u32(value: u32) -> Number {
        Number::canonical(false, BigUint::from(value), 0, 0)
    }
    /// Normal form: no factors of 2 or 5 in the digits, zero has zero
    /// exponents and positive sign.
    fn canonical(negative: bool, mut digits: BigUint, mut pow2: i32, mut pow5: i32) -> Number {
        if is_biguint_zero(&digits) {
            return Number::zero();
        }
        if let Some(twos) = digits.trailing_zeros() {
            if twos > 0 {
                digits >>= twos as usize;
                pow2 += twos as i32;
            }
        }
        let five = BigUint::from(5_u32);
        loop {
            if is_biguint_zero(&(&digits % &five)) {
                digits /= 5_u32;
                pow5 += 1;
            } else {
                break;
            }
        }
        Number {
            valid: true,
            negative,
            digits,
            pow2,
            pow5,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
    pub fn is_zero(&self) -> bool {
        self.valid && is_biguint_zero(&self.digits)
    }
    pub fn is_one(&self) -> bool {
        self.valid
            && !self.negative
            && self.digits == BigUint::from(1_u32)
            && self.pow2 == 0
            && self.pow5 == 0
    }
    pub fn is_negative(&self) -> bool {
        self.valid && self.negative
    }

    pub fn neg(&self) -> Number {
        if !self.valid || self.is_zero() {
            return self.clone();
        }
        let mut result = self.clone();
        result.negative = !result.negative;
        result
    }
    pub fn add(&self, other: &Number) -> Number {
        if !self.valid || !other.valid {
            return Number::invalid();
        }
        count_operation();
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let pow2 = self.pow2.min(other.pow2);
        let pow5 = self.pow5.min(other.pow5);
        let left = scale_up(&self.digits, self.pow2 - pow2, self.pow5 - pow5);
        let right = scale_up(&other.digits, other.pow2 - pow2, other.pow5 - pow5);
        if self.negative == other.negative {
            Number::canonical(self.negative, left + right, pow2, pow5)
        } else if left >= right {
            Number::canonical(self.negative, left - right, pow2, pow5)
        } else {
            Number::canonical(other.negative, right - left, pow2, pow5)
        }
    }
    pub fn mul(&self, other: &Number) -> Number {
        if !self.valid || !other.valid {
            return Number::invalid();
        }
        count_operation();
        Number::canonical(
            self.negative != other.negative,
            &self.digits * &other.digits,
            self.pow2 + other.pow2,
            self.pow5 + other.pow5,
        )
    }
    /// Compute `1 - self`.
    pub fn one_minus(&self) -> Number {
        Number::from_u32(1).add(&self.neg())
    }
    /// The reciprocal; only defined when the magnitude is a product of
    /// powers of 2 and 5 (digits equal to one).
    pub fn recip(&self) -> Number {
        if !self.valid || self.is_zero() || self.digits != BigUint::from(1_u32) {
            return Number::invalid();
        }
        Number {
            valid: true,
            negative: self.negative,
            digits: BigUint::from(1_u32),
            pow2: -self.pow2,
            pow5: -self.pow5,
        }
    }
    /// Multiply by `2^exponent`.
    pub fn scale2(&self, exponent: i32) -> Number {
        if !self.valid || self.is_zero() {
            return self.clone();
        }
        let mut result = self.clone();
        result.pow2 += exponent;
        result
    }

    /// Parse a decimal literal: optional sign, digits with an optional
    /// decimal point, optional exponent (`0.25`, `.5`, `-3`, `12e-2`).
    /// Returns an invalid number on malformed input.
    pub fn parse(token: &str) -> Number {
        let bytes = token.as_bytes();
        let mut position = 0;
        let mut negative = false;
        if position < bytes.len() && (bytes[position] == b'-' || bytes[position] == b'+') {
            negative = bytes[position] == b'-';
            position += 1;
        }
        let mut mantissa = Vec::new();
        let mut fraction_length = 0_i32;
        let mut seen_point = false;
        while position < bytes.len() {
            let c = bytes[position];
            if c.is_ascii_digit() {
                mantissa.push(c);
                if seen_point {
                    fraction_length += 1;
                }
                position += 1;
            } else if c == b'.' && !seen_point {
                seen_point = true;
                position += 1;
            } else {
                break;
            }
        }
        if mantissa.is_empty() {
            return Number::invalid();
        }
        let mut exponent = 0_i32;
        if position < bytes.len() && (bytes[position] == b'e' || bytes[position] == b'E') {
            position += 1;
            let mut exponent_negative = false;
            if position < bytes.len() && (bytes[position] == b'-' || bytes[position] == b'+') {
                exponent_negative = bytes[position] == b'-';
                position += 1;
            }
            let mut digits_seen = false;
            let mut value = 0_i64;
            while position < bytes.len() && bytes[position].is_ascii_digit() {
                value = value * 10 + i64::from(bytes[position] - b'0');
                if value > i64::from(i32::max_value()) {
                    return Number::invalid();
                }
                digits_seen = true;
                position += 1;
            }
            if !digits_seen {
                return Number::invalid();
            }
            exponent = if exponent_negative {
                -(value as i32)
            } else {
                value as i32
            };
        }
        if position != bytes.len() {
            return Number::invalid();
        }
        let digits = match BigUint::parse_bytes(&mantissa, 10) {
            Some(digits) => digits,
            None => return Number::invalid(),
        };
        let power_of_ten = exponent - fraction_length;
        Number::canonical(negative, digits, power_of_ten, power_of_ten)
    }
}

impl fmt::Display for Number {
    /// Write the exact decimal representation.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.valid {
            return write!(f, "INVALID");
        }
        if self.is_zero() {
            return write!(f, "0");
        }
        let power_of_ten = self.pow2.min(self.pow5);
        let mantissa = scale_up(
            &self.digits,
            self.pow2 - power_of_ten,
            self.pow5 - power_of_ten,
        );
        let digits = mantissa.to_string();
        let sign = if self.negative { "-" } else { "" };
        if power_of_ten >= 0 {
            write!(f, "{}{}", sign, digits)?;
            for _ in 0..power_of_ten {
                write!(f, "0")?;
            }
            Ok(())
        } else {
            let shift = (-power_of_ten) as usize;
            if digits.len() > shift {
                let point = digits.len() - shift;
                write!(f, "{}{}.{}", sign, &digits[..point], &digits[point..])
            } else {
                write!(f, "{}0.", sign)?;
                for _ in 0..shift - digits.len() {
                    write!(f, "0")?;
                }
                write!(f, "{}", digits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Number {
        let number = Number::parse(text);
        assert!(number.is_valid(), "failed to parse {}", text);
        number
    }

    #[test]
    fn parse_and_write() {
        assert_eq!(format!("{}", parsed("0.25")), "0.25");
        assert_eq!(format!("{}", parsed(".5")), "0.5");
        assert_eq!(format!("{}", parsed("-3")), "-3");
        assert_eq!(format!("{}", parsed("12e-2")), "0.12");
        assert_eq!(format!("{}", parsed("250e1")), "2500");
        assert_eq!(format!("{}", parsed("0.0625")), "0.0625");
        assert!(!Number::parse("x").is_valid());
        assert!(!Number::parse("1.2.3").is_valid());
        assert!(!Number::parse("1e").is_valid());
        assert!(!Number::parse("").is_valid());
    }

    #[test]
    fn ring_operations() {
        let quarter = parsed("0.25");
        let three_quarters = parsed("0.75");
        assert!(quarter.add(&three_quarters).is_one());
        assert_eq!(quarter.one_minus(), three_quarters);
        assert_eq!(format!("{}", quarter.mul(&three_quarters)), "0.1875");
        assert!(quarter.mul(&Number::from_u32(4)).is_one());
        assert!(Number::from_u32(1).add(&Number::from_u32(1).neg()).is_zero());
    }

    #[test]
    fn reciprocal_of_two_is_half() {
        let half = Number::from_u32(2).recip();
        assert_eq!(format!("{}", half), "0.5");
        assert!(half.add(&half).is_one());
        // 3 has no finite decimal reciprocal.
        assert!(!Number::from_u32(3).recip().is_valid());
        assert!(!Number::zero().recip().is_valid());
        // 10 = 2 * 5 does.
        assert_eq!(format!("{}", Number::from_u32(10).recip()), "0.1");
    }

    #[test]
    fn scaling_by_powers_of_two() {
        let half = Number::from_u32(1).scale2(-1);
        assert_eq!(format!("{}", half), "0.5");
        assert_eq!(format!("{}", half.scale2(3)), "4");
        assert!(Number::zero().scale2(5).is_zero());
    }

    #[test]
    fn invalid_propagates() {
        let poison = Number::invalid();
        assert!(!poison.add(&Number::from_u32(1)).is_valid());
        assert!(!Number::from_u32(1).mul(&poison).is_valid());
        assert!(!poison.one_minus().is_valid());
        assert!(!poison.recip().is_valid());
    }
}
