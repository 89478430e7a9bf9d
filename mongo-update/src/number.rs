use std::convert::TryFrom;

use bson::{Bson, Decimal128};

use crate::error::Error;

/// A numeric operand, as accepted by MongoDB's `$inc` operator.
///
/// Conversions from rust's primitive numbers are infallible (bar `u64` and `usize`, which may not
/// fit in an `i64`), while conversion from a dynamic [`Bson`](bson::Bson) value is checked.
///
/// # Examples
///
/// ```
/// use std::convert::TryFrom;
///
/// use mongo_update::Number;
///
/// assert_eq!(Number::from(1u8), Number::Int32(1));
/// assert_eq!(Number::from(0.5f64), Number::Double(0.5));
/// assert!(Number::try_from(mongo_update::bson::Bson::String("1".to_owned())).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    /// A 32-bit integer.
    Int32(i32),
    /// A 64-bit integer.
    Int64(i64),
    /// A 64-bit floating point number.
    Double(f64),
    /// A 128-bit decimal.
    Decimal128(Decimal128),
}

/// An integer operand, as accepted by MongoDB's `$bit` operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Integer {
    /// A 32-bit integer.
    Int32(i32),
    /// A 64-bit integer.
    Int64(i64),
}

macro_rules! integer_from {
    ($variant:ident, $($source:ty),+) => {
        $(
            impl From<$source> for Integer {
                fn from(value: $source) -> Self {
                    Integer::$variant(value.into())
                }
            }

            impl From<$source> for Number {
                fn from(value: $source) -> Self {
                    Integer::from(value).into()
                }
            }
        )+
    };
}
integer_from!(Int32, i8, i16, i32, u8, u16);
integer_from!(Int64, i64);

impl From<u32> for Integer {
    fn from(value: u32) -> Self {
        match i32::try_from(value) {
            Ok(i) => Integer::Int32(i),
            Err(_) => Integer::Int64(value.into()),
        }
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Integer::from(value).into()
    }
}

impl From<isize> for Integer {
    fn from(value: isize) -> Self {
        // NOTE: isize is at most 64 bits on every target mongodb supports.
        Integer::Int64(value as i64)
    }
}

impl TryFrom<u64> for Integer {
    type Error = Error;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Integer::Int64).map_err(|_| {
            Error::invalid_operand(format!(
                "invalid value, could not coerce `{}` into an i64",
                value
            ))
        })
    }
}

impl TryFrom<usize> for Integer {
    type Error = Error;
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Integer::try_from(value as u64)
    }
}

impl TryFrom<u64> for Number {
    type Error = Error;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(Integer::try_from(value)?.into())
    }
}

impl TryFrom<usize> for Number {
    type Error = Error;
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok(Integer::try_from(value)?.into())
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Double(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl From<Decimal128> for Number {
    fn from(value: Decimal128) -> Self {
        Number::Decimal128(value)
    }
}

impl From<Integer> for Number {
    fn from(value: Integer) -> Self {
        match value {
            Integer::Int32(i) => Number::Int32(i),
            Integer::Int64(i) => Number::Int64(i),
        }
    }
}

impl TryFrom<Bson> for Number {
    type Error = Error;
    fn try_from(bson: Bson) -> Result<Self, Self::Error> {
        match bson {
            Bson::Int32(i) => Ok(Number::Int32(i)),
            Bson::Int64(i) => Ok(Number::Int64(i)),
            Bson::Double(f) => Ok(Number::Double(f)),
            Bson::Decimal128(d) => Ok(Number::Decimal128(d)),
            _ => Err(Error::invalid_operand(format!(
                "invalid variant, expected a numeric value but found `{}`",
                bson
            ))),
        }
    }
}

impl TryFrom<Bson> for Integer {
    type Error = Error;
    fn try_from(bson: Bson) -> Result<Self, Self::Error> {
        match bson {
            Bson::Int32(i) => Ok(Integer::Int32(i)),
            Bson::Int64(i) => Ok(Integer::Int64(i)),
            _ => Err(Error::invalid_operand(format!(
                "invalid variant, expected an integer value but found `{}`",
                bson
            ))),
        }
    }
}

impl From<Number> for Bson {
    fn from(number: Number) -> Self {
        match number {
            Number::Int32(i) => Bson::Int32(i),
            Number::Int64(i) => Bson::Int64(i),
            Number::Double(f) => Bson::Double(f),
            Number::Decimal128(d) => Bson::Decimal128(d),
        }
    }
}

impl From<Integer> for Bson {
    fn from(integer: Integer) -> Self {
        Number::from(integer).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Kind;

    #[test]
    fn small_integers_are_int32() {
        assert_eq!(Number::from(-1i8), Number::Int32(-1));
        assert_eq!(Number::from(300u16), Number::Int32(300));
        assert_eq!(Integer::from(7u8), Integer::Int32(7));
    }

    #[test]
    fn large_unsigned_widen() {
        assert_eq!(Integer::from(u32::MAX), Integer::Int64(u32::MAX as i64));
        assert_eq!(Number::try_from(5u64).unwrap(), Number::Int64(5));
    }

    #[test]
    fn u64_overflow_is_invalid_operand() {
        let e = Number::try_from(u64::MAX).unwrap_err();
        assert_eq!(*e.kind(), Kind::InvalidOperand);
    }

    #[test]
    fn floats_are_doubles() {
        assert_eq!(Number::from(1.5f32), Number::Double(1.5));
    }

    #[test]
    fn bson_numbers() {
        assert_eq!(Number::try_from(Bson::Int64(9)).unwrap(), Number::Int64(9));
        assert_eq!(Number::try_from(Bson::Double(0.25)).unwrap(), Number::Double(0.25));
        let e = Number::try_from(Bson::String("9".to_owned())).unwrap_err();
        assert_eq!(*e.kind(), Kind::InvalidOperand);
    }

    #[test]
    fn bson_integers() {
        assert_eq!(Integer::try_from(Bson::Int32(3)).unwrap(), Integer::Int32(3));
        assert!(Integer::try_from(Bson::Double(3.0)).is_err());
    }

    #[test]
    fn into_bson() {
        assert_eq!(Bson::from(Number::Double(2.0)), Bson::Double(2.0));
        assert_eq!(Bson::from(Integer::Int64(2)), Bson::Int64(2));
    }
}
