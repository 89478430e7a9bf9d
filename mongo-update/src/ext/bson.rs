//! Extensions for the `bson` crate so that update operands can be taken from plain rust values.

use serde::ser::Error as SerError;
use std::collections::HashMap;
use std::convert::{TryFrom, TryInto};

// NOTE: Conversions here are lossless, anything that would have to be truncated to fit in a BSON
// type is refused instead so that bad operands surface at the call that supplied them.

pub mod ser {
    //! Extends `bson`'s serialisation error with `Infallible` so that is can be used in rust
    //! conversions.
    use std::convert::Infallible;
    use std::error::Error as StdError;
    use std::fmt;

    /// An error that extends `bson`'s serialisation error.
    pub struct Error(pub bson::ser::Error);

    impl fmt::Debug for Error {
        fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt(fmt)
        }
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt(f)
        }
    }

    impl StdError for Error {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.0.source()
        }
    }

    impl From<bson::ser::Error> for Error {
        fn from(err: bson::ser::Error) -> Self {
            Error(err)
        }
    }

    impl From<Infallible> for Error {
        fn from(never: Infallible) -> Self {
            match never {}
        }
    }
}

/// Wraps `bson::Bson` so that additional rust conversions can be applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Bson(pub bson::Bson);

/// Wraps a type that implements `serde::ser::Serialize` so it can be used as an operand.
///
/// # Examples
///
/// ```
/// use mongo_update::ext::bson::Ser;
/// use mongo_update::UpdateRequest;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Address {
///     city: String,
/// }
///
/// let mut request = UpdateRequest::new(true);
/// request
///     .set("address", Ser(Address { city: "Helsinki".to_owned() }))
///     .unwrap();
/// ```
// FIXME: https://github.com/rust-lang/rust/issues/31844
pub struct Ser<T: serde::ser::Serialize>(pub T);

// NOTE: Due to https://github.com/rust-lang/rust/issues/29635 we cant be generic and implement the
// missing, so we have to wrap them all...
macro_rules! wrap_bson_from {
    ($source:ty) => {
        impl From<$source> for Bson {
            fn from(a: $source) -> Self {
                Bson(a.into())
            }
        }
    };
}
wrap_bson_from!(bson::Binary);
wrap_bson_from!(bson::Bson);
wrap_bson_from!(bson::DateTime);
wrap_bson_from!(bson::Decimal128);
wrap_bson_from!(bson::Document);
wrap_bson_from!(bson::oid::ObjectId);
wrap_bson_from!(bson::Regex);
wrap_bson_from!(bson::Timestamp);
wrap_bson_from!(&str);
wrap_bson_from!(bool);
wrap_bson_from!(f32);
wrap_bson_from!(f64);
wrap_bson_from!(i32);
wrap_bson_from!(i64);
wrap_bson_from!(String);
#[cfg(feature = "chrono")]
wrap_bson_from!(chrono::DateTime<chrono::Utc>);

impl From<char> for Bson {
    fn from(c: char) -> Self {
        Bson(bson::Bson::String(c.into()))
    }
}

impl From<i8> for Bson {
    fn from(value: i8) -> Self {
        Bson(bson::Bson::Int32(value.into()))
    }
}

impl From<i16> for Bson {
    fn from(value: i16) -> Self {
        Bson(bson::Bson::Int32(value.into()))
    }
}

impl From<u8> for Bson {
    fn from(value: u8) -> Self {
        Bson(bson::Bson::Int32(value.into()))
    }
}

impl From<u16> for Bson {
    fn from(value: u16) -> Self {
        Bson(bson::Bson::Int32(value.into()))
    }
}

impl From<u32> for Bson {
    fn from(value: u32) -> Self {
        match i32::try_from(value) {
            Ok(i) => Bson(bson::Bson::Int32(i)),
            Err(_) => Bson(bson::Bson::Int64(value.into())),
        }
    }
}

impl TryFrom<u64> for Bson {
    type Error = ser::Error;
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let i = i64::try_from(value).map_err(|_| {
            bson::ser::Error::custom(format!(
                "invalid value, could not coerce `{}` into an i64",
                value
            ))
        })?;
        Ok(Bson(bson::Bson::Int64(i)))
    }
}

impl<T> TryFrom<Ser<T>> for Bson
where
    T: serde::ser::Serialize,
{
    type Error = ser::Error;
    fn try_from(value: Ser<T>) -> Result<Self, Self::Error> {
        Ok(Bson(bson::to_bson(&value.0)?))
    }
}

impl<K, V> TryFrom<HashMap<K, V>> for Bson
where
    K: Into<String>,
    V: TryInto<Bson>,
    V::Error: Into<ser::Error>,
{
    type Error = ser::Error;
    fn try_from(m: HashMap<K, V>) -> Result<Self, Self::Error> {
        let mut doc = bson::Document::new();
        for (k, v) in m {
            doc.insert(k.into(), v.try_into().map_err(|e| e.into())?.0);
        }
        Ok(Bson(bson::Bson::Document(doc)))
    }
}

impl<T> TryFrom<Option<T>> for Bson
where
    T: TryInto<Bson>,
    T::Error: Into<ser::Error>,
{
    type Error = ser::Error;
    fn try_from(value: Option<T>) -> Result<Self, Self::Error> {
        Ok(match value {
            Some(v) => v.try_into().map_err(|e| e.into())?,
            None => Bson(bson::Bson::Null),
        })
    }
}

impl<T> From<Vec<T>> for Bson
where
    T: Into<Bson>,
{
    fn from(v: Vec<T>) -> Self {
        Bson(bson::Bson::Array(
            v.into_iter().map(|x| x.into().0).collect(),
        ))
    }
}

/// Converts `value` into BSON, reporting an unrepresentable value as an invalid operand.
pub(crate) fn operand<V>(value: V) -> crate::Result<bson::Bson>
where
    V: TryInto<Bson>,
    V::Error: Into<ser::Error>,
{
    match value.try_into() {
        Ok(Bson(b)) => Ok(b),
        Err(e) => {
            let e: ser::Error = e.into();
            Err(e.into())
        }
    }
}

/// Converts each value of `values` into a BSON array, failing on the first unrepresentable value.
pub fn try_array<I, V>(values: I) -> Result<Vec<bson::Bson>, ser::Error>
where
    I: IntoIterator<Item = V>,
    V: TryInto<Bson>,
    V::Error: Into<ser::Error>,
{
    values
        .into_iter()
        .map(|v| v.try_into().map(|b: Bson| b.0).map_err(|e| e.into()))
        .collect()
}
