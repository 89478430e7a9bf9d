use std::convert::{TryFrom, TryInto};

use bson::{Bson, Document};

use crate::error::Error;
use crate::ext;

/// The BSON comparators for comparison of different BSON type values
pub enum Comparator<T>
where
    T: TryInto<ext::bson::Bson>,
    T::Error: Into<ext::bson::ser::Error>,
{
    /// Matches values that are equal to a specified value.
    Eq(T),
    /// Matches documents that have (or do not have) the specified field.
    Exists(bool),
    /// Matches values that are greater than a specified value.
    Gt(T),
    /// Matches values that are greater than or equal to a specified value.
    Gte(T),
    /// Matches any of the values specified in an array.
    In(Vec<T>),
    /// Matches values that are less than a specified value.
    Lt(T),
    /// Matches values that are less than or equal to a specified value.
    Lte(T),
    /// Matches all values that are not equal to a specified value.
    Ne(T),
    /// Matches none of the values specified in an array.
    Nin(Vec<T>),
}

impl<T> TryFrom<Comparator<T>> for Bson
where
    T: TryInto<ext::bson::Bson>,
    T::Error: Into<ext::bson::ser::Error>,
{
    type Error = ext::bson::ser::Error;
    fn try_from(value: Comparator<T>) -> Result<Self, Self::Error> {
        let one = |t: T| -> Result<Bson, Self::Error> {
            t.try_into()
                .map(|b: ext::bson::Bson| b.0)
                .map_err(|e| e.into())
        };
        Ok(match value {
            Comparator::Eq(t) => bson!({ "$eq": one(t)? }),
            Comparator::Exists(b) => bson!({ "$exists": b }),
            Comparator::Gt(t) => bson!({ "$gt": one(t)? }),
            Comparator::Gte(t) => bson!({ "$gte": one(t)? }),
            Comparator::In(t) => bson!({ "$in": ext::bson::try_array(t)? }),
            Comparator::Lt(t) => bson!({ "$lt": one(t)? }),
            Comparator::Lte(t) => bson!({ "$lte": one(t)? }),
            Comparator::Ne(t) => bson!({ "$ne": one(t)? }),
            Comparator::Nin(t) => bson!({ "$nin": ext::bson::try_array(t)? }),
        })
    }
}

impl<T> TryFrom<Comparator<T>> for ext::bson::Bson
where
    T: TryInto<ext::bson::Bson>,
    T::Error: Into<ext::bson::ser::Error>,
{
    type Error = ext::bson::ser::Error;
    fn try_from(value: Comparator<T>) -> Result<Self, Self::Error> {
        Ok(ext::bson::Bson(Bson::try_from(value)?))
    }
}

/// Used to mark a type as a predicate that selects the documents an update applies to.
///
/// # Examples
///
/// Creating a filter for users.
///
/// ```
/// use std::convert::TryFrom;
///
/// use mongo_update::bson::Document;
/// use mongo_update::{Filter, Comparator, Error};
/// use mongo_update::ext::bson::Bson;
///
/// #[derive(Default)]
/// pub struct UserFilter {
///     name: Option<Comparator<String>>,
/// }
///
/// impl Filter for UserFilter {
///     fn into_document(self) -> Result<Document, Error> {
///         let mut doc = Document::new();
///         if let Some(value) = self.name {
///             doc.insert("name", Bson::try_from(value)?.0);
///         }
///         Ok(doc)
///     }
/// }
/// ```
pub trait Filter {
    /// Converts a `Filter` into a BSON `Document`.
    fn into_document(self) -> Result<Document, Error>;
}

/// Used to mark a type as a set of per key path match expressions.
///
/// Each `(key path, match expression)` pair is used as the operand of `$pull` for that key path,
/// see [`UpdateRequest::remove_matching_from_array_using_predicate`](crate::UpdateRequest::remove_matching_from_array_using_predicate).
pub trait KeyedFilter {
    /// Converts a `KeyedFilter` into its ordered `(key path, match expression)` pairs.
    fn into_conditions(self) -> Result<Vec<(String, Bson)>, Error>;
}

impl Filter for Document {
    fn into_document(self) -> Result<Document, Error> {
        Ok(self)
    }
}

impl KeyedFilter for Document {
    fn into_conditions(self) -> Result<Vec<(String, Bson)>, Error> {
        Ok(self.into_iter().collect())
    }
}

/// A predicate built from key paths and their match expressions.
///
/// Conditions keep the order in which their key paths were first added, setting a key path a
/// second time replaces its match expression.
///
/// # Examples
///
/// ```
/// use mongo_update::{Comparator, Filter, Predicate};
///
/// # fn doc() -> Result<(), mongo_update::Error> {
/// let predicate = Predicate::new()
///     .key_path("status", "active")?
///     .compare("age", Comparator::Gte(18))?;
/// let document = predicate.into_document()?;
/// assert_eq!(document.get_str("status").unwrap(), "active");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    conditions: Document,
}

impl Predicate {
    /// Constructs an empty `Predicate`, which matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches documents whose `key_path` equals `value`.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn key_path<K, V>(mut self, key_path: K, value: V) -> crate::Result<Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        self.conditions.insert(key_path, ext::bson::operand(value)?);
        Ok(self)
    }

    /// Matches documents whose `key_path` satisfies `comparator`.
    ///
    /// # Errors
    ///
    /// This method errors if the comparator's operand cannot be represented as BSON.
    pub fn compare<K, T>(mut self, key_path: K, comparator: Comparator<T>) -> crate::Result<Self>
    where
        K: Into<String>,
        T: TryInto<ext::bson::Bson>,
        T::Error: Into<ext::bson::ser::Error>,
    {
        self.conditions.insert(key_path, Bson::try_from(comparator)?);
        Ok(self)
    }

    /// Returns `true` if the predicate has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Filter for Predicate {
    fn into_document(self) -> Result<Document, Error> {
        Ok(self.conditions)
    }
}

impl KeyedFilter for Predicate {
    fn into_conditions(self) -> Result<Vec<(String, Bson)>, Error> {
        self.conditions.into_conditions()
    }
}

/// A predicate scoped to the elements of the array at one key path.
///
/// Used to remove embedded documents from an array, the conditions apply to the fields of each
/// element.
///
/// # Examples
///
/// ```
/// use mongo_update::{KeyedFilter, KeyedPredicate};
/// use mongo_update::bson::bson;
///
/// # fn doc() -> Result<(), mongo_update::Error> {
/// let keyed = KeyedPredicate::new("results")
///     .key_path("score", 8)?
///     .key_path("item", "B")?;
/// let conditions = keyed.into_conditions()?;
/// assert_eq!(conditions[0].0, "results");
/// assert_eq!(conditions[0].1, bson!({ "score": 8, "item": "B" }));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KeyedPredicate {
    key_path: String,
    predicate: Predicate,
}

impl KeyedPredicate {
    /// Constructs an empty predicate for the array at `key_path`.
    pub fn new<K: Into<String>>(key_path: K) -> Self {
        Self {
            key_path: key_path.into(),
            predicate: Predicate::new(),
        }
    }

    /// Matches elements whose `key_path` equals `value`.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn key_path<K, V>(mut self, key_path: K, value: V) -> crate::Result<Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        self.predicate = self.predicate.key_path(key_path, value)?;
        Ok(self)
    }

    /// Matches elements whose `key_path` satisfies `comparator`.
    ///
    /// # Errors
    ///
    /// This method errors if the comparator's operand cannot be represented as BSON.
    pub fn compare<K, T>(mut self, key_path: K, comparator: Comparator<T>) -> crate::Result<Self>
    where
        K: Into<String>,
        T: TryInto<ext::bson::Bson>,
        T::Error: Into<ext::bson::ser::Error>,
    {
        self.predicate = self.predicate.compare(key_path, comparator)?;
        Ok(self)
    }
}

impl KeyedFilter for KeyedPredicate {
    fn into_conditions(self) -> Result<Vec<(String, Bson)>, Error> {
        let conditions = self.predicate.into_document()?;
        Ok(vec![(self.key_path, Bson::Document(conditions))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_into_bson() {
        let b = Bson::try_from(Comparator::Gt(5)).unwrap();
        assert_eq!(b, bson!({ "$gt": 5 }));
        let b = Bson::try_from(Comparator::In(vec!["a", "b"])).unwrap();
        assert_eq!(b, bson!({ "$in": ["a", "b"] }));
        let b = Bson::try_from(Comparator::<i32>::Exists(false)).unwrap();
        assert_eq!(b, bson!({ "$exists": false }));
    }

    #[test]
    fn comparator_with_bad_operand() {
        assert!(Bson::try_from(Comparator::Nin(vec![1u64, u64::MAX])).is_err());
    }

    #[test]
    fn predicate_into_document() {
        let doc = Predicate::new()
            .key_path("status", "active")
            .unwrap()
            .into_document()
            .unwrap();
        assert_eq!(doc, doc! { "status": "active" });
    }

    #[test]
    fn predicate_keeps_first_use_order() {
        let doc = Predicate::new()
            .key_path("a", 1)
            .unwrap()
            .key_path("b", 2)
            .unwrap()
            .compare("a", Comparator::Lt(0))
            .unwrap()
            .into_document()
            .unwrap();
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(doc.get("a").unwrap(), &bson!({ "$lt": 0 }));
    }

    #[test]
    fn predicate_into_conditions() {
        let conditions = Predicate::new()
            .compare("scores", Comparator::Gte(6))
            .unwrap()
            .key_path("tags", "old")
            .unwrap()
            .into_conditions()
            .unwrap();
        assert_eq!(
            conditions,
            vec![
                ("scores".to_owned(), bson!({ "$gte": 6 })),
                ("tags".to_owned(), Bson::String("old".to_owned())),
            ]
        );
    }

    #[test]
    fn keyed_predicate_nests_conditions() {
        let conditions = KeyedPredicate::new("results")
            .compare("score", Comparator::Gte(8))
            .unwrap()
            .into_conditions()
            .unwrap();
        assert_eq!(
            conditions,
            vec![("results".to_owned(), bson!({ "score": { "$gte": 8 } }))]
        );
    }

    #[test]
    fn empty_predicate() {
        let predicate = Predicate::new();
        assert!(predicate.is_empty());
        assert!(predicate.into_document().unwrap().is_empty());
    }
}
