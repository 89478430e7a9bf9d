use std::convert::TryInto;
use std::fmt;

use bson::{Bson, Document};

use crate::error::Error;
use crate::ext;
use crate::filter::{Filter, KeyedFilter};
use crate::flags::UpdateFlags;
use crate::number::{Integer, Number};

/// Used to mark a type as a typed set of field values for use in updates.
///
/// # Examples
///
/// Creating an update for user.
///
/// ```
/// use mongo_update::bson::Document;
/// use mongo_update::{Error, Update, UpdateRequest};
///
/// #[derive(Default)]
/// pub struct UserUpdate {
///     pub name: Option<String>,
/// }
///
/// impl Update for UserUpdate {
///     fn into_document(self) -> Result<Document, Error> {
///         let mut doc = Document::new();
///         if let Some(value) = self.name {
///             doc.insert("name", value);
///         }
///         Ok(doc)
///     }
/// }
///
/// let update = UserUpdate {
///     name: Some("foo".to_owned()),
/// };
/// let mut request = UpdateRequest::new(true);
/// request.set_fields(update).unwrap();
/// ```
pub trait Update {
    /// Converts an `Update` into a BSON `Document`.
    fn into_document(self) -> Result<Document, Error>;
}

/// The update operators that an [`UpdateRequest`] accumulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `$set`: sets the value of a field.
    Set,
    /// `$unset`: removes a field.
    Unset,
    /// `$inc`: increments a field by an amount.
    Inc,
    /// `$bit`: performs a bitwise update of an integer field.
    Bit,
    /// `$addToSet`: adds values to an array unless they are already present.
    AddToSet,
    /// `$pull`: removes the array elements matching a value or condition.
    Pull,
    /// `$pullAll`: removes the array elements equal to any of the given values.
    PullAll,
    /// `$push`: appends a value to an array.
    Push,
    /// `$pushAll`: appends each of the given values to an array.
    PushAll,
    /// `$pop`: removes the first or last element of an array.
    Pop,
    /// `$rename`: renames a field.
    Rename,
}

impl Operator {
    /// Returns the operator's name as it appears in a modifier document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Set => "$set",
            Operator::Unset => "$unset",
            Operator::Inc => "$inc",
            Operator::Bit => "$bit",
            Operator::AddToSet => "$addToSet",
            Operator::Pull => "$pull",
            Operator::PullAll => "$pullAll",
            Operator::Push => "$push",
            Operator::PushAll => "$pushAll",
            Operator::Pop => "$pop",
            Operator::Rename => "$rename",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Operators in first use order, each holding its key paths in first use order.
#[derive(Clone, Debug, Default, PartialEq)]
struct Operators(Vec<(Operator, Document)>);

impl Operators {
    fn insert(&mut self, operator: Operator, key_path: String, value: Bson) {
        trace!("{} `{}` => {}", operator, key_path, value);
        match self.0.iter_mut().find(|(o, _)| *o == operator) {
            Some((_, fields)) => {
                fields.insert(key_path, value);
            }
            None => {
                let mut fields = Document::new();
                fields.insert(key_path, value);
                self.0.push((operator, fields));
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, fields)| fields.is_empty())
    }

    fn to_document(&self) -> Document {
        let mut document = Document::new();
        for (operator, fields) in &self.0 {
            if !fields.is_empty() {
                document.insert(operator.as_str(), fields.clone());
            }
        }
        document
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Modification {
    Operators(Operators),
    Replacement(Document),
}

/// A builder for a single MongoDB update command.
///
/// The request accumulates update operators against key paths, or holds a whole replacement
/// document, along with the predicate selecting the documents to update and the update flags.
/// It renders into the selector and modifier documents sent to the server.
///
/// The request is in one of two modes. Supplying a replacement document discards any
/// accumulated operators, and using any operator discards a replacement document, even when the
/// call contributes no entries. Writing the same key path twice under the same operator keeps
/// the last value, this includes the array operators, use [`add_all_to_set`](Self::add_all_to_set),
/// [`append_all_to_array`](Self::append_all_to_array) and
/// [`remove_all_matching_from_array`](Self::remove_all_matching_from_array) for multiple values.
///
/// Methods that take an operand return a `Result`, the operand is converted before the request
/// is touched so a failed call leaves it unchanged.
///
/// # Examples
///
/// Deactivate every user that has not logged in since a date.
///
/// ```
/// use mongo_update::bson::doc;
/// use mongo_update::{Comparator, Predicate, UpdateRequest};
///
/// # fn doc() -> Result<(), mongo_update::Error> {
/// let predicate = Predicate::new().compare("last_login", Comparator::Lt("2020-01-01"))?;
///
/// let mut request = UpdateRequest::with_predicate(predicate, false)?;
/// request
///     .set("status", "inactive")?
///     .increment("deactivations")
///     .unset("session");
///
/// assert_eq!(
///     request.operation_document(),
///     doc! {
///         "$set": { "status": "inactive" },
///         "$inc": { "deactivations": 1 },
///         "$unset": { "session": 1 },
///     }
/// );
/// assert_eq!(request.flags().bits(), 0b10);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    selector: Option<Document>,
    modification: Modification,
    updates_first_match_only: bool,
    inserts_if_no_matches: bool,
    blocks_during_multi_updates: bool,
}

impl UpdateRequest {
    /// Constructs an empty `UpdateRequest` with no predicate, which matches every document.
    pub fn new(first_match_only: bool) -> Self {
        Self {
            selector: None,
            modification: Modification::Operators(Operators::default()),
            updates_first_match_only: first_match_only,
            inserts_if_no_matches: false,
            blocks_during_multi_updates: false,
        }
    }

    /// Constructs an empty `UpdateRequest` for the documents matching `predicate`.
    ///
    /// # Errors
    ///
    /// This method errors if the predicate could not be converted into a BSON `Document`.
    pub fn with_predicate<F: Filter>(
        predicate: F,
        first_match_only: bool,
    ) -> crate::Result<Self> {
        let mut request = Self::new(first_match_only);
        request.set_predicate(predicate)?;
        Ok(request)
    }

    /// Replaces the predicate selecting the documents to update.
    ///
    /// # Errors
    ///
    /// This method errors if the predicate could not be converted into a BSON `Document`.
    pub fn set_predicate<F: Filter>(&mut self, predicate: F) -> crate::Result<&mut Self> {
        self.selector = Some(predicate.into_document()?);
        Ok(self)
    }

    /// Whether only the first matching document is updated.
    pub fn updates_first_match_only(&self) -> bool {
        self.updates_first_match_only
    }

    /// Update only the first matching document, rather than all of them.
    pub fn set_updates_first_match_only(&mut self, enable: bool) -> &mut Self {
        self.updates_first_match_only = enable;
        self
    }

    /// Whether a document is inserted when nothing matches.
    pub fn inserts_if_no_matches(&self) -> bool {
        self.inserts_if_no_matches
    }

    /// Insert a document if no matching document is found.
    pub fn set_inserts_if_no_matches(&mut self, enable: bool) -> &mut Self {
        self.inserts_if_no_matches = enable;
        self
    }

    /// Whether the multi-update is isolated from other writers.
    ///
    /// Has no effect when only the first match is updated.
    pub fn blocks_during_multi_updates(&self) -> bool {
        self.blocks_during_multi_updates
    }

    /// Isolate a multi-update from other writers until it completes.
    pub fn set_blocks_during_multi_updates(&mut self, enable: bool) -> &mut Self {
        self.blocks_during_multi_updates = enable;
        self
    }

    /// Sends `document` as a whole replacement of the matched document.
    ///
    /// Discards any accumulated update operators.
    pub fn replace_document_with(&mut self, document: Document) -> &mut Self {
        if let Modification::Operators(operators) = &self.modification {
            if !operators.is_empty() {
                debug!(
                    "discarding {} update operators for a replacement document",
                    operators.0.len()
                );
            }
        }
        self.modification = Modification::Replacement(document);
        self
    }

    /// Like [`replace_document_with`](Self::replace_document_with) but refuses to discard any
    /// accumulated update operators.
    ///
    /// # Errors
    ///
    /// This method errors with `Kind::ModeConflict` if update operators have been accumulated.
    pub fn try_replace_document_with(&mut self, document: Document) -> crate::Result<&mut Self> {
        if let Modification::Operators(operators) = &self.modification {
            if !operators.is_empty() {
                return Err(crate::error::mode_conflict(
                    "update operators have already been accumulated",
                ));
            }
        }
        Ok(self.replace_document_with(document))
    }

    /// Sends a replacement document built from `fields`.
    ///
    /// # Errors
    ///
    /// This method errors if any of the values cannot be represented as BSON.
    pub fn replace_document_with_fields<I, K, V>(&mut self, fields: I) -> crate::Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let mut document = Document::new();
        for (key, value) in fields {
            document.insert(key, ext::bson::operand(value)?);
        }
        Ok(self.replace_document_with(document))
    }

    fn use_operators(&mut self) {
        if matches!(self.modification, Modification::Replacement(_)) {
            debug!("discarding replacement document for update operators");
            self.modification = Modification::Operators(Operators::default());
        }
    }

    fn write(&mut self, operator: Operator, key_path: String, value: Bson) -> &mut Self {
        self.use_operators();
        if let Modification::Operators(operators) = &mut self.modification {
            operators.insert(operator, key_path, value);
        }
        self
    }

    /// Sets the value of the field at `key_path`.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn set<K, V>(&mut self, key_path: K, value: V) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let value = ext::bson::operand(value)?;
        Ok(self.write(Operator::Set, key_path.into(), value))
    }

    /// Sets every field of a typed update.
    ///
    /// # Errors
    ///
    /// This method errors if the update could not be converted into a BSON `Document`.
    pub fn set_fields<U: Update>(&mut self, update: U) -> crate::Result<&mut Self> {
        let fields = update.into_document()?;
        self.use_operators();
        for (key_path, value) in fields {
            self.write(Operator::Set, key_path, value);
        }
        Ok(self)
    }

    /// Removes the field at `key_path`.
    pub fn unset<K: Into<String>>(&mut self, key_path: K) -> &mut Self {
        self.write(Operator::Unset, key_path.into(), Bson::Int32(1))
    }

    /// Removes every field present in a typed update, the values are ignored.
    ///
    /// # Errors
    ///
    /// This method errors if the update could not be converted into a BSON `Document`.
    pub fn unset_fields<U: Update>(&mut self, update: U) -> crate::Result<&mut Self> {
        let fields = update.into_document()?;
        self.use_operators();
        for key_path in fields.keys() {
            self.write(Operator::Unset, key_path.to_owned(), Bson::Int32(1));
        }
        Ok(self)
    }

    /// Increments the field at `key_path` by one.
    pub fn increment<K: Into<String>>(&mut self, key_path: K) -> &mut Self {
        self.write(Operator::Inc, key_path.into(), Number::Int32(1).into())
    }

    /// Increments the field at `key_path` by `amount`, which may be negative.
    ///
    /// # Errors
    ///
    /// This method errors if the amount is not numeric, this can only happen for amounts that
    /// are not statically numeric such as a `Bson` value or a `u64` beyond `i64::MAX`.
    pub fn increment_by<K, N>(&mut self, key_path: K, amount: N) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        N: TryInto<Number>,
        N::Error: Into<Error>,
    {
        let amount: Number = match amount.try_into() {
            Ok(amount) => amount,
            Err(e) => return Err(e.into()),
        };
        Ok(self.write(Operator::Inc, key_path.into(), amount.into()))
    }

    fn bitwise<K, I>(&mut self, key_path: K, operation: &str, value: I) -> &mut Self
    where
        K: Into<String>,
        I: Into<Integer>,
    {
        let value: Integer = value.into();
        let mut document = Document::new();
        document.insert(operation, value);
        self.write(Operator::Bit, key_path.into(), Bson::Document(document))
    }

    /// Replaces the integer field at `key_path` with its bitwise and with `value`.
    pub fn bitwise_and<K, I>(&mut self, key_path: K, value: I) -> &mut Self
    where
        K: Into<String>,
        I: Into<Integer>,
    {
        self.bitwise(key_path, "and", value)
    }

    /// Replaces the integer field at `key_path` with its bitwise or with `value`.
    pub fn bitwise_or<K, I>(&mut self, key_path: K, value: I) -> &mut Self
    where
        K: Into<String>,
        I: Into<Integer>,
    {
        self.bitwise(key_path, "or", value)
    }

    /// Replaces the integer field at `key_path` with its bitwise xor with `value`.
    pub fn bitwise_xor<K, I>(&mut self, key_path: K, value: I) -> &mut Self
    where
        K: Into<String>,
        I: Into<Integer>,
    {
        self.bitwise(key_path, "xor", value)
    }

    /// Adds `value` to the array at `key_path` unless it is already present.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn add_to_set<K, V>(&mut self, key_path: K, value: V) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let value = ext::bson::operand(value)?;
        Ok(self.write(Operator::AddToSet, key_path.into(), value))
    }

    /// Adds each of `values` to the array at `key_path` unless it is already present.
    ///
    /// # Errors
    ///
    /// This method errors if any of the values cannot be represented as BSON.
    pub fn add_all_to_set<K, I, V>(&mut self, key_path: K, values: I) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let values = ext::bson::try_array(values)?;
        Ok(self.write(
            Operator::AddToSet,
            key_path.into(),
            doc! { "$each": values }.into(),
        ))
    }

    /// Removes the elements equal to `value` from the array at `key_path`.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn remove_matching_from_array<K, V>(
        &mut self,
        key_path: K,
        value: V,
    ) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let value = ext::bson::operand(value)?;
        Ok(self.write(Operator::Pull, key_path.into(), value))
    }

    /// Removes the elements equal to any of `values` from the array at `key_path`.
    ///
    /// # Errors
    ///
    /// This method errors if any of the values cannot be represented as BSON.
    pub fn remove_all_matching_from_array<K, I, V>(
        &mut self,
        key_path: K,
        values: I,
    ) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let values = ext::bson::try_array(values)?;
        Ok(self.write(Operator::PullAll, key_path.into(), Bson::Array(values)))
    }

    /// Removes the elements matching each of the predicate's conditions from the array at the
    /// condition's key path.
    ///
    /// # Examples
    ///
    /// ```
    /// use mongo_update::bson::doc;
    /// use mongo_update::{Comparator, KeyedPredicate, UpdateRequest};
    ///
    /// # fn doc() -> Result<(), mongo_update::Error> {
    /// let mut request = UpdateRequest::new(true);
    /// request.remove_matching_from_array_using_predicate(
    ///     KeyedPredicate::new("results").compare("score", Comparator::Lt(5))?,
    /// )?;
    /// assert_eq!(
    ///     request.operation_document(),
    ///     doc! { "$pull": { "results": { "score": { "$lt": 5 } } } }
    /// );
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// This method errors if the predicate could not be converted into its conditions.
    pub fn remove_matching_from_array_using_predicate<P: KeyedFilter>(
        &mut self,
        predicate: P,
    ) -> crate::Result<&mut Self> {
        let conditions = predicate.into_conditions()?;
        self.use_operators();
        for (key_path, condition) in conditions {
            self.write(Operator::Pull, key_path, condition);
        }
        Ok(self)
    }

    /// Appends `value` to the array at `key_path`.
    ///
    /// # Errors
    ///
    /// This method errors if the value cannot be represented as BSON.
    pub fn append_to_array<K, V>(&mut self, key_path: K, value: V) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let value = ext::bson::operand(value)?;
        Ok(self.write(Operator::Push, key_path.into(), value))
    }

    /// Appends each of `values` to the array at `key_path`.
    ///
    /// # Errors
    ///
    /// This method errors if any of the values cannot be represented as BSON.
    pub fn append_all_to_array<K, I, V>(
        &mut self,
        key_path: K,
        values: I,
    ) -> crate::Result<&mut Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: TryInto<ext::bson::Bson>,
        V::Error: Into<ext::bson::ser::Error>,
    {
        let values = ext::bson::try_array(values)?;
        Ok(self.write(Operator::PushAll, key_path.into(), Bson::Array(values)))
    }

    /// Removes the last element of the array at `key_path`.
    pub fn remove_last_from_array<K: Into<String>>(&mut self, key_path: K) -> &mut Self {
        self.write(Operator::Pop, key_path.into(), Bson::Int32(1))
    }

    /// Removes the first element of the array at `key_path`.
    ///
    /// `$pop` holds one direction per key path, so combining this with
    /// [`remove_last_from_array`](Self::remove_last_from_array) on the same key path keeps
    /// whichever was called last.
    pub fn remove_first_from_array<K: Into<String>>(&mut self, key_path: K) -> &mut Self {
        self.write(Operator::Pop, key_path.into(), Bson::Int32(-1))
    }

    /// Renames the field at `old_key_path` to `new_key_path`.
    pub fn rename_key<O, N>(&mut self, old_key_path: O, new_key_path: N) -> &mut Self
    where
        O: Into<String>,
        N: Into<String>,
    {
        self.write(
            Operator::Rename,
            old_key_path.into(),
            Bson::String(new_key_path.into()),
        )
    }

    /// Returns `true` if the request holds a replacement document rather than update operators.
    pub fn is_replacement(&self) -> bool {
        matches!(self.modification, Modification::Replacement(_))
    }

    /// Renders the selector document, which is empty if no predicate was set.
    ///
    /// When [`blocks_during_multi_updates`](Self::blocks_during_multi_updates) is enabled on a
    /// multi-update the `$isolated` directive is appended. MongoDB 4.0 and later reject
    /// `$isolated`.
    pub fn condition_document(&self) -> Document {
        let mut document = self.selector.clone().unwrap_or_default();
        if self.blocks_during_multi_updates && !self.updates_first_match_only {
            document.insert("$isolated", 1);
        }
        document
    }

    /// Renders the modifier document.
    ///
    /// This is either the replacement document, or the accumulated operators in the order they
    /// were first used.
    pub fn operation_document(&self) -> Document {
        match &self.modification {
            Modification::Operators(operators) => operators.to_document(),
            Modification::Replacement(document) => document.clone(),
        }
    }

    /// Returns the wire protocol flags of this request.
    pub fn flags(&self) -> UpdateFlags {
        UpdateFlags::new(self.inserts_if_no_matches, !self.updates_first_match_only)
    }

    /// Returns a human readable rendering of the request, for diagnostics.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "update ({}) condition: {} operation: {}",
            self.flags(),
            self.condition_document(),
            self.operation_document()
        )
    }
}
