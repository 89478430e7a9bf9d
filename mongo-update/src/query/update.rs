use bson::Document;
use mongodb::options::{
    Acknowledgment, Collation, Hint, ReplaceOptions, UpdateOptions, WriteConcern,
};
use mongodb::results::UpdateResult;

use crate::r#async::Client;
use crate::update::UpdateRequest;

/// A querier to send an `UpdateRequest` to a MongoDB collection.
///
/// The request decides what is sent: a replacement document is sent with `replace_one`, update
/// operators are sent with `update_many` when the request updates every match and `update_one`
/// otherwise. Upserting follows the request's flags.
///
/// # Examples
///
/// Updates some documents in a collection.
///
/// ```no_run
/// # async fn doc() -> Result<(), mongo_update::Error> {
/// use mongo_update::{Comparator, Predicate, UpdateRequest};
///
/// let client = mongo_update::Client::new();
///
/// let predicate = Predicate::new().compare("name", Comparator::Eq("foo"))?;
/// let mut request = UpdateRequest::with_predicate(predicate, false)?;
/// request.set("name", "bar")?;
///
/// let result = mongo_update::query::Update::new("users")
///     .query(&client, &request)
///     .await?;
///
/// println!("updated {} documents", result.modified_count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Update {
    collection: String,
    options: UpdateOptions,
}

impl Update {
    /// Constructs an `Update` querier for `collection`.
    pub fn new<I: Into<String>>(collection: I) -> Self {
        Self {
            collection: collection.into(),
            options: UpdateOptions::default(),
        }
    }

    /// An array of filters specifying to which array elements an update should apply.
    pub fn array_filters(mut self, filters: Vec<Document>) -> Self {
        self.options.array_filters = Some(filters);
        self
    }

    /// Opt out of document-level validation.
    pub fn bypass_document_validation(mut self, enable: bool) -> Self {
        self.options.bypass_document_validation = Some(enable);
        self
    }

    /// The collation to use for the operation.
    ///
    /// Collation allows users to specify language-specific rules for string comparison, such as
    /// rules for lettercase and accent marks.
    pub fn collation(mut self, collation: Collation) -> Self {
        self.options.collation = Some(collation);
        self
    }

    /// A document or string that specifies the index to use to support the query predicate.
    pub fn hint(mut self, value: Hint) -> Self {
        self.options.hint = Some(value);
        self
    }

    ///The write concern for the operation.
    pub fn write_concern(mut self, concern: WriteConcern) -> Self {
        self.options.write_concern = Some(concern);
        self
    }

    /// Renders `request` into the command that will be executed, without any I/O.
    pub(crate) fn command(self, request: &UpdateRequest) -> crate::Result<Command> {
        let filter = request.condition_document();
        let modifier = request.operation_document();
        let flags = request.flags();

        let mut options = self.options;
        options.upsert = Some(flags.upsert());
        let isolated = request.blocks_during_multi_updates() && flags.multi_update();
        if isolated && options.write_concern.is_none() {
            let mut concern = WriteConcern::default();
            concern.w = Some(Acknowledgment::Majority);
            concern.journal = Some(true);
            options.write_concern = Some(concern);
        }

        if request.is_replacement() {
            if flags.multi_update() {
                warn!(
                    "replacing at most one document in `{}` despite the multi-update flag",
                    self.collection
                );
            }
            let mut replace = ReplaceOptions::default();
            replace.bypass_document_validation = options.bypass_document_validation;
            replace.upsert = options.upsert;
            replace.collation = options.collation;
            replace.hint = options.hint;
            replace.write_concern = options.write_concern;
            return Ok(Command::Replace {
                collection: self.collection,
                filter,
                replacement: modifier,
                options: replace,
            });
        }

        if modifier.is_empty() {
            return Err(crate::Error::invalid_document(
                "an update requires at least one update operator",
            ));
        }
        Ok(Command::Update {
            collection: self.collection,
            many: flags.multi_update(),
            filter,
            modifier,
            options,
        })
    }

    /// Query the database with this querier.
    ///
    /// # Errors
    ///
    /// This method fails if:
    /// - the request holds no update operators and no replacement document.
    /// - the mongodb encountered an error.
    pub async fn query(
        self,
        client: &Client,
        request: &UpdateRequest,
    ) -> crate::Result<UpdateResult> {
        self.command(request)?.execute(client.database()).await
    }

    /// Query the database with this querier in a blocking context.
    ///
    /// # Optional
    ///
    /// This requires the optional `blocking` feature to be enabled.
    ///
    /// # Errors
    ///
    /// This method fails if:
    /// - the request holds no update operators and no replacement document.
    /// - the mongodb encountered an error.
    #[cfg(feature = "blocking")]
    pub fn blocking(
        self,
        client: &crate::blocking::Client,
        request: &UpdateRequest,
    ) -> crate::Result<UpdateResult> {
        client.execute(self.command(request)?)
    }
}

/// A rendered update, ready to be executed against a database.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub(crate) enum Command {
    Replace {
        collection: String,
        filter: Document,
        replacement: Document,
        options: ReplaceOptions,
    },
    Update {
        collection: String,
        many: bool,
        filter: Document,
        modifier: Document,
        options: UpdateOptions,
    },
}

impl Command {
    pub(crate) async fn execute(self, database: mongodb::Database) -> crate::Result<UpdateResult> {
        let result = match self {
            Command::Replace {
                collection,
                filter,
                replacement,
                options,
            } => {
                debug!("replace_one `{}` {} with {}", collection, filter, replacement);
                database
                    .collection::<Document>(&collection)
                    .replace_one(filter, replacement, options)
                    .await
            }
            Command::Update {
                collection,
                many,
                filter,
                modifier,
                options,
            } => {
                if many {
                    debug!("update_many `{}` {} with {}", collection, filter, modifier);
                    database
                        .collection::<Document>(&collection)
                        .update_many(filter, modifier, options)
                        .await
                } else {
                    debug!("update_one `{}` {} with {}", collection, filter, modifier);
                    database
                        .collection::<Document>(&collection)
                        .update_one(filter, modifier, options)
                        .await
                }
            }
        };
        result.map_err(crate::error::mongodb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Kind;

    #[test]
    fn operators_update_many() {
        let mut request = UpdateRequest::with_predicate(doc! { "a": 1 }, false).unwrap();
        request.set("b", 2).unwrap();
        match Update::new("items").command(&request).unwrap() {
            Command::Update {
                collection,
                many,
                filter,
                modifier,
                options,
            } => {
                assert_eq!(collection, "items");
                assert!(many);
                assert_eq!(filter, doc! { "a": 1 });
                assert_eq!(modifier, doc! { "$set": { "b": 2 } });
                assert_eq!(options.upsert, Some(false));
                assert!(options.write_concern.is_none());
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn operators_update_one_with_upsert() {
        let mut request = UpdateRequest::new(true);
        request.set_inserts_if_no_matches(true).increment("n");
        match Update::new("items").command(&request).unwrap() {
            Command::Update { many, options, .. } => {
                assert!(!many);
                assert_eq!(options.upsert, Some(true));
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn replacement_replaces_one() {
        let mut request = UpdateRequest::new(false);
        request.replace_document_with(doc! { "name": "foo" });
        match Update::new("items").command(&request).unwrap() {
            Command::Replace {
                replacement,
                options,
                ..
            } => {
                assert_eq!(replacement, doc! { "name": "foo" });
                assert_eq!(options.upsert, Some(false));
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn empty_request_is_invalid() {
        let request = UpdateRequest::new(false);
        let e = Update::new("items").command(&request).unwrap_err();
        assert_eq!(*e.kind(), Kind::InvalidDocument);
    }

    #[test]
    fn blocking_request_is_isolated_and_journaled() {
        let mut request = UpdateRequest::new(false);
        request.set_blocks_during_multi_updates(true).unset("a");
        match Update::new("items").command(&request).unwrap() {
            Command::Update {
                filter, options, ..
            } => {
                assert_eq!(filter, doc! { "$isolated": 1 });
                let concern = options.write_concern.unwrap();
                assert_eq!(concern.w, Some(Acknowledgment::Majority));
                assert_eq!(concern.journal, Some(true));
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn first_match_only_keeps_default_write_concern() {
        let mut request = UpdateRequest::new(true);
        request.set_blocks_during_multi_updates(true).unset("a");
        match Update::new("items").command(&request).unwrap() {
            Command::Update {
                filter, options, ..
            } => {
                assert!(filter.is_empty());
                assert!(options.write_concern.is_none());
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }

    #[test]
    fn explicit_write_concern_is_kept() {
        let mut request = UpdateRequest::new(false);
        request.set_blocks_during_multi_updates(true).unset("a");
        let mut concern = WriteConcern::default();
        concern.w = Some(Acknowledgment::Nodes(1));
        match Update::new("items")
            .write_concern(concern)
            .command(&request)
            .unwrap()
        {
            Command::Update { options, .. } => {
                let concern = options.write_concern.unwrap();
                assert_eq!(concern.w, Some(Acknowledgment::Nodes(1)));
                assert_eq!(concern.journal, None);
            }
            c => panic!("unexpected command: {:?}", c),
        }
    }
}
