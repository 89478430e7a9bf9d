//! # Mongo Update
//!
//! The `mongo_update` crate builds MongoDB update commands on top of the official `bson` &
//! `mongodb` crates.
//!
//! It provides the following:
//!
//! - An [`UpdateRequest`] builder accumulating update operators or a replacement document
//! - [Predicates](Predicate) selecting the documents to update
//! - Async and [blocking][blocking] Clients to send requests with
//! - [Bson][bson] extensions so that operands can be plain rust values
//!
//! ## Building requests
//!
//! An `UpdateRequest` renders into the selector and modifier documents of an update command,
//! along with the wire protocol's update flags.
//!
//! ```
//! use mongo_update::bson::doc;
//! use mongo_update::{Comparator, Predicate, UpdateRequest};
//!
//! # fn doc() -> Result<(), mongo_update::Error> {
//! let predicate = Predicate::new()
//!     .key_path("sku", "abc123")?
//!     .compare("qty", Comparator::Gt(0))?;
//!
//! let mut request = UpdateRequest::with_predicate(predicate, true)?;
//! request
//!     .increment_by("qty", -2)?
//!     .append_to_array("history", "sold")?
//!     .rename_key("colour", "color")
//!     .set_inserts_if_no_matches(true);
//!
//! assert_eq!(
//!     request.condition_document(),
//!     doc! { "sku": "abc123", "qty": { "$gt": 0 } }
//! );
//! assert_eq!(
//!     request.operation_document(),
//!     doc! {
//!         "$inc": { "qty": -2 },
//!         "$push": { "history": "sold" },
//!         "$rename": { "colour": "color" },
//!     }
//! );
//! assert_eq!(request.flags().bits(), 0b01);
//! # Ok(())
//! # }
//! ```
//!
//! ## Replacing
//!
//! A request can instead carry a whole replacement document, which discards any accumulated
//! operators (and vice versa).
//!
//! ```
//! use mongo_update::bson::doc;
//! use mongo_update::UpdateRequest;
//!
//! let mut request = UpdateRequest::new(true);
//! request.replace_document_with(doc! { "name": "foo", "age": 3 });
//! assert!(request.is_replacement());
//! ```
//!
//! ## Sending requests
//!
//! Sending a request with the async [`Client`]. For more driver options see
//! [`query::Update`].
//!
//! ```no_run
//! # async fn doc() -> Result<(), mongo_update::Error> {
//! use mongo_update::UpdateRequest;
//!
//! let client = mongo_update::Client::new();
//!
//! let mut request = UpdateRequest::new(false);
//! request.set("active", true)?;
//!
//! let result = client.update("users", &request).await?;
//! println!("updated {} documents", result.modified_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Optional Features
//!
//! The following are a list of [Cargo Features][cargo-features] that can be enabled or disabled:
//!
//! - **blocking**: Provides the [blocking][] client API.
//! - **chrono**: Provides the [chrono][chrono] support for the [`ext::bson`][ext-bson].
//!
//! [blocking]: ./blocking/index.html
//! [bson]: https://docs.rs/bson
//! [chrono]: https://docs.rs/chrono
//! [ext-bson]: ./ext/bson/index.html
//! [cargo-features]: https://doc.rust-lang.org/stable/cargo/reference/manifest.html#the-features-section

#![deny(missing_docs)]
#![deny(unused_imports)]

#[macro_use]
pub extern crate bson;
#[macro_use]
extern crate log;
pub extern crate mongodb as db;

pub use self::error::{Error, Kind as ErrorKind};
pub use self::filter::{Comparator, Filter, KeyedFilter, KeyedPredicate, Predicate};
pub use self::flags::UpdateFlags;
pub use self::number::{Integer, Number};
pub use self::query::Query;
pub use self::r#async::{Client, ClientBuilder};
pub use self::update::{Operator, Update, UpdateRequest};

pub(crate) use error::Result;

mod r#async;
#[cfg(feature = "blocking")]
pub mod blocking;
mod error;
pub mod ext;
mod filter;
mod flags;
mod number;
pub mod query;
mod update;
