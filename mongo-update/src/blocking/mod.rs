//! A blocking Client API.
//!
//! The blocking `Client` will block the current thread to execute, instead of returning futures
//! that need to be executed on a runtime.
//!
//! # Optional
//!
//! This requires the optional `blocking` feature to be enabled.
//!
//! # Making requests
//!
//! This client functions in the same way as the async `Client` except it blocks, here is an
//! example to deactivate a user.
//!
//! ```no_run
//! # fn doc() -> Result<(), mongo_update::Error> {
//! use mongo_update::{Predicate, UpdateRequest};
//!
//! let client = mongo_update::blocking::Client::new();
//!
//! let predicate = Predicate::new().key_path("name", "foo")?;
//! let mut request = UpdateRequest::with_predicate(predicate, true)?;
//! request.set("active", false)?;
//!
//! let result = client.update("users", &request)?;
//! println!("matched {} documents", result.matched_count);
//! # Ok(())
//! # }
//! ```

mod client;

pub use self::client::{Client, ClientBuilder};
