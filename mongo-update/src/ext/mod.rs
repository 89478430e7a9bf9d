//! Extensions for the crates that `mongo-update` builds on.

pub mod bson;
