//! The query operations that send an `UpdateRequest` to a MongoDB.
mod update;

pub use self::update::Update;
#[cfg(feature = "blocking")]
pub(crate) use self::update::Command;

/// A convenience wrapper for easy access to queriers.
pub struct Query;

impl Query {
    /// Returns a `Update` querier for `collection`.
    pub fn update<I: Into<String>>(collection: I) -> Update {
        Update::new(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::update::Command;
    use super::*;

    use crate::update::UpdateRequest;

    #[test]
    fn update_querier_for_collection() {
        let mut request = UpdateRequest::new(true);
        request.unset("a");
        match Query::update("items").command(&request).unwrap() {
            Command::Update { collection, .. } => assert_eq!(collection, "items"),
            c => panic!("unexpected command: {:?}", c),
        }
    }
}
