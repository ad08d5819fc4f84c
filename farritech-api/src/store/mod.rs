//! Document store access.
//!
//! Handlers only ever need two operations against the remote store:
//! equality queries over a collection and partial field updates. Both sit
//! behind [`DocumentStore`] so the webhook logic can run against the
//! Firestore REST API in production and an in-memory store in tests.

pub mod firestore;
#[cfg(test)]
pub mod memory;
pub mod types;

use futures::future::BoxFuture;

use crate::error::Result;

pub use firestore::FirestoreClient;
pub use types::{Document, FieldFilter, Fields, Value};

/// Collection holding customer records.
pub const CUSTOMERS: &str = "customers";

/// Collection holding appointment records.
pub const APPOINTMENTS: &str = "appointments";

/// Collection holding farrier profiles, linked to accounts by `ownerUid`.
pub const FARRIERS: &str = "farriers";

/// Query-by-equality and patch-by-name access to a document store.
pub trait DocumentStore: Send + Sync {
    /// Return every document in `collection` matching all `filters`.
    fn query<'a>(
        &'a self,
        collection: &'a str,
        filters: &'a [FieldFilter],
    ) -> BoxFuture<'a, Result<Vec<Document>>>;

    /// Overwrite exactly the given fields of the named document.
    fn patch<'a>(&'a self, document_name: &'a str, fields: &'a Fields) -> BoxFuture<'a, Result<()>>;
}
