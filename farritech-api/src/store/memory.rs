//! In-memory [`DocumentStore`] for tests.

use std::sync::Mutex;

use futures::future::{self, BoxFuture, FutureExt};
use reqwest::StatusCode;

use super::types::{Document, FieldFilter, Fields};
use super::DocumentStore;
use crate::error::{ClientError, Result};

/// Documents live in a flat list; the collection is the second-to-last
/// segment of the document name, as in Firestore resource names.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    patches: Mutex<Vec<(String, Fields)>>,
    queries: Mutex<usize>,
    fail: bool,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
            ..Default::default()
        }
    }

    /// A store whose every call fails, standing in for an unreachable backend.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn document(&self, name: &str) -> Option<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.name == name)
            .cloned()
    }

    pub fn insert(&self, document: Document) {
        self.documents.lock().unwrap().push(document);
    }

    pub fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    pub fn query_count(&self) -> usize {
        *self.queries.lock().unwrap()
    }

    fn unavailable() -> ClientError {
        ClientError::rejected("memory", StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
    }
}

fn collection_of(name: &str) -> Option<&str> {
    let mut segments = name.rsplit('/');
    segments.next()?;
    segments.next()
}

impl DocumentStore for MemoryStore {
    fn query<'a>(
        &'a self,
        collection: &'a str,
        filters: &'a [FieldFilter],
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        *self.queries.lock().unwrap() += 1;

        if self.fail {
            return future::ready(Err(Self::unavailable())).boxed();
        }

        let matches = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| collection_of(&d.name) == Some(collection))
            .filter(|d| {
                filters
                    .iter()
                    .all(|f| d.fields.get(&f.field) == Some(&f.value))
            })
            .cloned()
            .collect();

        future::ready(Ok(matches)).boxed()
    }

    fn patch<'a>(&'a self, document_name: &'a str, fields: &'a Fields) -> BoxFuture<'a, Result<()>> {
        if self.fail {
            return future::ready(Err(Self::unavailable())).boxed();
        }

        let mut documents = self.documents.lock().unwrap();
        let result = match documents.iter_mut().find(|d| d.name == document_name) {
            Some(doc) => {
                for (k, v) in fields {
                    doc.fields.insert(k.clone(), v.clone());
                }
                self.patches
                    .lock()
                    .unwrap()
                    .push((document_name.to_string(), fields.clone()));
                Ok(())
            }
            None => Err(ClientError::rejected(
                "memory",
                StatusCode::NOT_FOUND,
                format!("no document {document_name}"),
            )),
        };

        future::ready(result).boxed()
    }
}
