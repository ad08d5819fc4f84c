//! Firestore REST client authenticated with a web API key.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use super::types::{encode_fields, Document, FieldFilter, Fields};
use super::DocumentStore;
use crate::error::{rejection_from, Result};

/// Firestore REST client.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

impl FirestoreClient {
    pub fn new(client: Client, base_url: &str, project_id: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    async fn run_query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_root());
        let body = json!({ "structuredQuery": structured_query(collection, filters) });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = rejection_from("firestore", response).await;
            error!(collection = collection, error = %err, "firestore_query_failed");
            return Err(err);
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let documents = decode_query_rows(&rows);

        info!(
            collection = collection,
            filter_count = filters.len(),
            result_count = documents.len(),
            "firestore_query_complete"
        );

        Ok(documents)
    }

    async fn patch_document(&self, document_name: &str, fields: &Fields) -> Result<()> {
        let url = format!("{}/{}", self.base_url, document_name);

        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        params.push(("key", self.api_key.as_str()));

        let response = self
            .client
            .patch(&url)
            .query(&params)
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = rejection_from("firestore", response).await;
            error!(document = document_name, error = %err, "firestore_patch_failed");
            return Err(err);
        }

        info!(
            document = document_name,
            field_count = fields.len(),
            "firestore_patch_complete"
        );

        Ok(())
    }
}

impl DocumentStore for FirestoreClient {
    fn query<'a>(
        &'a self,
        collection: &'a str,
        filters: &'a [FieldFilter],
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        self.run_query(collection, filters).boxed()
    }

    fn patch<'a>(&'a self, document_name: &'a str, fields: &'a Fields) -> BoxFuture<'a, Result<()>> {
        self.patch_document(document_name, fields).boxed()
    }
}

/// Build a `structuredQuery` body: one `fieldFilter`, or an AND of several.
pub(crate) fn structured_query(collection: &str, filters: &[FieldFilter]) -> serde_json::Value {
    let field_filter = |f: &FieldFilter| {
        json!({
            "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": "EQUAL",
                "value": f.value.to_firestore(),
            }
        })
    };

    let mut query = json!({ "from": [{ "collectionId": collection }] });

    let filter = match filters {
        [] => None,
        [single] => Some(field_filter(single)),
        many => Some(json!({
            "compositeFilter": {
                "op": "AND",
                "filters": many.iter().map(field_filter).collect::<Vec<_>>(),
            }
        })),
    };

    if let Some(filter) = filter {
        query["where"] = filter;
    }

    query
}

/// runQuery streams one row per result; rows without a `document` carry only
/// read metadata and are skipped.
fn decode_query_rows(rows: &[serde_json::Value]) -> Vec<Document> {
    rows.iter()
        .filter_map(|row| row.get("document"))
        .filter_map(Document::from_firestore)
        .collect()
}
