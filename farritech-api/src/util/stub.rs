//! Local stand-in for vendor HTTP APIs, used by client tests.

use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    http::{header, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: String,
}

/// An HTTP server on an ephemeral localhost port answering every request
/// through one closure.
pub struct Stub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    /// Start serving. `respond` maps each request to a status and JSON body.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> (StatusCode, String) + Clone + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
            let respond = respond.clone();
            let log = log.clone();
            async move {
                let recorded = Recorded {
                    method,
                    path: uri.path().to_string(),
                    query: uri.query().unwrap_or_default().to_string(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                };
                let (status, body) = respond(&recorded);
                log.lock().unwrap().push(recorded);
                (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path ends with `suffix`.
    pub fn hits(&self, suffix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }
}
