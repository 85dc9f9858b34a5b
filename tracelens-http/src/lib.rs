//! HTTP instrumentation for TraceLens
//!
//! Wraps a [`reqwest::Client`] so every request produces console_log
//! events on the owning [`TraceLens`] instance: `HTTP Request` before the
//! call, then `HTTP Response` with status and elapsed milliseconds, or
//! `HTTP Error` with the failure message. The wrapper never changes the
//! outcome of a request; the caller gets exactly what reqwest returned.
//!
//! ```rust,ignore
//! use tracelens_http::TracedClient;
//!
//! let client = TracedClient::new(tracelens::global());
//! let response = client.get("https://api.example.com/users").await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tracelens::TraceLens;

/// A reqwest client that reports its traffic to TraceLens
pub struct TracedClient {
    http: reqwest::Client,
    lens: Arc<TraceLens>,
}

impl TracedClient {
    /// Create a client with default reqwest settings
    pub fn new(lens: Arc<TraceLens>) -> Self {
        Self {
            http: reqwest::Client::new(),
            lens,
        }
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(lens: Arc<TraceLens>, http: reqwest::Client) -> Self {
        Self { http, lens }
    }

    /// Execute a request, logging around it
    pub async fn execute(&self, request: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();

        let start = Instant::now();
        self.lens
            .log(
                "HTTP Request",
                Some(json!({
                    "method": method.as_str(),
                    "url": url.as_str(),
                })),
            )
            .await;

        match self.http.execute(request).await {
            Ok(response) => {
                self.lens
                    .log(
                        "HTTP Response",
                        Some(json!({
                            "method": method.as_str(),
                            "url": url.as_str(),
                            "statusCode": response.status().as_u16(),
                            "duration": start.elapsed().as_millis() as u64,
                        })),
                    )
                    .await;
                Ok(response)
            }
            Err(error) => {
                self.lens
                    .log(
                        "HTTP Error",
                        Some(json!({
                            "method": method.as_str(),
                            "url": url.as_str(),
                            "error": error.to_string(),
                        })),
                    )
                    .await;
                Err(error)
            }
        }
    }

    /// GET a URL
    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let request = self.http.get(url).build()?;
        self.execute(request).await
    }

    /// POST a JSON body to a URL
    pub async fn post_json<B>(&self, url: &str, body: &B) -> reqwest::Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let request = self.http.post(url).json(body).build()?;
        self.execute(request).await
    }

    /// The wrapped reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.http
    }
}
