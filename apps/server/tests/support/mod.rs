pub mod assertions;
pub mod fixtures;

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use ayush_terminology::{
    api::create_router,
    ingestion::{Icd11Source, NamasteSource},
    AppState, Config,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt as _;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Empty registry, default configuration, no ingestion sources
    pub fn new() -> Self {
        Self::with_sources(Config::default(), None, None)
    }

    pub fn with_sources(
        config: Config,
        namaste_source: Option<Arc<dyn NamasteSource>>,
        icd11_source: Option<Arc<dyn Icd11Source>>,
    ) -> Self {
        let state = AppState::with_sources(config, namaste_source, icd11_source);
        let router = create_router(state.clone());
        Self { router, state }
    }

    /// Default app with the shared fixtures loaded
    pub async fn seeded() -> anyhow::Result<Self> {
        let app = Self::new();
        seed(&app.state).await.context("seed fixtures")?;
        Ok(app)
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, path_and_query, body, &[])
            .await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut request = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("host", "localhost")
            .header("content-type", "application/json")
            .body(match body {
                Some(bytes) => Body::from(bytes),
                None => Body::empty(),
            })
            .context("build request")?;

        for (name, value) in extra_headers {
            request.headers_mut().insert(
                name.parse::<HeaderName>().context("parse header name")?,
                value.parse::<HeaderValue>().context("parse header value")?,
            );
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    /// GET and decode the JSON body
    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self.request(Method::GET, path_and_query, None).await?;
        Ok((status, parse_json(&body)?))
    }

    /// Send a JSON body and decode the JSON response
    pub async fn send_json(
        &self,
        method: Method,
        path_and_query: &str,
        body: &Value,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _headers, body) = self
            .request(method, path_and_query, Some(to_json_body(body)?))
            .await?;
        Ok((status, parse_json(&body)?))
    }
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value).context("encode body")?))
}

/// Decode a response body; an empty body decodes to `null`
pub fn parse_json(body: &Bytes) -> anyhow::Result<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).with_context(|| {
        format!(
            "decode response body: {}",
            String::from_utf8_lossy(body)
        )
    })
}
