//! Per-request context injected by middleware.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    /// `X-Request-Id` sent by the client, if any
    pub client_request_id: Option<String>,
}

impl RequestContext {
    pub fn new(client_request_id: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            client_request_id,
        }
    }
}
