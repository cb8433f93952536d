use serde::Serialize;
use serde_json::Value;

use crate::catalog::template::Slot;

use super::method::HttpMethod;

/// A request with every template placeholder resolved against run state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteRequest {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Slots that had no value and were sent as the unbound sentinel.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Slot>,
}

impl ConcreteRequest {
    pub fn summary(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// What actually goes over the wire: absolute URL plus headers.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl OutboundRequest {
    pub fn from_concrete(base_url: &str, bearer_token: &str, request: &ConcreteRequest) -> Self {
        Self {
            method: request.method,
            url: format!("{}{}", base_url.trim_end_matches('/'), request.path),
            query: request.query.clone(),
            headers: vec![("Authorization".to_string(), format!("Bearer {bearer_token}"))],
            body: request.body.clone(),
        }
    }
}
