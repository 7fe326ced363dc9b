//! HTTP request types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method
    pub method: String,

    /// Request URL without the probe query string
    pub url: String,

    /// Request headers
    pub headers: HashMap<String, String>,

    /// Query parameters, in submission order
    pub params: Vec<(String, String)>,

    /// Request body
    pub body: Option<String>,

    /// Body content type
    pub content_type: Option<ContentType>,

    /// Follow redirects
    pub follow_redirects: bool,
}

/// Content type for request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Form,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            headers: HashMap::new(),
            params: Vec::new(),
            body: None,
            content_type: None,
            follow_redirects: true,
        }
    }
}

impl Request {
    /// Create a new request
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Create a builder for constructing requests
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Get the full URL with query parameters
    pub fn full_url(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }

        let query = encode_pairs(&self.params);
        if self.url.contains('?') {
            format!("{}&{}", self.url, query)
        } else {
            format!("{}?{}", self.url, query)
        }
    }

    /// Look up a query parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`, keeping their order
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builder for constructing requests
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Set the request method
    pub fn method(mut self, method: &str) -> Self {
        self.request.method = method.to_uppercase();
        self
    }

    /// Set the request URL
    pub fn url(mut self, url: &str) -> Self {
        self.request.url = url.to_string();
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.request.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Replace all query parameters
    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.request.params = params;
        self
    }

    /// Set a form-encoded body
    pub fn form(mut self, fields: &[(String, String)]) -> Self {
        self.request.body = Some(encode_pairs(fields));
        self.request.content_type = Some(ContentType::Form);
        self.request
            .headers
            .insert("Content-Type".to_string(), ContentType::Form.mime().to_string());
        self
    }

    /// Set follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.request.follow_redirects = follow;
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}
