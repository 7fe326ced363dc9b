//! HTTP client implementation

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::request::Request;
use super::response::Response;
use crate::app::ScannerConfig;
use crate::error::HttpError;

/// Something that can execute a probe request.
///
/// The engine is generic over this so it can run against the shared
/// client or a scripted stub.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<Response, HttpError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: &Request) -> Result<Response, HttpError> {
        (**self).execute(request).await
    }
}

/// HTTP client wrapper
///
/// Two inner clients share one cookie jar, so session state set by login
/// applies to both. Redirect behaviour is chosen per request, never by
/// reconfiguring the client.
#[derive(Clone)]
pub struct HttpClient {
    /// Client that follows redirects
    following: reqwest::Client,

    /// Client that returns 3xx responses as-is
    non_following: reqwest::Client,

    /// Default timeout
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: &ScannerConfig) -> Result<Self, HttpError> {
        let jar = Arc::new(Jar::default());
        let timeout = config.request_timeout();

        let following = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        let non_following = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(&config.user_agent)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self {
            following,
            non_following,
            default_timeout: timeout,
        })
    }

    /// Execute a simple GET request
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let request = Request::new("GET", url);
        self.execute(&request).await
    }

    fn map_send_error(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(self.default_timeout.as_millis() as u64)
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::RequestFailed(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: &Request) -> Result<Response, HttpError> {
        let start = Instant::now();

        let method = reqwest::Method::from_str(&request.method)
            .map_err(|_| HttpError::RequestFailed(format!("Invalid HTTP method: {}", request.method)))?;

        let url = request.full_url();
        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.non_following
        };

        let mut builder = client.request(method, &url);

        // Set headers
        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            if let (Ok(name), Ok(val)) = (HeaderName::from_str(key), HeaderValue::from_str(value)) {
                headers.insert(name, val);
            }
        }
        builder = builder.headers(headers);

        // Set body
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();

        let mut response_headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(key.as_str().to_string(), v.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::BodyRead(e.to_string()))?;

        Ok(Response {
            status,
            headers: response_headers,
            body: body.to_vec(),
            elapsed: start.elapsed(),
        })
    }
}
