//! HTTP client module
//!
//! Provides the shared client the engine probes through, plus the
//! request/response values that flow between requester and detectors.

mod client;
mod request;
mod response;

pub use client::{HttpClient, Transport};
pub use request::{encode_pairs, ContentType, Request, RequestBuilder};
pub use response::Response;
