//! formprobe - concurrent form vulnerability probing
//!
//! Discovers HTML forms on a target page and sweeps their fields with
//! XSS and SQL injection payloads (plus optional command injection, XXE,
//! open redirect, SSRF and file disclosure probes), then aggregates the
//! verdicts into a risk profile.

pub mod app;
pub mod error;
pub mod http;
pub mod scanner;
pub mod session;

pub use error::{ConfigError, FormprobeError, HttpError, ScannerError, UserHint};
