//! Form vulnerability scanner
//!
//! Discovers forms, sweeps their fields with payload catalogs through a
//! bounded worker pool, and aggregates verdicts into a risk profile.

mod detector;
mod endpoint;
mod engine;
mod findings;
mod form;
mod mutator;
mod pool;
mod requester;
mod results;
mod scoring;
mod sweep;
pub mod payloads;

pub use detector::{Detector, Verdict};
pub use endpoint::{EndpointProber, ADVANCED_CLASSES};
pub use engine::{run_job, scan_forms, EngineSettings};
pub use findings::{EndpointVulnResult, Severity};
pub use form::{parse_forms, Form, FormMethod};
pub use mutator::{build as build_parameters, ParameterSet, PLACEHOLDER};
pub use payloads::{payloads_for, Payload, Strategy, VulnClass};
pub use pool::{ResultStream, ScanJob, WorkerPool};
pub use requester::{build_request, resolve_target, send};
pub use results::{truncate_excerpt, DetectionResult, JobResult};
pub use scoring::{risk_level, Aggregator, FormSummary, RiskLevel, RiskProfile};
pub use sweep::Sweeper;
