//! Per-probe and per-job result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::detector::Verdict;
use super::form::Form;
use super::payloads::{Payload, Strategy, VulnClass};
use crate::http::Response;

/// Cut `text` down to `max_chars` characters, noting how much was dropped
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();
    format!("{}... ({} chars truncated)", kept, total - max_chars)
}

/// Outcome of one probe against one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub class: VulnClass,
    pub vulnerable: bool,
    pub tentative: bool,
    pub field: String,
    pub payload: String,
    pub description: String,
    pub strategy: Option<Strategy>,
    pub indicator: Option<String>,
    pub response_excerpt: String,
    pub status: u16,
    pub elapsed_ms: u64,
}

impl DetectionResult {
    pub fn new(field: &str, payload: &Payload, verdict: Verdict, response: &Response, excerpt_len: usize) -> Self {
        Self {
            class: payload.class,
            vulnerable: verdict.vulnerable,
            tentative: verdict.tentative,
            field: field.to_string(),
            payload: payload.value.to_string(),
            description: payload.description.to_string(),
            strategy: payload.strategy,
            indicator: verdict.indicator,
            response_excerpt: truncate_excerpt(&response.body_text(), excerpt_len),
            status: response.status,
            elapsed_ms: response.elapsed.as_millis() as u64,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.vulnerable && !self.tentative
    }
}

/// Everything learned about one form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Position of the form in discovery order
    pub index: usize,
    pub form: Form,
    pub xss_vulnerable: bool,
    pub sqli_vulnerable: bool,
    pub xss_results: Vec<DetectionResult>,
    pub sqli_results: Vec<DetectionResult>,

    /// Set when the job could not run to completion
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl JobResult {
    pub fn new(
        index: usize,
        form: Form,
        xss_results: Vec<DetectionResult>,
        sqli_results: Vec<DetectionResult>,
    ) -> Self {
        Self {
            index,
            form,
            xss_vulnerable: xss_results.iter().any(DetectionResult::is_confirmed),
            sqli_vulnerable: sqli_results.iter().any(DetectionResult::is_confirmed),
            xss_results,
            sqli_results,
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Result for a job whose worker failed
    pub fn failed(index: usize, form: Form, error: impl Into<String>) -> Self {
        let mut result = Self::new(index, form, Vec::new(), Vec::new());
        result.error = Some(error.into());
        result
    }

    pub fn is_vulnerable(&self) -> bool {
        self.xss_vulnerable || self.sqli_vulnerable
    }

    /// Confirmed findings across both classes
    pub fn findings(&self) -> impl Iterator<Item = &DetectionResult> {
        self.xss_results
            .iter()
            .chain(self.sqli_results.iter())
            .filter(|r| r.is_confirmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::form::FormMethod;
    use crate::scanner::payloads::XSS_PAYLOADS;

    #[test]
    fn test_truncate_excerpt() {
        assert_eq!(truncate_excerpt("short", 500), "short");

        let long = "a".repeat(520);
        let excerpt = truncate_excerpt(&long, 500);
        assert!(excerpt.starts_with(&"a".repeat(500)));
        assert!(excerpt.ends_with("... (20 chars truncated)"));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(truncate_excerpt(&text, 4), "éééé... (6 chars truncated)");
    }

    #[test]
    fn test_job_flags_follow_confirmed_results() {
        let response = Response {
            status: 200,
            body: b"<script>alert('XSS')</script>".to_vec(),
            ..Default::default()
        };
        let hit = DetectionResult::new(
            "q",
            &XSS_PAYLOADS[0],
            Verdict::confirmed(XSS_PAYLOADS[0].value),
            &response,
            500,
        );

        let form = Form::new("/s", FormMethod::Get, ["q"]);
        let job = JobResult::new(0, form.clone(), vec![hit], Vec::new());
        assert!(job.xss_vulnerable);
        assert!(!job.sqli_vulnerable);
        assert_eq!(job.findings().count(), 1);

        let failed = JobResult::failed(1, form, "panicked");
        assert!(!failed.is_vulnerable());
        assert_eq!(failed.error.as_deref(), Some("panicked"));
    }
}
