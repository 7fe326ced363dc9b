//! Endpoint-level findings

use serde::{Deserialize, Serialize};

use super::detector::Verdict;
use super::payloads::{Payload, VulnClass};
use super::results::DetectionResult;

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Severity assigned to a confirmed finding of `class`
    pub fn for_class(class: VulnClass) -> Self {
        match class {
            VulnClass::OpenRedirect => Severity::Medium,
            _ => Severity::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vulnerability found by an endpoint or advanced form probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointVulnResult {
    pub kind: VulnClass,
    pub vulnerable: bool,

    /// Weak signal; excluded from the risk score
    pub tentative: bool,

    pub severity: Severity,
    pub evidence: String,
    pub payload: String,

    /// URL that was probed
    pub target: String,

    /// Parameter or form field carrying the payload
    pub parameter: Option<String>,
}

impl EndpointVulnResult {
    /// Build a finding from a positive verdict
    pub fn from_verdict(payload: &Payload, verdict: &Verdict, target: &str) -> Self {
        let severity = if verdict.tentative {
            Severity::Low
        } else {
            Severity::for_class(payload.class)
        };

        Self {
            kind: payload.class,
            vulnerable: verdict.vulnerable,
            tentative: verdict.tentative,
            severity,
            evidence: verdict.indicator.clone().unwrap_or_default(),
            payload: payload.value.to_string(),
            target: target.to_string(),
            parameter: None,
        }
    }

    /// Lift a positive form-field probe into a finding against `target`
    pub fn from_detection(result: &DetectionResult, target: &str) -> Self {
        let severity = if result.tentative {
            Severity::Low
        } else {
            Severity::for_class(result.class)
        };

        Self {
            kind: result.class,
            vulnerable: result.vulnerable,
            tentative: result.tentative,
            severity,
            evidence: result.indicator.clone().unwrap_or_default(),
            payload: result.payload.clone(),
            target: target.to_string(),
            parameter: Some(result.field.clone()),
        }
    }

    pub fn with_parameter(mut self, parameter: &str) -> Self {
        self.parameter = Some(parameter.to_string());
        self
    }

    /// Counts toward the risk score
    pub fn is_confirmed(&self) -> bool {
        self.vulnerable && !self.tentative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::payloads::{OPEN_REDIRECT_PAYLOADS, SSRF_PAYLOADS, TRAVERSAL_PAYLOADS};

    #[test]
    fn test_severity_per_class() {
        let verdict = Verdict::confirmed("root:");
        let finding = EndpointVulnResult::from_verdict(&TRAVERSAL_PAYLOADS[0], &verdict, "http://t/?file=x")
            .with_parameter("file");
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.parameter.as_deref(), Some("file"));
        assert!(finding.is_confirmed());

        let redirect = EndpointVulnResult::from_verdict(
            &OPEN_REDIRECT_PAYLOADS[0],
            &Verdict::confirmed("Location: https://evil.com"),
            "http://t/",
        );
        assert_eq!(redirect.severity, Severity::Medium);
    }

    #[test]
    fn test_tentative_finding_is_low_and_unconfirmed() {
        let finding = EndpointVulnResult::from_verdict(
            &SSRF_PAYLOADS[0],
            &Verdict::tentative("Fast response: 3ms"),
            "http://t/",
        );
        assert_eq!(finding.severity, Severity::Low);
        assert!(!finding.is_confirmed());
    }
}
