//! Risk aggregation over job and endpoint results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::findings::EndpointVulnResult;
use super::payloads::VulnClass;
use super::results::JobResult;
use crate::app::{ScoringConfig, TierThreshold};

/// Overall risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Map a score onto the configured tiers; below every tier is low
pub fn risk_level(score: u32, tiers: &[TierThreshold]) -> RiskLevel {
    let mut sorted: Vec<&TierThreshold> = tiers.iter().collect();
    sorted.sort_by(|a, b| b.min_score.cmp(&a.min_score));

    sorted
        .into_iter()
        .find(|tier| score >= tier.min_score)
        .map(|tier| tier.level)
        .unwrap_or(RiskLevel::Low)
}

/// Per-form line of the summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    pub index: usize,
    pub action: String,
    pub method: String,
    pub xss: bool,
    pub sqli: bool,
    pub vulnerable_fields: Vec<String>,

    /// Whether the form carries an anti-CSRF token; `None` when not checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_protected: Option<bool>,

    pub error: Option<String>,
}

/// Final summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub target: String,
    pub forms_scanned: usize,
    pub vulnerable_forms: usize,
    pub forms: Vec<FormSummary>,
    pub endpoint_findings: Vec<EndpointVulnResult>,

    /// Confirmed findings per class
    pub counts: BTreeMap<VulnClass, usize>,
    pub score: u32,
    pub level: RiskLevel,
}

/// Collects results and computes the risk profile
pub struct Aggregator {
    config: ScoringConfig,
    target: String,
    check_csrf: bool,
    jobs: Vec<JobResult>,
    endpoints: Vec<EndpointVulnResult>,
}

impl Aggregator {
    pub fn new(target: &str, config: &ScoringConfig) -> Self {
        Self {
            config: config.clone(),
            target: target.to_string(),
            check_csrf: true,
            jobs: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    /// Toggle the per-form anti-CSRF token check
    pub fn with_csrf_check(mut self, enabled: bool) -> Self {
        self.check_csrf = enabled;
        self
    }

    pub fn add_jobs(&mut self, jobs: impl IntoIterator<Item = JobResult>) {
        self.jobs.extend(jobs);
    }

    pub fn add_endpoint_results(&mut self, results: impl IntoIterator<Item = EndpointVulnResult>) {
        self.endpoints.extend(results);
    }

    /// Score and tier everything collected so far.
    ///
    /// Each form counts once per class; tentative endpoint results are
    /// listed but not scored.
    pub fn profile(&self) -> RiskProfile {
        let weights = &self.config.weights;
        let mut counts: BTreeMap<VulnClass, usize> = BTreeMap::new();
        let mut score = 0u32;

        let mut jobs: Vec<&JobResult> = self.jobs.iter().collect();
        jobs.sort_by_key(|j| j.index);

        let forms: Vec<FormSummary> = jobs
            .iter()
            .map(|job| {
                if job.xss_vulnerable {
                    *counts.entry(VulnClass::Xss).or_default() += 1;
                    score += weights.weight(VulnClass::Xss);
                }
                if job.sqli_vulnerable {
                    *counts.entry(VulnClass::Sqli).or_default() += 1;
                    score += weights.weight(VulnClass::Sqli);
                }

                let mut vulnerable_fields: Vec<String> = Vec::new();
                for finding in job.findings() {
                    if !vulnerable_fields.contains(&finding.field) {
                        vulnerable_fields.push(finding.field.clone());
                    }
                }

                FormSummary {
                    index: job.index,
                    action: job.form.action.clone(),
                    method: job.form.method.to_string(),
                    xss: job.xss_vulnerable,
                    sqli: job.sqli_vulnerable,
                    vulnerable_fields,
                    csrf_protected: self.check_csrf.then(|| job.form.is_csrf_protected()),
                    error: job.error.clone(),
                }
            })
            .collect();

        for finding in self.endpoints.iter().filter(|f| f.is_confirmed()) {
            *counts.entry(finding.kind).or_default() += 1;
            score += weights.weight(finding.kind);
        }

        RiskProfile {
            target: self.target.clone(),
            forms_scanned: jobs.len(),
            vulnerable_forms: jobs.iter().filter(|j| j.is_vulnerable()).count(),
            forms,
            endpoint_findings: self.endpoints.clone(),
            counts,
            score,
            level: risk_level(score, &self.config.tiers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::scanner::detector::Verdict;
    use crate::scanner::form::{Form, FormMethod};
    use crate::scanner::payloads::{SQLI_PAYLOADS, SSRF_PAYLOADS, TRAVERSAL_PAYLOADS, XSS_PAYLOADS};
    use crate::scanner::results::DetectionResult;

    fn hit(field: &str, payload: &crate::scanner::payloads::Payload) -> DetectionResult {
        DetectionResult::new(field, payload, Verdict::confirmed("x"), &Response::default(), 500)
    }

    fn job(index: usize, xss: bool, sqli: bool) -> JobResult {
        let form = Form::new(format!("/f{}", index), FormMethod::Post, ["a", "b"]);
        let xss_results = if xss { vec![hit("a", &XSS_PAYLOADS[0])] } else { Vec::new() };
        let sqli_results = if sqli { vec![hit("b", &SQLI_PAYLOADS[0])] } else { Vec::new() };
        JobResult::new(index, form, xss_results, sqli_results)
    }

    #[test]
    fn test_one_xss_one_sqli_is_high() {
        let mut aggregator = Aggregator::new("http://t", &ScoringConfig::default());
        aggregator.add_jobs(vec![job(0, true, true), job(1, false, false)]);

        let profile = aggregator.profile();
        assert_eq!(profile.score, 5);
        assert_eq!(profile.level, RiskLevel::High);
        assert_eq!(profile.vulnerable_forms, 1);
        assert_eq!(profile.forms[0].vulnerable_fields, vec!["a", "b"]);
    }

    #[test]
    fn test_csrf_protection_per_form() {
        let guarded = Form::new("/login", FormMethod::Post, ["user", "pass", "_csrf"]);
        let mut aggregator = Aggregator::new("http://t", &ScoringConfig::default());
        aggregator.add_jobs(vec![
            JobResult::new(1, guarded, Vec::new(), Vec::new()),
            job(0, false, false),
        ]);

        let profile = aggregator.profile();
        assert_eq!(profile.forms[0].csrf_protected, Some(false));
        assert_eq!(profile.forms[1].csrf_protected, Some(true));
        // Missing tokens are reported, never scored
        assert_eq!(profile.score, 0);

        let mut unchecked = Aggregator::new("http://t", &ScoringConfig::default()).with_csrf_check(false);
        unchecked.add_jobs(vec![job(0, false, false)]);
        assert_eq!(unchecked.profile().forms[0].csrf_protected, None);
    }

    #[test]
    fn test_tiers() {
        let tiers = ScoringConfig::default().tiers;
        assert_eq!(risk_level(0, &tiers), RiskLevel::Low);
        assert_eq!(risk_level(1, &tiers), RiskLevel::Low);
        assert_eq!(risk_level(2, &tiers), RiskLevel::Medium);
        assert_eq!(risk_level(4, &tiers), RiskLevel::Medium);
        assert_eq!(risk_level(5, &tiers), RiskLevel::High);
    }

    #[test]
    fn test_single_xss_is_medium() {
        let mut aggregator = Aggregator::new("http://t", &ScoringConfig::default());
        aggregator.add_jobs(vec![job(0, true, false)]);
        assert_eq!(aggregator.profile().level, RiskLevel::Medium);
    }

    #[test]
    fn test_tentative_endpoint_results_not_scored() {
        let mut aggregator = Aggregator::new("http://t", &ScoringConfig::default());
        aggregator.add_endpoint_results(vec![
            EndpointVulnResult::from_verdict(&SSRF_PAYLOADS[0], &Verdict::tentative("fast"), "http://t"),
            EndpointVulnResult::from_verdict(&TRAVERSAL_PAYLOADS[0], &Verdict::confirmed("root:"), "http://t"),
        ]);

        let profile = aggregator.profile();
        assert_eq!(profile.score, 3);
        assert_eq!(profile.endpoint_findings.len(), 2);
        assert_eq!(profile.counts.get(&VulnClass::Ssrf), None);
        assert_eq!(profile.counts.get(&VulnClass::TraversalLfi), Some(&1));
    }
}
