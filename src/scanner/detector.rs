//! Response heuristics, one per vulnerability class
//!
//! Every detector is a pure function of the response and the payload that
//! produced it. `Detector` bundles the configured thresholds and dispatches
//! on the payload's class.

use std::time::Duration;

use super::payloads::{Payload, Strategy, VulnClass};
use crate::app::DetectionConfig;
use crate::http::Response;

/// Database error fingerprints, lowercase
const SQL_ERROR_FINGERPRINTS: &[(&str, &str)] = &[
    ("you have an error in your sql syntax", "MySQL"),
    ("warning: mysql", "MySQL"),
    ("mysql_fetch", "MySQL"),
    ("mysql_num_rows", "MySQL"),
    ("mysql error", "MySQL"),
    ("supplied argument is not a valid mysql", "MySQL"),
    ("pg_query", "PostgreSQL"),
    ("pg_exec", "PostgreSQL"),
    ("postgresql", "PostgreSQL"),
    ("warning: pg", "PostgreSQL"),
    ("pgsql", "PostgreSQL"),
    ("unterminated quoted string", "PostgreSQL"),
    ("microsoft ole db provider for sql server", "MSSQL"),
    ("sqlstate", "MSSQL"),
    ("odbc sql server driver", "MSSQL"),
    ("microsoft sql native client", "MSSQL"),
    ("sql server", "MSSQL"),
    ("ora-01756", "Oracle"),
    ("ora-00933", "Oracle"),
    ("oracle error", "Oracle"),
    ("ora-", "Oracle"),
    ("sqlite_", "SQLite"),
    ("sqlite error", "SQLite"),
    ("sqliteexception", "SQLite"),
    ("unexpected end of sql command", "Generic"),
    ("quoted string not properly terminated", "Generic"),
    ("syntax error", "Generic"),
    ("sql syntax", "Generic"),
    ("database error", "Generic"),
    ("query failed", "Generic"),
];

/// Markers of system file contents
const FILE_FINGERPRINTS: &[&str] = &["root:", "/bin/bash", "[extensions]", "for 16-bit app support"];

/// Markers of shell command output
const SHELL_FINGERPRINTS: &[&str] = &[
    "uid=",
    "gid=",
    "drwx",
    "[extensions]",
    "Volume Serial Number",
    "Directory of",
];

/// Markers of a resolved external entity
const XXE_FINGERPRINTS: &[&str] = &["root:", "/bin/bash"];

/// Markers of cloud metadata or local file contents
const METADATA_FINGERPRINTS: &[&str] = &["ami-id", "instance-id", "root:"];

/// Outcome of inspecting one response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub vulnerable: bool,

    /// Weak signal only; reported but never scored
    pub tentative: bool,

    pub indicator: Option<String>,
}

impl Verdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn confirmed(indicator: impl Into<String>) -> Self {
        Self {
            vulnerable: true,
            tentative: false,
            indicator: Some(indicator.into()),
        }
    }

    pub fn tentative(indicator: impl Into<String>) -> Self {
        Self {
            vulnerable: true,
            tentative: true,
            indicator: Some(indicator.into()),
        }
    }

    /// A confirmed hit ends the sweep of the current field
    pub fn is_confirmed(&self) -> bool {
        self.vulnerable && !self.tentative
    }
}

/// Reflected payload: verbatim, case-folded, or with swapped quote style
pub fn detect_xss(body: &str, payload: &str) -> Verdict {
    if body.contains(payload) {
        return Verdict::confirmed(payload);
    }

    let body_lower = body.to_lowercase();
    let variants = [
        payload.to_string(),
        payload.replace('\'', "\""),
        payload.replace('"', "'"),
    ];

    for variant in variants {
        if body_lower.contains(&variant.to_lowercase()) {
            return Verdict::confirmed(variant);
        }
    }

    Verdict::clean()
}

/// Slow response for time-based payloads, else a database error fingerprint
pub fn detect_sqli(body: &str, elapsed: Duration, strategy: Option<Strategy>, time_threshold: Duration) -> Verdict {
    if strategy == Some(Strategy::Time) && elapsed > time_threshold {
        return Verdict::confirmed(format!("Time delay detected: {:?}", elapsed));
    }

    let body_lower = body.to_lowercase();
    for (fingerprint, _engine) in SQL_ERROR_FINGERPRINTS {
        if body_lower.contains(fingerprint) {
            return Verdict::confirmed(*fingerprint);
        }
    }

    Verdict::clean()
}

fn first_marker(body: &str, markers: &[&str]) -> Verdict {
    markers
        .iter()
        .find(|marker| body.contains(*marker))
        .map(|marker| Verdict::confirmed(*marker))
        .unwrap_or_default()
}

pub fn detect_traversal(body: &str) -> Verdict {
    first_marker(body, FILE_FINGERPRINTS)
}

pub fn detect_command_injection(body: &str) -> Verdict {
    first_marker(body, SHELL_FINGERPRINTS)
}

pub fn detect_xxe(body: &str) -> Verdict {
    first_marker(body, XXE_FINGERPRINTS)
}

/// Only a 3xx whose Location points at the payload's external host counts
pub fn detect_open_redirect(status: u16, location: Option<&str>, payload: &Payload) -> Verdict {
    if !(300..400).contains(&status) {
        return Verdict::clean();
    }

    let Some(location) = location else {
        return Verdict::clean();
    };

    let needle = payload.external_host().unwrap_or(payload.value);
    if location.contains(needle) {
        Verdict::confirmed(format!("Location: {}", location))
    } else {
        Verdict::clean()
    }
}

/// Metadata fingerprints confirm; an unusually fast answer is only tentative
pub fn detect_ssrf(body: &str, elapsed: Duration, fast_threshold: Duration) -> Verdict {
    let verdict = first_marker(body, METADATA_FINGERPRINTS);
    if verdict.vulnerable {
        return verdict;
    }

    if elapsed < fast_threshold {
        return Verdict::tentative(format!("Fast response: {:?}", elapsed));
    }

    Verdict::clean()
}

/// Configured detector set
#[derive(Debug, Clone)]
pub struct Detector {
    sqli_time_threshold: Duration,
    ssrf_fast_response: Duration,
    body_read_limit: usize,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl Detector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            sqli_time_threshold: Duration::from_millis(config.sqli_time_threshold_ms),
            ssrf_fast_response: Duration::from_millis(config.ssrf_fast_response_ms),
            body_read_limit: config.body_read_limit,
        }
    }

    /// Inspect `response` for the class of `payload`
    pub fn detect(&self, payload: &Payload, response: &Response) -> Verdict {
        match payload.class {
            VulnClass::Xss => detect_xss(&response.body_text(), payload.value),
            VulnClass::Sqli => detect_sqli(
                &response.body_text(),
                response.elapsed,
                payload.strategy,
                self.sqli_time_threshold,
            ),
            VulnClass::TraversalLfi => detect_traversal(&response.body_prefix(self.body_read_limit)),
            VulnClass::CommandInjection => {
                detect_command_injection(&response.body_prefix(self.body_read_limit))
            }
            VulnClass::Xxe => detect_xxe(&response.body_prefix(self.body_read_limit)),
            VulnClass::OpenRedirect => detect_open_redirect(response.status, response.location(), payload),
            VulnClass::Ssrf => detect_ssrf(
                &response.body_prefix(self.body_read_limit),
                response.elapsed,
                self.ssrf_fast_response,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::payloads::{OPEN_REDIRECT_PAYLOADS, SQLI_PAYLOADS, XSS_PAYLOADS};

    const THRESHOLD: Duration = Duration::from_millis(4000);

    #[test]
    fn test_xss_verbatim_reflection() {
        let payload = XSS_PAYLOADS[0].value;
        let body = format!("<p>You searched for {}</p>", payload);
        let verdict = detect_xss(&body, payload);
        assert!(verdict.is_confirmed());
        assert_eq!(verdict.indicator.as_deref(), Some(payload));
    }

    #[test]
    fn test_xss_case_folded_reflection() {
        let body = "<p><SCRIPT>ALERT('XSS')</SCRIPT></p>";
        assert!(detect_xss(body, "<script>alert('XSS')</script>").vulnerable);
    }

    #[test]
    fn test_xss_quote_variant() {
        let body = r#"<img src=x onerror=alert("XSS")>"#;
        let verdict = detect_xss(body, "<img src=x onerror=alert('XSS')>");
        assert!(verdict.vulnerable);
        assert_eq!(verdict.indicator.as_deref(), Some(r#"<img src=x onerror=alert("XSS")>"#));
    }

    #[test]
    fn test_xss_encoded_output_is_clean() {
        let body = "&lt;script&gt;alert('XSS')&lt;/script&gt;";
        assert!(!detect_xss(body, "<script>alert('XSS')</script>").vulnerable);
    }

    #[test]
    fn test_sqli_time_strategy() {
        let slow = detect_sqli("", Duration::from_millis(5200), Some(Strategy::Time), THRESHOLD);
        assert!(slow.vulnerable);
        assert!(slow.indicator.unwrap().starts_with("Time delay detected"));

        let fast = detect_sqli("ok", Duration::from_millis(30), Some(Strategy::Time), THRESHOLD);
        assert!(!fast.vulnerable);
    }

    #[test]
    fn test_slow_response_ignored_for_other_strategies() {
        let verdict = detect_sqli("ok", Duration::from_secs(6), Some(Strategy::Boolean), THRESHOLD);
        assert!(!verdict.vulnerable);
    }

    #[test]
    fn test_sqli_error_fingerprint_is_case_insensitive() {
        let body = "Fatal: You have an error in your SQL syntax near ''' at line 1";
        let verdict = detect_sqli(body, Duration::ZERO, Some(Strategy::Error), THRESHOLD);
        assert_eq!(verdict.indicator.as_deref(), Some("you have an error in your sql syntax"));
    }

    #[test]
    fn test_file_and_shell_markers() {
        assert!(detect_traversal("root:x:0:0:root:/root:/bin/bash").vulnerable);
        assert!(detect_traversal("; for 16-bit app support\n[fonts]").vulnerable);
        assert!(!detect_traversal("<html>not found</html>").vulnerable);

        assert!(detect_command_injection("uid=33(www-data) gid=33(www-data)").vulnerable);
        assert!(detect_command_injection(" Volume Serial Number is 1234").vulnerable);
        assert!(!detect_command_injection("hello").vulnerable);

        assert!(detect_xxe("<data>root:x:0:0</data>").vulnerable);
    }

    #[test]
    fn test_open_redirect_requires_3xx() {
        let payload = &OPEN_REDIRECT_PAYLOADS[0];
        assert!(detect_open_redirect(302, Some("https://evil.com/"), payload).vulnerable);
        assert!(!detect_open_redirect(200, Some("https://evil.com/"), payload).vulnerable);
        assert!(!detect_open_redirect(302, Some("/dashboard"), payload).vulnerable);
        assert!(!detect_open_redirect(302, None, payload).vulnerable);
    }

    #[test]
    fn test_ssrf_signals() {
        let fast = Duration::from_millis(100);
        assert!(detect_ssrf("ami-id\ninstance-id", Duration::from_secs(1), fast).is_confirmed());

        let weak = detect_ssrf("ok", Duration::from_millis(5), fast);
        assert!(weak.vulnerable);
        assert!(weak.tentative);

        assert!(!detect_ssrf("ok", Duration::from_millis(500), fast).vulnerable);
    }

    #[test]
    fn test_detector_dispatches_by_class() {
        let detector = Detector::default();
        let time_payload = SQLI_PAYLOADS
            .iter()
            .find(|p| p.strategy == Some(Strategy::Time))
            .unwrap();

        let response = Response {
            status: 200,
            elapsed: Duration::from_millis(5100),
            ..Default::default()
        };
        assert!(detector.detect(time_payload, &response).vulnerable);
        assert!(!detector.detect(&XSS_PAYLOADS[0], &response).vulnerable);
    }
}
