//! Run configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::scanner::{RiskLevel, VulnClass};

/// Allowed worker range, inclusive
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 20;

/// Main run configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub scanner: ScannerConfig,

    /// Detector thresholds
    pub detection: DetectionConfig,

    /// Risk scoring weights and tiers
    pub scoring: ScoringConfig,

    /// Optional form login before scanning
    pub login: LoginConfig,

    /// Which probe families to run
    pub checks: CheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of pool workers
    pub workers: usize,

    /// Per-request transport timeout in seconds
    pub request_timeout_secs: u64,

    /// Delay around each job phase in milliseconds
    pub rate_limit_ms: u64,

    /// Delay between consecutive probes inside a sweep in milliseconds
    pub probe_delay_ms: u64,

    /// Maximum redirect depth for the following client
    pub max_redirects: usize,

    /// User agent string
    pub user_agent: String,

    /// Form counts at or below this run without a pool
    pub sequential_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Elapsed time above which a time-strategy SQLi probe is confirmed
    pub sqli_time_threshold_ms: u64,

    /// Elapsed time below which an SSRF probe is flagged (weak signal)
    pub ssrf_fast_response_ms: u64,

    /// Maximum characters kept in a response excerpt
    pub excerpt_len: usize,

    /// Bytes of the body inspected by endpoint-level probes
    pub body_read_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight added per confirmed finding of each class
    pub weights: ClassWeights,

    /// Tier thresholds; the highest `min_score` not above the total wins
    pub tiers: Vec<TierThreshold>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassWeights {
    pub xss: u32,
    pub sqli: u32,
    pub traversal_lfi: u32,
    pub command_injection: u32,
    pub xxe: u32,
    pub open_redirect: u32,
    pub ssrf: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min_score: u32,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginConfig {
    pub enabled: bool,
    pub url: String,
    pub user_field: String,
    pub pass_field: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub xss: bool,
    pub sqli: bool,
    /// Report whether each form carries an anti-CSRF token
    pub csrf: bool,
    /// Endpoint-level and advanced form probes
    pub advanced: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            request_timeout_secs: 30,
            rate_limit_ms: 100,
            probe_delay_ms: 50,
            max_redirects: 10,
            user_agent: format!("formprobe/{}", env!("CARGO_PKG_VERSION")),
            sequential_threshold: 2,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sqli_time_threshold_ms: 4000,
            ssrf_fast_response_ms: 100,
            excerpt_len: 500,
            body_read_limit: 8192,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ClassWeights::default(),
            tiers: vec![
                TierThreshold { min_score: 5, level: RiskLevel::High },
                TierThreshold { min_score: 2, level: RiskLevel::Medium },
            ],
        }
    }
}

impl Default for ClassWeights {
    fn default() -> Self {
        Self {
            xss: 2,
            sqli: 3,
            traversal_lfi: 3,
            command_injection: 3,
            xxe: 3,
            open_redirect: 1,
            ssrf: 3,
        }
    }
}

impl ClassWeights {
    pub fn weight(&self, class: VulnClass) -> u32 {
        match class {
            VulnClass::Xss => self.xss,
            VulnClass::Sqli => self.sqli,
            VulnClass::TraversalLfi => self.traversal_lfi,
            VulnClass::CommandInjection => self.command_injection,
            VulnClass::Xxe => self.xxe,
            VulnClass::OpenRedirect => self.open_redirect,
            VulnClass::Ssrf => self.ssrf,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            xss: true,
            sqli: true,
            csrf: true,
            advanced: false,
        }
    }
}

impl ScannerConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(ConfigError::ReadError {
                    path: config_path.display().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            tracing::info!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::ReadError {
            path: config_path.display().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Get default configuration file path
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "formprobe", "formprobe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check the run configuration before the engine starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let workers = self.scanner.workers;
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(ConfigError::ValidationError {
                field: "scanner.workers".into(),
                reason: format!("must be between {} and {}, got {}", MIN_WORKERS, MAX_WORKERS, workers),
            });
        }

        if self.scanner.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                field: "scanner.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.scoring.tiers.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "scoring.tiers".into(),
                reason: "at least one tier threshold is required".into(),
            });
        }

        if self.login.enabled {
            let login = &self.login;
            let required = [
                ("login.url", &login.url),
                ("login.user_field", &login.user_field),
                ("login.pass_field", &login.pass_field),
                ("login.username", &login.username),
                ("login.password", &login.password),
            ];
            for (field, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingField(field.to_string()));
                }
            }
            validate_target_url(&login.url).map_err(|e| ConfigError::ValidationError {
                field: "login.url".into(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Validate, then rewrite values the engine consumes into normalized form
    pub fn prepare(&mut self) -> Result<(), ConfigError> {
        self.validate()?;

        if self.login.enabled {
            self.login.url = validate_target_url(&self.login.url).map_err(|e| ConfigError::ValidationError {
                field: "login.url".into(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

/// Normalize and validate a target URL; scheme-less input is treated as http
pub fn validate_target_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "url".into(),
            reason: "cannot be empty".into(),
        });
    }

    let lower = raw.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else if raw.contains("://") {
        return Err(ConfigError::ValidationError {
            field: "url".into(),
            reason: "only http and https are supported".into(),
        });
    } else {
        format!("http://{}", raw)
    };

    let parsed = url::Url::parse(&candidate).map_err(|e| ConfigError::ValidationError {
        field: "url".into(),
        reason: e.to_string(),
    })?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::ValidationError {
            field: "url".into(),
            reason: "host cannot be empty".into(),
        });
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.workers, 5);
        assert_eq!(config.detection.sqli_time_threshold_ms, 4000);
        assert_eq!(config.scoring.weights.weight(VulnClass::Xss), 2);
        assert_eq!(config.scoring.weights.weight(VulnClass::Sqli), 3);
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = Config::default();
        config.scanner.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError { .. })));

        config.scanner.workers = 21;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError { .. })));

        config.scanner.workers = 20;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_login_requires_every_field() {
        let mut config = Config::default();
        config.login = LoginConfig {
            enabled: true,
            url: "http://example.com/login".into(),
            user_field: "user".into(),
            pass_field: "pass".into(),
            username: "admin".into(),
            password: String::new(),
        };

        match config.validate() {
            Err(ConfigError::MissingField(field)) => assert_eq!(field, "login.password"),
            other => panic!("expected missing field, got {:?}", other),
        }

        config.login.password = "secret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_target_url() {
        assert_eq!(validate_target_url("example.com").unwrap(), "http://example.com/");
        assert_eq!(
            validate_target_url("https://example.com/app").unwrap(),
            "https://example.com/app"
        );
        assert_eq!(validate_target_url("HTTP://Example.com/a").unwrap(), "http://example.com/a");
        assert_eq!(validate_target_url("HttpS://example.com").unwrap(), "https://example.com/");
        assert!(validate_target_url("ftp://example.com").is_err());
        assert!(validate_target_url("FTP://example.com").is_err());

        match validate_target_url("  ") {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "url"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    fn login(url: &str) -> LoginConfig {
        LoginConfig {
            enabled: true,
            url: url.into(),
            user_field: "user".into(),
            pass_field: "pass".into(),
            username: "admin".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_prepare_normalizes_login_url() {
        let mut config = Config::default();
        config.login = login("localhost:8080/login");
        config.prepare().unwrap();
        assert_eq!(config.login.url, "http://localhost:8080/login");

        config.login = login("127.0.0.1:8080/login");
        config.prepare().unwrap();
        assert_eq!(config.login.url, "http://127.0.0.1:8080/login");
    }

    #[test]
    fn test_prepare_leaves_disabled_login_alone() {
        let mut config = Config::default();
        config.login.url = "not checked".into();
        config.prepare().unwrap();
        assert_eq!(config.login.url, "not checked");
    }

    #[test]
    fn test_prepare_rejects_bad_login_url() {
        let mut config = Config::default();
        config.login = login("gopher://example.com/login");
        match config.prepare() {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "login.url"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[scanner]
workers = 3
rate_limit_ms = 0

[scoring]
tiers = [{{ min_score = 10, level = "high" }}]
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.scanner.workers, 3);
        assert_eq!(config.scanner.rate_limit_ms, 0);
        assert_eq!(config.scanner.request_timeout_secs, 30);
        assert_eq!(config.scoring.tiers.len(), 1);
        assert_eq!(config.scoring.tiers[0].level, RiskLevel::High);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some("/nonexistent/formprobe.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
