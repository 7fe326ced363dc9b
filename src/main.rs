//! formprobe - concurrent form vulnerability probing
//!
//! Fetches a page, extracts its forms and probes every field, then prints a
//! risk summary.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::{Color, Stylize};
use tokio::signal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formprobe::app::{validate_target_url, Config};
use formprobe::http::HttpClient;
use formprobe::scanner::{
    parse_forms, scan_forms, Aggregator, EndpointProber, EngineSettings, RiskLevel, RiskProfile, Severity,
};
use formprobe::{session, FormprobeError};

/// Concurrent form vulnerability prober
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about = "Concurrent form vulnerability prober", long_about = None)]
struct Cli {
    /// Target page URL
    #[arg(short, long, env = "FORMPROBE_URL", required_unless_present_any = ["generate_config", "validate_config"])]
    url: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "FORMPROBE_CONFIG")]
    config: Option<String>,

    /// Number of concurrent workers (1-20)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Delay between job phases in milliseconds
    #[arg(long)]
    rate_limit: Option<u64>,

    /// Login form URL (enables login)
    #[arg(long)]
    login_url: Option<String>,

    /// Login username field name
    #[arg(long)]
    login_user_field: Option<String>,

    /// Login password field name
    #[arg(long)]
    login_pass_field: Option<String>,

    /// Login username
    #[arg(long)]
    login_username: Option<String>,

    /// Login password
    #[arg(long, env = "FORMPROBE_LOGIN_PASSWORD")]
    login_password: Option<String>,

    /// Also run command injection, XXE, open redirect, SSRF and file probes
    #[arg(long)]
    advanced: bool,

    /// Skip the per-form anti-CSRF token check
    #[arg(long)]
    no_csrf: bool,

    /// Write the risk profile as JSON to this file
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FORMPROBE_LOG_LEVEL")]
    log_level: String,

    /// Log file path (logs go to stderr otherwise)
    #[arg(long, env = "FORMPROBE_LOG_FILE")]
    log_file: Option<String>,

    /// Enable JSON structured logging
    #[arg(long, env = "FORMPROBE_LOG_JSON")]
    log_json: bool,

    /// Disable coloured output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Generate default configuration and exit
    #[arg(long)]
    generate_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        return generate_default_config();
    }

    init_logging(&cli)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting formprobe");

    let config = load_config(&cli)?;

    if cli.validate_config {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    let raw_url = cli.url.as_deref().unwrap_or_default();
    let target = validate_target_url(raw_url).map_err(|e| anyhow::anyhow!(FormprobeError::from(e).user_message()))?;

    run_until_interrupted(run_scan(&cli, config, target), signal::ctrl_c()).await
}

/// Drive `scan` to completion unless `interrupt` fires first
async fn run_until_interrupted<S, I, T>(scan: S, interrupt: I) -> Result<()>
where
    S: Future<Output = Result<()>>,
    I: Future<Output = T>,
{
    tokio::select! {
        result = scan => result,
        _ = interrupt => {
            tracing::warn!("Interrupted, abandoning scan");
            Err(anyhow::anyhow!("Scan interrupted"))
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_path) = &cli.log_file {
        let path = Path::new(log_path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("formprobe.log");
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;
        let file_appender = tracing_appender::rolling::never(dir, filename);

        if cli.log_json {
            subscriber
                .with(fmt::layer().json().with_writer(file_appender).with_ansi(false))
                .init();
        } else {
            subscriber
                .with(fmt::layer().with_writer(file_appender).with_ansi(false))
                .init();
        }
    } else if cli.log_json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(!cli.no_color))
            .init();
    }

    Ok(())
}

/// Load configuration with CLI overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!(FormprobeError::from(e).user_message()))?;

    if let Some(workers) = cli.workers {
        config.scanner.workers = workers;
    }
    if let Some(timeout) = cli.timeout {
        config.scanner.request_timeout_secs = timeout;
    }
    if let Some(rate_limit) = cli.rate_limit {
        config.scanner.rate_limit_ms = rate_limit;
    }
    if cli.advanced {
        config.checks.advanced = true;
    }
    if cli.no_csrf {
        config.checks.csrf = false;
    }

    if let Some(url) = &cli.login_url {
        let login = &mut config.login;
        login.enabled = true;
        login.url = url.clone();
        let overrides = [
            (&mut login.user_field, &cli.login_user_field),
            (&mut login.pass_field, &cli.login_pass_field),
            (&mut login.username, &cli.login_username),
            (&mut login.password, &cli.login_password),
        ];
        for (slot, value) in overrides {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }

    config
        .prepare()
        .map_err(|e| anyhow::anyhow!(FormprobeError::from(e).user_message()))?;

    Ok(config)
}

/// Generate default configuration file
fn generate_default_config() -> Result<()> {
    let config = Config::default();
    let toml = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

    println!("{}", toml);
    Ok(())
}

/// Fetch the target, scan its forms and report
async fn run_scan(cli: &Cli, config: Config, target: String) -> Result<()> {
    let client = Arc::new(HttpClient::new(&config.scanner).map_err(FormprobeError::from)?);

    if config.login.enabled {
        session::login(client.as_ref(), &config.login)
            .await
            .map_err(|e| anyhow::anyhow!(FormprobeError::from(e).user_message()))?;
    }

    let page = client
        .get(&target)
        .await
        .map_err(|e| anyhow::anyhow!(FormprobeError::from(e).user_message()))?;
    if !page.is_success() {
        tracing::warn!(status = page.status, "Target page did not answer with 2xx");
    }

    let forms = parse_forms(&page.body_text());
    tracing::info!(forms = forms.len(), url = %target, "Forms discovered");

    let settings = EngineSettings::from_config(&config);
    let results = scan_forms(client.clone(), &forms, &target, settings.clone()).await;

    let mut aggregator = Aggregator::new(&target, &config.scoring).with_csrf_check(config.checks.csrf);
    aggregator.add_jobs(results);

    if config.checks.advanced {
        let prober = EndpointProber::new(client.as_ref(), &settings);
        aggregator.add_endpoint_results(prober.probe_traversal(&target).await);
        aggregator.add_endpoint_results(prober.probe_lfi(&target).await);
        for form in &forms {
            aggregator.add_endpoint_results(prober.probe_form_advanced(form, &target).await);
        }
    }

    let profile = aggregator.profile();
    print_summary(&profile, !cli.no_color);

    if let Some(path) = &cli.json_out {
        let json = serde_json::to_string_pretty(&profile).context("Failed to serialize risk profile")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::info!("Risk profile written to {:?}", path);
    }

    Ok(())
}

fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.with(color).bold().to_string()
    } else {
        text.to_string()
    }
}

fn level_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::Red,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::Green,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical | Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
    }
}

fn print_summary(profile: &RiskProfile, color: bool) {
    println!();
    println!("Target: {}", profile.target);
    println!(
        "Forms scanned: {}  vulnerable: {}",
        profile.forms_scanned, profile.vulnerable_forms
    );

    for form in &profile.forms {
        let mut flags = Vec::new();
        if form.xss {
            flags.push(paint("XSS", Color::Red, color));
        }
        if form.sqli {
            flags.push(paint("SQLi", Color::Red, color));
        }
        let status = match (&form.error, flags.is_empty()) {
            (Some(err), _) => paint(&format!("error: {}", err), Color::Magenta, color),
            (None, true) => paint("clean", Color::Green, color),
            (None, false) => flags.join(" "),
        };
        let action = if form.action.is_empty() { "(self)" } else { form.action.as_str() };
        let csrf = match form.csrf_protected {
            Some(true) => format!("  csrf: {}", paint("token", Color::Green, color)),
            Some(false) => format!("  csrf: {}", paint("missing", Color::Yellow, color)),
            None => String::new(),
        };
        println!("  #{} {} {} -> {}{}", form.index, form.method, action, status, csrf);
        if !form.vulnerable_fields.is_empty() {
            println!("      fields: {}", form.vulnerable_fields.join(", "));
        }
    }

    let findings: Vec<_> = profile.endpoint_findings.iter().filter(|f| f.vulnerable).collect();
    if !findings.is_empty() {
        println!("Additional findings:");
        for finding in findings {
            let severity = paint(finding.severity.as_str(), severity_color(finding.severity), color);
            let tentative = if finding.tentative { " (tentative)" } else { "" };
            println!(
                "  [{}] {}{} at {} via {}: {}",
                severity,
                finding.kind,
                tentative,
                finding.target,
                finding.parameter.as_deref().unwrap_or("-"),
                finding.evidence
            );
        }
    }

    println!(
        "Risk score: {}  level: {}",
        profile.score,
        paint(&profile.level.to_string(), level_color(profile.level), color)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_needs_no_url() {
        let cli = Cli::try_parse_from(["formprobe", "--validate-config"]).unwrap();
        assert!(cli.validate_config);
        assert!(cli.url.is_none());

        assert!(Cli::try_parse_from(["formprobe", "--generate-config"]).is_ok());
    }

    #[test]
    fn test_scan_needs_url() {
        std::env::remove_var("FORMPROBE_URL");
        assert!(Cli::try_parse_from(["formprobe", "--workers", "3"]).is_err());
    }

    #[tokio::test]
    async fn test_interrupt_is_an_error() {
        let result = run_until_interrupted(std::future::pending::<Result<()>>(), async {}).await;
        assert!(result.is_err());

        let result = run_until_interrupted(async { Ok(()) }, std::future::pending::<()>()).await;
        assert!(result.is_ok());
    }
}
