//! Endpoint-level and advanced form probes

use super::detector::Detector;
use super::engine::EngineSettings;
use super::findings::EndpointVulnResult;
use super::form::Form;
use super::payloads::{payloads_for, Payload, VulnClass, LFI_PAYLOADS, LFI_PARAMS};
use super::requester::resolve_target;
use crate::http::{Request, Transport};

/// Classes probed per form beyond XSS and SQLi
pub const ADVANCED_CLASSES: &[VulnClass] = &[
    VulnClass::CommandInjection,
    VulnClass::Xxe,
    VulnClass::OpenRedirect,
    VulnClass::Ssrf,
];

/// Append a raw, unencoded parameter to a URL
fn with_raw_param(base_url: &str, name: &str, value: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base_url, separator, name, value)
}

pub struct EndpointProber<'a, T: Transport + ?Sized> {
    transport: &'a T,
    settings: &'a EngineSettings,
}

impl<'a, T: Transport + ?Sized> EndpointProber<'a, T> {
    pub fn new(transport: &'a T, settings: &'a EngineSettings) -> Self {
        Self { transport, settings }
    }

    fn detector(&self) -> &Detector {
        &self.settings.detector
    }

    /// Send one raw `param=payload` probe; `Some` on a confirmed hit
    async fn probe_once(&self, base_url: &str, param: &str, payload: &Payload) -> Option<EndpointVulnResult> {
        let target = with_raw_param(base_url, param, payload.value);
        let request = Request::new("GET", &target);

        let response = match self.transport.execute(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(param, "Endpoint probe failed: {}", e);
                return None;
            }
        };

        let verdict = self.detector().detect(payload, &response);
        if !verdict.is_confirmed() {
            return None;
        }

        tracing::info!(param, payload = payload.value, "File disclosure via {}", target);
        Some(EndpointVulnResult::from_verdict(payload, &verdict, &target).with_parameter(param))
    }

    async fn pause(&self) {
        if !self.settings.probe_delay.is_zero() {
            tokio::time::sleep(self.settings.probe_delay).await;
        }
    }

    /// Every traversal payload through `?file=` on the base URL
    pub async fn probe_traversal(&self, base_url: &str) -> Vec<EndpointVulnResult> {
        let mut results = Vec::new();
        for payload in payloads_for(VulnClass::TraversalLfi) {
            if let Some(finding) = self.probe_once(base_url, "file", payload).await {
                results.push(finding);
            }
            self.pause().await;
        }
        results
    }

    /// LFI payloads through each common file parameter; at most one hit per parameter
    pub async fn probe_lfi(&self, base_url: &str) -> Vec<EndpointVulnResult> {
        let mut results = Vec::new();
        for param in LFI_PARAMS {
            for payload in LFI_PAYLOADS {
                if let Some(finding) = self.probe_once(base_url, param, payload).await {
                    results.push(finding);
                    break;
                }
                self.pause().await;
            }
        }
        results
    }

    /// Command injection, XXE, open redirect and SSRF sweeps over one form
    pub async fn probe_form_advanced(&self, form: &Form, base_url: &str) -> Vec<EndpointVulnResult> {
        let sweeper = self.settings.sweeper(self.transport);
        let target = resolve_target(&form.action, base_url);
        let mut results = Vec::new();

        for class in ADVANCED_CLASSES {
            let hits = sweeper.sweep_form(form, base_url, *class).await;
            results.extend(
                hits.iter()
                    .filter(|r| r.vulnerable)
                    .map(|r| EndpointVulnResult::from_detection(r, &target)),
            );
        }

        results
    }
}
