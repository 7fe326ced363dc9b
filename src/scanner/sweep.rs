//! Field sweeps: every payload of a class against every field of a form

use std::time::Duration;

use super::detector::Detector;
use super::form::Form;
use super::mutator;
use super::payloads::{payloads_for, Payload, VulnClass};
use super::requester;
use super::results::DetectionResult;
use crate::http::Transport;

/// Runs payload sweeps for one form at a time
pub struct Sweeper<'a, T: Transport + ?Sized> {
    transport: &'a T,
    detector: &'a Detector,
    probe_delay: Duration,
    excerpt_len: usize,
}

impl<'a, T: Transport + ?Sized> Sweeper<'a, T> {
    pub fn new(transport: &'a T, detector: &'a Detector, probe_delay: Duration, excerpt_len: usize) -> Self {
        Self {
            transport,
            detector,
            probe_delay,
            excerpt_len,
        }
    }

    /// Sweep every field of `form` with the catalog for `class`
    pub async fn sweep_form(&self, form: &Form, base_url: &str, class: VulnClass) -> Vec<DetectionResult> {
        let mut results = Vec::new();
        for field in &form.fields {
            results.extend(self.sweep_field(form, base_url, field, payloads_for(class)).await);
        }
        results
    }

    /// Try `payloads` in order against one field.
    ///
    /// Stops at the first confirmed hit. Probes that fail at the transport
    /// level leave no result.
    pub async fn sweep_field(
        &self,
        form: &Form,
        base_url: &str,
        field: &str,
        payloads: &[Payload],
    ) -> Vec<DetectionResult> {
        let mut results = Vec::new();

        for (i, payload) in payloads.iter().enumerate() {
            if i > 0 && !self.probe_delay.is_zero() {
                tokio::time::sleep(self.probe_delay).await;
            }

            let params = match mutator::build(form, field, payload.value) {
                Ok(params) => params,
                Err(e) => {
                    tracing::warn!("Skipping field sweep: {}", e);
                    break;
                }
            };

            let follow_redirects = payload.class != VulnClass::OpenRedirect;
            let response = match requester::send(self.transport, form, base_url, params, follow_redirects).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(field, payload = payload.value, "Probe failed: {}", e);
                    continue;
                }
            };

            let verdict = self.detector.detect(payload, &response);
            let confirmed = verdict.is_confirmed();
            if verdict.vulnerable {
                tracing::info!(
                    class = payload.class.as_str(),
                    field,
                    payload = payload.value,
                    tentative = verdict.tentative,
                    "Potential vulnerability"
                );
            }

            results.push(DetectionResult::new(field, payload, verdict, &response, self.excerpt_len));

            if confirmed {
                break;
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::http::{Request, Response};
    use crate::scanner::form::FormMethod;
    use crate::scanner::mutator::PLACEHOLDER;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Reflects a query parameter back, or fails every call
    struct Reflector {
        reflect: Option<&'static str>,
        calls: AtomicUsize,
        seen: Mutex<Vec<Request>>,
    }

    impl Reflector {
        fn new(reflect: Option<&'static str>) -> Self {
            Self {
                reflect,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for Reflector {
        async fn execute(&self, request: &Request) -> Result<Response, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            let Some(name) = self.reflect else {
                return Err(HttpError::RequestFailed("connection refused".into()));
            };
            let body = request.param(name).unwrap_or_default().to_string();
            Ok(Response {
                status: 200,
                body: body.into_bytes(),
                ..Default::default()
            })
        }
    }

    fn form() -> Form {
        Form::new("/search", FormMethod::Get, ["q", "lang"])
    }

    #[tokio::test]
    async fn test_first_match_wins_per_field() {
        let transport = Reflector::new(Some("q"));
        let detector = Detector::default();
        let sweeper = Sweeper::new(&transport, &detector, Duration::ZERO, 500);

        let results = sweeper.sweep_form(&form(), "http://site.test", VulnClass::Xss).await;

        let q: Vec<_> = results.iter().filter(|r| r.field == "q").collect();
        assert_eq!(q.len(), 1);
        assert!(q[0].vulnerable);

        // The reflected field stopping early must not stop the next field
        let lang: Vec<_> = results.iter().filter(|r| r.field == "lang").collect();
        assert_eq!(lang.len(), payloads_for(VulnClass::Xss).len());
        assert!(lang.iter().all(|r| !r.vulnerable));

        // One request for the hit on `q`, then the full catalog on `lang`
        assert_eq!(
            transport.calls.load(Ordering::SeqCst),
            1 + payloads_for(VulnClass::Xss).len()
        );
    }

    #[tokio::test]
    async fn test_other_fields_hold_placeholder_across_sweep() {
        let transport = Reflector::new(Some("unused"));
        let detector = Detector::default();
        let sweeper = Sweeper::new(&transport, &detector, Duration::ZERO, 500);
        let form = Form::new("/search", FormMethod::Get, ["q", "lang", "page"]);

        let results = sweeper.sweep_form(&form, "http://site.test", VulnClass::Sqli).await;
        assert!(results.iter().all(|r| !r.vulnerable));

        let payloads = payloads_for(VulnClass::Sqli);
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), form.fields.len() * payloads.len());

        for (i, request) in seen.iter().enumerate() {
            let target = &form.fields[i / payloads.len()];
            let payload = payloads[i % payloads.len()].value;

            let names: Vec<_> = request.params.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(names, vec!["q", "lang", "page"]);
            for (name, value) in &request.params {
                if name == target {
                    assert_eq!(value, payload);
                } else {
                    assert_eq!(value, PLACEHOLDER, "request {} field {}", i, name);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_transport_errors_are_skipped() {
        let transport = Reflector::new(None);
        let detector = Detector::default();
        let sweeper = Sweeper::new(&transport, &detector, Duration::ZERO, 500);

        let results = sweeper.sweep_form(&form(), "http://site.test", VulnClass::Xss).await;

        assert!(results.is_empty());
        assert_eq!(
            transport.calls.load(Ordering::SeqCst),
            2 * payloads_for(VulnClass::Xss).len()
        );
    }
}
