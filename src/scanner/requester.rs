//! Turns a form plus parameter set into an HTTP request

use url::Url;

use super::form::{Form, FormMethod};
use super::mutator::ParameterSet;
use crate::error::HttpError;
use crate::http::{Request, Response, Transport};

/// Resolve a form action against the page URL it was found on.
///
/// * absolute action: used verbatim
/// * action starting with `/`: joined to the scheme and authority of `base_url`
/// * empty action or `#`: the page itself
/// * anything else: appended to `base_url` with a `/`
pub fn resolve_target(action: &str, base_url: &str) -> String {
    let action = action.trim();

    if has_scheme(action) {
        return action.to_string();
    }

    if action.starts_with('/') {
        return match Url::parse(base_url) {
            Ok(base) => format!("{}{}", base.origin().ascii_serialization(), action),
            Err(_) => base_url.to_string(),
        };
    }

    if action.is_empty() || action == "#" {
        return base_url.to_string();
    }

    format!("{}/{}", base_url.trim_end_matches('/'), action)
}

fn has_scheme(action: &str) -> bool {
    match action.find("://") {
        Some(idx) if idx > 0 => {
            let scheme = &action[..idx];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Build the submission for `form`: query string for GET, form body for POST
pub fn build_request(form: &Form, base_url: &str, params: ParameterSet) -> Request {
    let target = resolve_target(&form.action, base_url);

    match form.method {
        FormMethod::Get => Request::builder().method("GET").url(&target).params(params).build(),
        FormMethod::Post => Request::builder().method("POST").url(&target).form(&params).build(),
    }
}

/// Submit one parameter set
pub async fn send<T: Transport + ?Sized>(
    transport: &T,
    form: &Form,
    base_url: &str,
    params: ParameterSet,
    follow_redirects: bool,
) -> Result<Response, HttpError> {
    let mut request = build_request(form, base_url, params);
    request.follow_redirects = follow_redirects;
    transport.execute(&request).await
}
