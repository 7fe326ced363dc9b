//! Form login before scanning
//!
//! Credentials are posted once through the shared client; the session
//! cookies it receives land in the client's jar and ride along on every
//! probe afterwards.

use crate::app::LoginConfig;
use crate::error::ScannerError;
use crate::http::{Request, Response, Transport};

/// Build the credential submission for `login`
pub fn login_request(login: &LoginConfig) -> Request {
    let fields = vec![
        (login.user_field.clone(), login.username.clone()),
        (login.pass_field.clone(), login.password.clone()),
    ];

    Request::builder().method("POST").url(&login.url).form(&fields).build()
}

/// Submit the login form. Any 4xx or 5xx answer counts as a failed login.
pub async fn login<T: Transport + ?Sized>(transport: &T, login: &LoginConfig) -> Result<Response, ScannerError> {
    tracing::info!(url = %login.url, user = %login.username, "Logging in");

    let response = transport
        .execute(&login_request(login))
        .await
        .map_err(|e| ScannerError::LoginFailed(e.to_string()))?;

    if response.status >= 400 {
        return Err(ScannerError::LoginFailed(format!(
            "server answered with status {}",
            response.status
        )));
    }

    tracing::info!(status = response.status, "Login submitted");
    Ok(response)
}
