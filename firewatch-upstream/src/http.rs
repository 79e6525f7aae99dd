use crate::error::{Result, UpstreamError};
use reqwest::{Client, Response};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("firewatch/", env!("CARGO_PKG_VERSION"));

/// Build the shared reqwest client used for one upstream provider.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// Turn a non-success status into a `StatusError`, keeping the first line of the body.
pub(crate) async fn check_status(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = body.lines().next().unwrap_or("").trim().to_string();
    Err(UpstreamError::StatusError {
        service,
        status: status.as_u16(),
        message,
    })
}
