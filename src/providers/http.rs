use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use tokio::time::sleep;

use crate::{error::ProviderError, types::ProviderKind, utils, warning};

const MAX_ATTEMPTS: u32 = 3;
const BAD_GATEWAY_PAUSE: Duration = Duration::from_secs(10);
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Sends a request, retrying transient failures.
///
/// - `502 Bad Gateway` is retried after 10 seconds.
/// - `429 Too Many Requests` is retried after the `Retry-After` delay when it
///   is at most 120 seconds.
/// - `401 Unauthorized` becomes [`ProviderError::AuthExpired`].
/// - Any other non-success status becomes [`ProviderError::HttpStatus`] with
///   the response body.
///
/// At most three attempts are made.
pub async fn send(provider: ProviderKind, request: RequestBuilder) -> Result<Response, ProviderError> {
    let mut attempt = 1;

    loop {
        let Some(current) = request.try_clone() else {
            let response = request
                .send()
                .await
                .map_err(|source| ProviderError::Transport { provider, source })?;
            return check_status(provider, response).await;
        };

        let response = current
            .send()
            .await
            .map_err(|source| ProviderError::Transport { provider, source })?;

        let retry_after = retry_after_secs(&response);
        if let Some(pause) = retry_delay(response.status(), attempt, retry_after) {
            sleep(pause).await;
            attempt += 1;
            continue;
        }

        let too_many = response.status() == StatusCode::TOO_MANY_REQUESTS;
        if let Some(secs) = retry_after.filter(|secs| too_many && *secs > MAX_RETRY_AFTER_SECS) {
            warning!(
                "{} asks to retry after {} seconds. Try again later.",
                provider,
                secs
            );
        }

        return check_status(provider, response).await;
    }
}

/// Sends a request and returns the response body as text.
pub async fn send_for_text(
    provider: ProviderKind,
    request: RequestBuilder,
) -> Result<String, ProviderError> {
    let response = send(provider, request).await?;
    response
        .text()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })
}

/// `base` extended by `segments`, or [`ProviderError::InvalidUrl`].
pub fn endpoint(provider: ProviderKind, base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    utils::endpoint(base, segments).ok_or_else(|| ProviderError::InvalidUrl {
        provider,
        url: base.to_string(),
    })
}

/// How long to wait before retrying a response with `status`, or `None` when
/// it is final. `attempt` counts from 1; `retry_after` is the `Retry-After`
/// header in seconds.
pub fn retry_delay(status: StatusCode, attempt: u32, retry_after: Option<u64>) -> Option<Duration> {
    if attempt >= MAX_ATTEMPTS {
        return None;
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let secs = retry_after.unwrap_or(1);
            (secs <= MAX_RETRY_AFTER_SECS).then(|| Duration::from_secs(secs))
        }
        StatusCode::BAD_GATEWAY => Some(BAD_GATEWAY_PAUSE),
        _ => None,
    }
}

/// The error for a final non-success `status`.
pub fn status_error(provider: ProviderKind, status: StatusCode, body: String) -> ProviderError {
    if status == StatusCode::UNAUTHORIZED {
        return ProviderError::AuthExpired { provider };
    }

    ProviderError::HttpStatus {
        provider,
        status: status.as_u16(),
        body,
    }
}

async fn check_status(provider: ProviderKind, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(provider, status, body))
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}
