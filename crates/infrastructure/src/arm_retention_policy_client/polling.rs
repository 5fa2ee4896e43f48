use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ltrpolicy_application::{Deadline, PolicyOperation};
use ltrpolicy_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use tracing::debug;
use url::Url;

use super::transport::{ArmTransport, error_from_response, transport_error};
use super::wire::AsyncOperationStatusBody;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Where the state of a long-running operation is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PollTarget {
    /// The initial response was already terminal.
    Done,
    /// Status document URL from the `Azure-AsyncOperation` header.
    AsyncOperation(Url),
    /// Resource-location URL from the `Location` header.
    Location(Url),
}

impl PollTarget {
    /// Picks the polling strategy for the initial mutating response.
    pub(super) fn from_initial_response(
        status: StatusCode,
        headers: &HeaderMap,
    ) -> AppResult<Self> {
        if let Some(url) = header_url(headers, AZURE_ASYNC_OPERATION)? {
            return Ok(Self::AsyncOperation(url));
        }

        if matches!(status, StatusCode::CREATED | StatusCode::ACCEPTED)
            && let Some(url) = header_url(headers, LOCATION.as_str())?
        {
            return Ok(Self::Location(url));
        }

        Ok(Self::Done)
    }
}

fn header_url(headers: &HeaderMap, name: &str) -> AppResult<Option<Url>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let raw = value.to_str().map_err(|error| {
        AppError::RemoteCall(format!("provider returned unreadable {name} header: {error}"))
    })?;
    Url::parse(raw).map(Some).map_err(|error| {
        AppError::RemoteCall(format!(
            "provider returned invalid {name} polling URL '{raw}': {error}"
        ))
    })
}

/// Reads `Retry-After` as delta-seconds or as an HTTP date.
pub(super) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

/// Long-running operation started by a PUT against the management API.
#[derive(Debug)]
pub(super) struct ArmPolicyOperation {
    transport: ArmTransport,
    target: PollTarget,
    next_delay: Duration,
    default_poll_interval: Duration,
}

impl ArmPolicyOperation {
    pub(super) fn new(
        transport: ArmTransport,
        target: PollTarget,
        initial_delay: Option<Duration>,
        default_poll_interval: Duration,
    ) -> Self {
        Self {
            transport,
            target,
            next_delay: initial_delay.unwrap_or(default_poll_interval),
            default_poll_interval,
        }
    }

    /// Issues one status request; `true` once the operation is terminal.
    async fn poll_once(&mut self) -> AppResult<bool> {
        let url = match &self.target {
            PollTarget::Done => return Ok(true),
            PollTarget::AsyncOperation(url) | PollTarget::Location(url) => url.clone(),
        };

        let response = self
            .transport
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;
        self.next_delay = retry_after(response.headers()).unwrap_or(self.default_poll_interval);

        match self.target {
            PollTarget::AsyncOperation(_) => poll_async_operation(response).await,
            PollTarget::Location(_) => poll_location(response).await,
            PollTarget::Done => Ok(true),
        }
    }
}

async fn poll_async_operation(response: Response) -> AppResult<bool> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let body = response
        .json::<AsyncOperationStatusBody>()
        .await
        .map_err(|error| {
            AppError::RemoteCall(format!("failed to parse operation status body: {error}"))
        })?;
    debug!(status = %body.status, "polled long term retention policy operation");

    if body.status.eq_ignore_ascii_case("Succeeded") {
        return Ok(true);
    }

    if body.status.eq_ignore_ascii_case("Failed") || body.status.eq_ignore_ascii_case("Canceled")
    {
        let detail = body
            .error
            .map(|error| error.describe())
            .unwrap_or_else(|| "no error details returned".to_owned());
        return Err(AppError::RemoteCall(format!(
            "operation finished with status {}: {detail}",
            body.status
        )));
    }

    Ok(false)
}

async fn poll_location(response: Response) -> AppResult<bool> {
    let status = response.status();
    debug!(status = status.as_u16(), "polled long term retention policy location");

    match status {
        StatusCode::ACCEPTED => Ok(false),
        status if status.is_success() => Ok(true),
        _ => Err(error_from_response(response).await),
    }
}

#[async_trait]
impl PolicyOperation for ArmPolicyOperation {
    async fn wait_for_completion(&mut self, deadline: Deadline) -> AppResult<()> {
        loop {
            if self.target == PollTarget::Done {
                return Ok(());
            }

            if deadline.is_elapsed() {
                return Err(AppError::Timeout(
                    "long running operation did not reach a terminal state before the deadline"
                        .to_owned(),
                ));
            }

            tokio::time::sleep(self.next_delay.min(deadline.remaining())).await;
            if deadline.is_elapsed() {
                continue;
            }

            if self.poll_once().await? {
                self.target = PollTarget::Done;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue, LOCATION, RETRY_AFTER};

    use super::{PollTarget, retry_after};

    #[test]
    fn retry_after_accepts_seconds_and_past_dates() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("15"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(15)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn async_operation_header_wins_over_location() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "azure-asyncoperation",
            HeaderValue::from_static("https://management.azure.com/operations/1"),
        );
        headers.insert(
            LOCATION,
            HeaderValue::from_static("https://management.azure.com/locations/1"),
        );

        let target = PollTarget::from_initial_response(StatusCode::ACCEPTED, &headers);
        assert!(matches!(target, Ok(PollTarget::AsyncOperation(_))));
    }

    #[test]
    fn ok_without_headers_is_done() {
        let target = PollTarget::from_initial_response(StatusCode::OK, &HeaderMap::new());
        assert!(matches!(target, Ok(PollTarget::Done)));
    }

    #[test]
    fn invalid_polling_url_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("not a url"));

        let target = PollTarget::from_initial_response(StatusCode::ACCEPTED, &headers);
        assert!(target.is_err());
    }
}
