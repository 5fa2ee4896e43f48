use ltrpolicy_core::AppError;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use url::Url;
use uuid::Uuid;

use super::wire::ArmErrorEnvelope;

/// Authenticated HTTP access to the management endpoint.
#[derive(Clone)]
pub(super) struct ArmTransport {
    http_client: reqwest::Client,
    access_token: String,
}

impl ArmTransport {
    pub(super) fn new(http_client: reqwest::Client, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
        }
    }

    /// Starts a request carrying the bearer token and a fresh correlation id.
    pub(super) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(self.access_token.as_str())
            .header(header::ACCEPT, "application/json")
            .header("x-ms-client-request-id", Uuid::new_v4().to_string())
    }
}

impl std::fmt::Debug for ArmTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ArmTransport")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

pub(super) fn transport_error(error: reqwest::Error) -> AppError {
    AppError::RemoteCall(format!("transport error: {error}"))
}

/// Converts a non-success response into an error, decoding the ARM error envelope.
pub(super) async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    let detail = serde_json::from_str::<ArmErrorEnvelope>(body.as_str())
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|error| error.describe())
        .unwrap_or(body);

    let message = format!("provider returned status {}: {detail}", status.as_u16());
    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(message)
    } else {
        AppError::RemoteCall(message)
    }
}
