use std::time::Duration;

use async_trait::async_trait;
use ltrpolicy_application::{
    LongTermRetentionPolicyClient, PolicyOperation, PolicyScope, RemoteRetentionPolicy,
};
use ltrpolicy_core::{AppError, AppResult};
use ltrpolicy_domain::{
    DEFAULT_POLICY_NAME, ResourceIdentifier, RetentionSettings, SQL_PROVIDER_NAMESPACE,
};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

mod polling;
mod transport;
mod wire;

use polling::{ArmPolicyOperation, PollTarget, retry_after};
use transport::{ArmTransport, error_from_response, transport_error};
use wire::{PolicyRequestBody, PolicyResponseBody, flatten_retention};

/// Public-cloud management endpoint.
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// API version exposing `backupLongTermRetentionPolicies`.
pub const LONG_TERM_RETENTION_API_VERSION: &str = "2017-03-01-preview";

/// Poll interval used when the provider sends no `Retry-After`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Connection settings for the management API.
#[derive(Clone)]
pub struct ArmClientConfig {
    /// Base URL of the management endpoint.
    pub endpoint: Url,
    /// Subscription the managed databases live in.
    pub subscription_id: String,
    /// Bearer token used for every request.
    pub access_token: String,
    /// API version query parameter.
    pub api_version: String,
    /// Poll interval used when the provider sends no `Retry-After`.
    pub poll_interval: Duration,
}

impl ArmClientConfig {
    /// Creates a configuration with the default API version and poll interval.
    #[must_use]
    pub fn new(
        endpoint: Url,
        subscription_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            subscription_id: subscription_id.into(),
            access_token: access_token.into(),
            api_version: LONG_TERM_RETENTION_API_VERSION.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the fallback poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl std::fmt::Debug for ArmClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ArmClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Management API implementation of the long-term retention policy port.
#[derive(Debug)]
pub struct ArmLongTermRetentionPolicyClient {
    transport: ArmTransport,
    endpoint: Url,
    subscription_id: String,
    api_version: String,
    poll_interval: Duration,
}

impl ArmLongTermRetentionPolicyClient {
    /// Creates a client sharing the given HTTP connection pool.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: ArmClientConfig) -> Self {
        Self {
            transport: ArmTransport::new(http_client, config.access_token),
            endpoint: config.endpoint,
            subscription_id: config.subscription_id,
            api_version: config.api_version,
            poll_interval: config.poll_interval,
        }
    }

    fn policy_url(&self, scope: &PolicyScope) -> AppResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!(
                    "management endpoint '{}' cannot carry a resource path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                scope.resource_group.as_str(),
                "providers",
                SQL_PROVIDER_NAMESPACE,
                "servers",
                scope.server_name.as_str(),
                "databases",
                scope.database_name.as_str(),
                "backupLongTermRetentionPolicies",
                DEFAULT_POLICY_NAME,
            ]);
        url.query_pairs_mut()
            .append_pair("api-version", self.api_version.as_str());

        Ok(url)
    }
}

#[async_trait]
impl LongTermRetentionPolicyClient for ArmLongTermRetentionPolicyClient {
    async fn create_or_update(
        &self,
        scope: &PolicyScope,
        retention: RetentionSettings,
    ) -> AppResult<Box<dyn PolicyOperation>> {
        let url = self.policy_url(scope)?;
        let response = self
            .transport
            .request(Method::PUT, url)
            .json(&PolicyRequestBody::from(&retention))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let target = PollTarget::from_initial_response(status, response.headers())?;
        info!(
            server_name = %scope.server_name,
            database_name = %scope.database_name,
            status = status.as_u16(),
            polling = ?target,
            "long term retention policy update accepted"
        );

        Ok(Box::new(ArmPolicyOperation::new(
            self.transport.clone(),
            target,
            retry_after(response.headers()),
            self.poll_interval,
        )))
    }

    async fn get(&self, scope: &PolicyScope) -> AppResult<RemoteRetentionPolicy> {
        let url = self.policy_url(scope)?;
        let response = self
            .transport
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response
            .json::<PolicyResponseBody>()
            .await
            .map_err(|error| {
                AppError::RemoteCall(format!("failed to parse policy response body: {error}"))
            })?;
        debug!(id = ?body.id, "fetched long term retention policy");

        let id = match body.id.as_deref() {
            Some(raw_id) => ResourceIdentifier::parse(raw_id).map_err(|error| {
                AppError::RemoteCall(format!("provider returned an unusable policy id: {error}"))
            })?,
            None => ResourceIdentifier::new(
                self.subscription_id.as_str(),
                scope.resource_group.as_str(),
                scope.server_name.as_str(),
                scope.database_name.as_str(),
            ),
        };

        Ok(RemoteRetentionPolicy {
            id,
            retention: flatten_retention(body.properties)?,
        })
    }
}
