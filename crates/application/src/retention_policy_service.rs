//! Lifecycle callbacks for the long-term retention policy resource.
//!
//! The policy is an intrinsic child of a SQL database, so "create" and
//! "update" both set it and "delete" resets it to the disabled values.
//! Nothing is retried here; the host decides whether to run a callback again.

use std::sync::Arc;

use ltrpolicy_core::{AppError, AppResult};
use ltrpolicy_domain::{
    ResourceIdentifier, RetentionPolicyConfig, RetentionPolicyRecord, RetentionSettings,
};
use tracing::{info, warn};

use crate::retention_policy_ports::{LongTermRetentionPolicyClient, PolicyOperation, PolicyScope};
use crate::{Deadline, ResourceTimeouts};

/// Adapter between host lifecycle callbacks and the provider API.
#[derive(Clone)]
pub struct LongTermRetentionPolicyService {
    client: Arc<dyn LongTermRetentionPolicyClient>,
    timeouts: ResourceTimeouts,
}

impl LongTermRetentionPolicyService {
    /// Creates the service with default timeouts.
    #[must_use]
    pub fn new(client: Arc<dyn LongTermRetentionPolicyClient>) -> Self {
        Self {
            client,
            timeouts: ResourceTimeouts::default(),
        }
    }

    /// Overrides the per-callback timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: ResourceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Returns the timeouts hosts should derive deadlines from.
    #[must_use]
    pub fn timeouts(&self) -> ResourceTimeouts {
        self.timeouts
    }

    /// Sets the policy of the configured database and returns its identifier.
    ///
    /// Waits for the provider to finish, then re-reads the policy to obtain
    /// the identifier. No identifier is returned if any step fails.
    pub async fn create_or_update(
        &self,
        config: &RetentionPolicyConfig,
        deadline: Deadline,
    ) -> AppResult<ResourceIdentifier> {
        let scope = PolicyScope::from(config);
        info!(
            server_name = %scope.server_name,
            database_name = %scope.database_name,
            resource_group = %scope.resource_group,
            weekly_retention = %config.retention().weekly_retention(),
            monthly_retention = %config.retention().monthly_retention(),
            yearly_retention = %config.retention().yearly_retention(),
            week_of_year = config.retention().week_of_year(),
            disabled = config.retention().is_disabled(),
            "setting long term retention policy"
        );

        self.set_policy(&scope, config.retention().clone(), deadline)
            .await?;

        let remote = deadline
            .run(self.client.get(&scope))
            .await
            .map_err(|error| {
                error.with_context(format!(
                    "issuing get request for long term retention policy of {scope}"
                ))
            })?;

        info!(id = %remote.id, "long term retention policy applied");
        Ok(remote.id)
    }

    /// Reads the settings currently applied to the identified policy.
    pub async fn read(
        &self,
        id: &ResourceIdentifier,
        deadline: Deadline,
    ) -> AppResult<RetentionSettings> {
        let scope = PolicyScope::from(id);
        let remote = deadline
            .run(self.client.get(&scope))
            .await
            .map_err(|error| {
                if matches!(error, AppError::NotFound(_)) {
                    warn!(id = %id, "long term retention policy not found");
                }
                error.with_context(format!(
                    "retrieving long term retention policy of {scope}"
                ))
            })?;

        Ok(remote.retention)
    }

    /// Resets the identified policy to the disabled values.
    ///
    /// The policy cannot be removed while the database exists, so this issues
    /// the same create/update call with zero retention and does not re-read.
    pub async fn delete(&self, id: &ResourceIdentifier, deadline: Deadline) -> AppResult<()> {
        let scope = PolicyScope::from(id);
        info!(id = %id, "resetting long term retention policy to defaults");

        self.set_policy(&scope, RetentionSettings::disabled(), deadline)
            .await
    }

    /// Sets the policy and reads it back into a host record.
    ///
    /// This is the chain the host runs for both its create and update callbacks.
    /// The final read gets its own deadline from the configured read timeout.
    pub async fn apply(
        &self,
        config: &RetentionPolicyConfig,
        deadline: Deadline,
    ) -> AppResult<RetentionPolicyRecord> {
        let id = self.create_or_update(config, deadline).await?;
        let retention = self.read(&id, self.timeouts.read_deadline()).await?;
        Ok(RetentionPolicyRecord::new(id, retention))
    }

    /// Reconstructs a host record from a pre-existing opaque identifier.
    ///
    /// A malformed identifier fails before any remote call.
    pub async fn import(
        &self,
        raw_id: &str,
        deadline: Deadline,
    ) -> AppResult<RetentionPolicyRecord> {
        let id = ResourceIdentifier::parse(raw_id)?;
        let retention = self.read(&id, deadline).await?;
        Ok(RetentionPolicyRecord::new(id, retention))
    }

    async fn set_policy(
        &self,
        scope: &PolicyScope,
        retention: RetentionSettings,
        deadline: Deadline,
    ) -> AppResult<()> {
        let mut operation: Box<dyn PolicyOperation> = deadline
            .run(self.client.create_or_update(scope, retention))
            .await
            .map_err(|error| {
                error.with_context(format!(
                    "issuing create/update request for long term retention policy of {scope}"
                ))
            })?;

        deadline
            .run(operation.wait_for_completion(deadline))
            .await
            .map_err(|error| {
                warn!(
                    server_name = %scope.server_name,
                    database_name = %scope.database_name,
                    resource_group = %scope.resource_group,
                    error = %error,
                    "long term retention policy operation did not complete"
                );
                error.with_context(format!(
                    "waiting for completion of create/update for long term retention policy of {scope}"
                ))
            })
    }
}
