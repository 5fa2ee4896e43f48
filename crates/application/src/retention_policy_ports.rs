use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use ltrpolicy_core::AppResult;
use ltrpolicy_domain::{ResourceIdentifier, RetentionPolicyConfig, RetentionSettings};

use crate::Deadline;

/// Database whose long-term retention policy an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyScope {
    /// Resource group containing the SQL server.
    pub resource_group: String,
    /// SQL server hosting the database.
    pub server_name: String,
    /// Database the policy belongs to.
    pub database_name: String,
}

impl PolicyScope {
    /// Creates a policy scope.
    #[must_use]
    pub fn new(
        resource_group: impl Into<String>,
        server_name: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            server_name: server_name.into(),
            database_name: database_name.into(),
        }
    }
}

impl From<&RetentionPolicyConfig> for PolicyScope {
    fn from(config: &RetentionPolicyConfig) -> Self {
        Self::new(
            config.resource_group_name().as_str(),
            config.server_name().as_str(),
            config.database_name().as_str(),
        )
    }
}

impl From<&ResourceIdentifier> for PolicyScope {
    fn from(id: &ResourceIdentifier) -> Self {
        Self::new(id.resource_group(), id.server_name(), id.database_name())
    }
}

impl Display for PolicyScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "SQL Server {:?} (Database {:?}, Resource Group {:?})",
            self.server_name, self.database_name, self.resource_group
        )
    }
}

/// Policy as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRetentionPolicy {
    /// Provider-issued identifier.
    pub id: ResourceIdentifier,
    /// Settings currently applied.
    pub retention: RetentionSettings,
}

/// Handle to an in-progress remote mutation.
#[async_trait]
pub trait PolicyOperation: Send {
    /// Polls until the operation is terminal or the deadline passes.
    ///
    /// Returns `AppError::Timeout` once the deadline elapses and
    /// `AppError::RemoteCall` when the provider reports a failed operation.
    async fn wait_for_completion(&mut self, deadline: Deadline) -> AppResult<()>;
}

/// Port for the provider's long-term retention policy API.
#[async_trait]
pub trait LongTermRetentionPolicyClient: Send + Sync {
    /// Starts setting the policy of a database.
    async fn create_or_update(
        &self,
        scope: &PolicyScope,
        retention: RetentionSettings,
    ) -> AppResult<Box<dyn PolicyOperation>>;

    /// Fetches the current policy of a database.
    async fn get(&self, scope: &PolicyScope) -> AppResult<RemoteRetentionPolicy>;
}
