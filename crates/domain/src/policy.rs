use ltrpolicy_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::naming::{validate_resource_group_name, validate_sql_server_name};
use crate::resource_id::ResourceIdentifier;
use crate::retention::{RetentionSettings, RetentionSettingsInput};

/// Desired-state document supplied by the host for one policy resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicyConfigInput {
    /// Database the policy applies to.
    pub database_name: String,
    /// Resource group containing the SQL server.
    pub resource_group_name: String,
    /// SQL server hosting the database.
    pub server_name: String,
    /// Requested retention settings.
    #[serde(default)]
    pub backup_long_term_retention_policy: RetentionSettingsInput,
}

/// Validated desired state of a database's long-term retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicyConfig {
    database_name: NonEmptyString,
    resource_group_name: NonEmptyString,
    server_name: NonEmptyString,
    retention: RetentionSettings,
}

impl RetentionPolicyConfig {
    /// Creates a validated policy configuration from host input.
    pub fn new(input: RetentionPolicyConfigInput) -> AppResult<Self> {
        let database_name = NonEmptyString::new(input.database_name)
            .map_err(|_| AppError::Validation("database_name must not be empty".to_owned()))?;
        validate_resource_group_name(input.resource_group_name.as_str())?;
        validate_sql_server_name(input.server_name.as_str())?;
        let retention = RetentionSettings::try_from(input.backup_long_term_retention_policy)
            .map_err(|error| error.with_context("backup_long_term_retention_policy"))?;

        Ok(Self {
            database_name,
            resource_group_name: NonEmptyString::new(input.resource_group_name)?,
            server_name: NonEmptyString::new(input.server_name)?,
            retention,
        })
    }

    /// Returns the database name.
    #[must_use]
    pub fn database_name(&self) -> &NonEmptyString {
        &self.database_name
    }

    /// Returns the resource group name.
    #[must_use]
    pub fn resource_group_name(&self) -> &NonEmptyString {
        &self.resource_group_name
    }

    /// Returns the SQL server name.
    #[must_use]
    pub fn server_name(&self) -> &NonEmptyString {
        &self.server_name
    }

    /// Returns the requested retention settings.
    #[must_use]
    pub fn retention(&self) -> &RetentionSettings {
        &self.retention
    }
}

/// Host-facing record reflecting the remote policy state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicyRecord {
    /// Provider-issued identifier of the policy.
    pub id: ResourceIdentifier,
    /// Database the policy applies to.
    pub database_name: String,
    /// Resource group containing the SQL server.
    pub resource_group_name: String,
    /// SQL server hosting the database.
    pub server_name: String,
    /// Retention settings currently applied.
    pub backup_long_term_retention_policy: RetentionSettings,
}

impl RetentionPolicyRecord {
    /// Builds a record from an identifier and the settings read for it.
    #[must_use]
    pub fn new(id: ResourceIdentifier, retention: RetentionSettings) -> Self {
        Self {
            database_name: id.database_name().to_owned(),
            resource_group_name: id.resource_group().to_owned(),
            server_name: id.server_name().to_owned(),
            id,
            backup_long_term_retention_policy: retention,
        }
    }
}
