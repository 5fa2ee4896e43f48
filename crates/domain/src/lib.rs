//! Domain types and invariants for long-term retention policies.

#![forbid(unsafe_code)]

mod naming;
mod policy;
mod resource_id;
mod retention;

pub use naming::{validate_resource_group_name, validate_sql_server_name};
pub use policy::{RetentionPolicyConfig, RetentionPolicyConfigInput, RetentionPolicyRecord};
pub use resource_id::{DEFAULT_POLICY_NAME, ResourceIdentifier, SQL_PROVIDER_NAMESPACE};
pub use retention::{
    DEFAULT_WEEK_OF_YEAR, RetentionDuration, RetentionSettings, RetentionSettingsInput,
};
