//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod arm_retention_policy_client;
mod in_memory_retention_policy_client;

pub use arm_retention_policy_client::{
    ArmClientConfig, ArmLongTermRetentionPolicyClient, DEFAULT_ARM_ENDPOINT,
    DEFAULT_POLL_INTERVAL, LONG_TERM_RETENTION_API_VERSION,
};
pub use in_memory_retention_policy_client::InMemoryLongTermRetentionPolicyClient;
