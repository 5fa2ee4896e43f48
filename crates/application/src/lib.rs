//! Application services and ports.

#![forbid(unsafe_code)]

mod deadline;
mod retention_policy_ports;
mod retention_policy_service;

pub use deadline::{
    DEFAULT_CREATE_UPDATE_TIMEOUT, DEFAULT_DELETE_TIMEOUT, DEFAULT_READ_TIMEOUT, Deadline,
    ResourceTimeouts,
};
pub use retention_policy_ports::{
    LongTermRetentionPolicyClient, PolicyOperation, PolicyScope, RemoteRetentionPolicy,
};
pub use retention_policy_service::LongTermRetentionPolicyService;
