use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ltrpolicy_application::{
    Deadline, LongTermRetentionPolicyClient, PolicyOperation, PolicyScope, RemoteRetentionPolicy,
};
use ltrpolicy_core::AppResult;
use ltrpolicy_domain::{ResourceIdentifier, RetentionSettings};
use tokio::sync::RwLock;

type PolicyStore = Arc<RwLock<HashMap<PolicyScope, RetentionSettings>>>;

/// In-memory policy client for local runs.
///
/// Every database is treated as existing; one whose policy was never set
/// reports the disabled settings, like a freshly created database does.
#[derive(Debug, Default)]
pub struct InMemoryLongTermRetentionPolicyClient {
    subscription_id: String,
    policies: PolicyStore,
}

impl InMemoryLongTermRetentionPolicyClient {
    /// Creates an empty client issuing identifiers under the given subscription.
    #[must_use]
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            policies: PolicyStore::default(),
        }
    }
}

/// Operation that applies its write once awaited.
struct InMemoryPolicyOperation {
    policies: PolicyStore,
    scope: PolicyScope,
    retention: Option<RetentionSettings>,
}

#[async_trait]
impl PolicyOperation for InMemoryPolicyOperation {
    async fn wait_for_completion(&mut self, _deadline: Deadline) -> AppResult<()> {
        if let Some(retention) = self.retention.take() {
            self.policies
                .write()
                .await
                .insert(self.scope.clone(), retention);
        }

        Ok(())
    }
}

#[async_trait]
impl LongTermRetentionPolicyClient for InMemoryLongTermRetentionPolicyClient {
    async fn create_or_update(
        &self,
        scope: &PolicyScope,
        retention: RetentionSettings,
    ) -> AppResult<Box<dyn PolicyOperation>> {
        Ok(Box::new(InMemoryPolicyOperation {
            policies: self.policies.clone(),
            scope: scope.clone(),
            retention: Some(retention),
        }))
    }

    async fn get(&self, scope: &PolicyScope) -> AppResult<RemoteRetentionPolicy> {
        let retention = self
            .policies
            .read()
            .await
            .get(scope)
            .cloned()
            .unwrap_or_default();

        Ok(RemoteRetentionPolicy {
            id: ResourceIdentifier::new(
                self.subscription_id.as_str(),
                scope.resource_group.as_str(),
                scope.server_name.as_str(),
                scope.database_name.as_str(),
            ),
            retention,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ltrpolicy_application::{Deadline, LongTermRetentionPolicyClient, PolicyScope};
    use ltrpolicy_domain::{RetentionDuration, RetentionSettings};

    use super::InMemoryLongTermRetentionPolicyClient;

    #[tokio::test]
    async fn unset_policy_reads_as_disabled() {
        let client = InMemoryLongTermRetentionPolicyClient::new("sub");
        let remote = client.get(&PolicyScope::new("rg1", "srv1", "db1")).await;

        assert!(remote.is_ok());
        let remote = remote.unwrap_or_else(|_| unreachable!());
        assert_eq!(remote.retention, RetentionSettings::disabled());
        assert_eq!(remote.id.subscription_id(), "sub");
    }

    #[tokio::test]
    async fn write_is_visible_only_after_completion() {
        let client = InMemoryLongTermRetentionPolicyClient::new("sub");
        let scope = PolicyScope::new("rg1", "srv1", "db1");
        let weekly = RetentionDuration::new("P3W").unwrap_or_else(|_| unreachable!());
        let retention = RetentionSettings::new(
            weekly,
            RetentionDuration::disabled(),
            RetentionDuration::disabled(),
            1,
        )
        .unwrap_or_else(|_| unreachable!());

        let mut operation = client
            .create_or_update(&scope, retention.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        let before = client.get(&scope).await.map(|remote| remote.retention);
        assert_eq!(before.ok(), Some(RetentionSettings::disabled()));

        let completed = operation
            .wait_for_completion(Deadline::after(Duration::from_secs(1)))
            .await;
        assert!(completed.is_ok());

        let after = client.get(&scope).await.map(|remote| remote.retention);
        assert_eq!(after.ok(), Some(retention));
    }
}
