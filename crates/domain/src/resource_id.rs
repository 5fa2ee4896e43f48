//! Structured form of the provider-issued policy identifier.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ltrpolicy_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Resource provider namespace that owns SQL databases.
pub const SQL_PROVIDER_NAMESPACE: &str = "Microsoft.Sql";

/// Name of the single long-term retention policy child of a database.
pub const DEFAULT_POLICY_NAME: &str = "default";

/// Identifier of a database's long-term retention policy.
///
/// Parsed once from the host's opaque string:
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Sql/servers/{server}/databases/{db}/backupLongTermRetentionPolicies/{name}`.
/// The trailing policy segment is optional on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdentifier {
    subscription_id: String,
    resource_group: String,
    server_name: String,
    database_name: String,
    policy_name: String,
}

impl ResourceIdentifier {
    /// Builds the identifier of the default policy of a database.
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        server_name: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            server_name: server_name.into(),
            database_name: database_name.into(),
            policy_name: DEFAULT_POLICY_NAME.to_owned(),
        }
    }

    /// Parses an ARM resource path.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(AppError::Parse(
                "resource identifier must not be empty".to_owned(),
            ));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(AppError::Parse(format!(
                "resource identifier '{value}' must consist of key/value segment pairs"
            )));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut server_name = None;
        let mut database_name = None;
        let mut policy_name = None;

        for pair in segments.chunks_exact(2) {
            let (key, segment_value) = (pair[0], pair[1]);
            if segment_value.is_empty() {
                return Err(AppError::Parse(format!(
                    "resource identifier '{value}' has an empty value for '{key}'"
                )));
            }

            let slot = match key.to_ascii_lowercase().as_str() {
                "subscriptions" => &mut subscription_id,
                "resourcegroups" => &mut resource_group,
                "providers" => &mut provider,
                "servers" => &mut server_name,
                "databases" => &mut database_name,
                "backuplongtermretentionpolicies" => &mut policy_name,
                _ => {
                    return Err(AppError::Parse(format!(
                        "resource identifier '{value}' has unexpected segment '{key}'"
                    )));
                }
            };

            if slot.replace(segment_value).is_some() {
                return Err(AppError::Parse(format!(
                    "resource identifier '{value}' repeats segment '{key}'"
                )));
            }
        }

        let required = |slot: Option<&str>, key: &str| {
            slot.map(str::to_owned).ok_or_else(|| {
                AppError::Parse(format!(
                    "resource identifier '{value}' is missing the '{key}' segment"
                ))
            })
        };

        let provider = required(provider, "providers")?;
        if !provider.eq_ignore_ascii_case(SQL_PROVIDER_NAMESPACE) {
            return Err(AppError::Parse(format!(
                "resource identifier '{value}' belongs to provider '{provider}', \
                 expected '{SQL_PROVIDER_NAMESPACE}'"
            )));
        }

        Ok(Self {
            subscription_id: required(subscription_id, "subscriptions")?,
            resource_group: required(resource_group, "resourceGroups")?,
            server_name: required(server_name, "servers")?,
            database_name: required(database_name, "databases")?,
            policy_name: policy_name.unwrap_or(DEFAULT_POLICY_NAME).to_owned(),
        })
    }

    /// Returns the subscription the database lives in.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        self.subscription_id.as_str()
    }

    /// Returns the resource group name.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        self.resource_group.as_str()
    }

    /// Returns the SQL server name.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.server_name.as_str()
    }

    /// Returns the database name.
    #[must_use]
    pub fn database_name(&self) -> &str {
        self.database_name.as_str()
    }
}

impl Display for ResourceIdentifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "/subscriptions/{}/resourceGroups/{}/providers/{SQL_PROVIDER_NAMESPACE}/servers/{}/databases/{}/backupLongTermRetentionPolicies/{}",
            self.subscription_id,
            self.resource_group,
            self.server_name,
            self.database_name,
            self.policy_name
        )
    }
}

impl FromStr for ResourceIdentifier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ResourceIdentifier {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<ResourceIdentifier> for String {
    fn from(value: ResourceIdentifier) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use ltrpolicy_core::AppError;
    use proptest::prelude::*;

    use super::ResourceIdentifier;

    const POLICY_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Sql/servers/srv1/databases/db1/backupLongTermRetentionPolicies/default";

    #[test]
    fn parses_full_policy_identifier() {
        let id = ResourceIdentifier::parse(POLICY_ID);
        assert!(id.is_ok());

        let id = id.unwrap_or_else(|_| unreachable!());
        assert_eq!(id.subscription_id(), "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.resource_group(), "rg1");
        assert_eq!(id.server_name(), "srv1");
        assert_eq!(id.database_name(), "db1");
        assert_eq!(id.to_string(), POLICY_ID);
    }

    #[test]
    fn accepts_database_identifier_and_lowercase_keys() {
        let id = ResourceIdentifier::parse(
            "/subscriptions/sub/resourcegroups/rg1/providers/microsoft.sql/servers/srv1/databases/db1",
        );
        assert!(id.is_ok());

        let id = id.unwrap_or_else(|_| unreachable!());
        assert_eq!(id.resource_group(), "rg1");
        assert!(
            id.to_string()
                .ends_with("/backupLongTermRetentionPolicies/default")
        );
    }

    #[test]
    fn rejects_identifier_without_databases_segment() {
        let result = ResourceIdentifier::parse(
            "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Sql/servers/srv1",
        );
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn rejects_identifier_without_servers_segment() {
        let result = ResourceIdentifier::parse(
            "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Sql/databases/db1",
        );
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn rejects_odd_segment_count_and_foreign_provider() {
        assert!(matches!(
            ResourceIdentifier::parse("/subscriptions/sub/resourceGroups"),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            ResourceIdentifier::parse(
                "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Web/servers/srv1/databases/db1"
            ),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(ResourceIdentifier::parse("  "), Err(AppError::Parse(_))));
    }

    #[test]
    fn serializes_as_path_string() {
        let id = ResourceIdentifier::new("sub", "rg1", "srv1", "db1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(
            json,
            "\"/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Sql/servers/srv1/databases/db1/backupLongTermRetentionPolicies/default\""
        );
    }

    proptest! {
        #[test]
        fn rendered_identifiers_parse_back(
            subscription in "[0-9a-f]{8}",
            resource_group in "[A-Za-z0-9_().-]{0,20}[A-Za-z0-9_()-]",
            server in "[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?",
            database in "[A-Za-z0-9_-]{1,30}",
        ) {
            let id = ResourceIdentifier::new(subscription, resource_group, server, database);
            let parsed = ResourceIdentifier::parse(id.to_string().as_str());
            prop_assert_eq!(parsed.ok(), Some(id));
        }
    }
}
