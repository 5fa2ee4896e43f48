//! Naming rules enforced by Azure for the resources a policy hangs off.

use ltrpolicy_core::{AppError, AppResult};

/// Maximum length of a resource group name.
const RESOURCE_GROUP_NAME_MAX_LENGTH: usize = 90;

/// Maximum length of a SQL server name.
const SQL_SERVER_NAME_MAX_LENGTH: usize = 63;

/// Validates a resource group name.
///
/// Resource group names are 1-90 characters of letters, digits, underscores,
/// hyphens, periods and parentheses, and may not end with a period.
pub fn validate_resource_group_name(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(
            "resource_group_name must not be empty".to_owned(),
        ));
    }

    if value.chars().count() > RESOURCE_GROUP_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "resource_group_name may not exceed {RESOURCE_GROUP_NAME_MAX_LENGTH} characters"
        )));
    }

    if value.ends_with('.') {
        return Err(AppError::Validation(
            "resource_group_name may not end with a period".to_owned(),
        ));
    }

    let allowed = |character: char| {
        character.is_alphanumeric() || matches!(character, '_' | '-' | '.' | '(' | ')')
    };
    if !value.chars().all(allowed) {
        return Err(AppError::Validation(format!(
            "resource_group_name '{value}' may only contain alphanumeric characters, \
             underscores, hyphens, periods and parentheses"
        )));
    }

    Ok(())
}

/// Validates a SQL server name.
///
/// Server names are 1-63 characters of lowercase letters, digits and hyphens,
/// and may not start or end with a hyphen.
pub fn validate_sql_server_name(value: &str) -> AppResult<()> {
    if value.is_empty() || value.len() > SQL_SERVER_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "server_name must be between 1 and {SQL_SERVER_NAME_MAX_LENGTH} characters"
        )));
    }

    if value.starts_with('-') || value.ends_with('-') {
        return Err(AppError::Validation(format!(
            "server_name '{value}' may not start or end with a hyphen"
        )));
    }

    let allowed =
        |character: char| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-';
    if !value.chars().all(allowed) {
        return Err(AppError::Validation(format!(
            "server_name '{value}' may only contain lowercase letters, digits and hyphens"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_resource_group_name, validate_sql_server_name};

    #[test]
    fn resource_group_names() {
        assert!(validate_resource_group_name("rg1").is_ok());
        assert!(validate_resource_group_name("My_Group-(prod).eu").is_ok());
        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name("trailing.").is_err());
        assert!(validate_resource_group_name("with space").is_err());
        assert!(validate_resource_group_name(&"a".repeat(91)).is_err());
    }

    #[test]
    fn sql_server_names() {
        assert!(validate_sql_server_name("srv1").is_ok());
        assert!(validate_sql_server_name("sql-prod-01").is_ok());
        assert!(validate_sql_server_name("").is_err());
        assert!(validate_sql_server_name("-srv").is_err());
        assert!(validate_sql_server_name("srv-").is_err());
        assert!(validate_sql_server_name("Srv1").is_err());
        assert!(validate_sql_server_name("srv_1").is_err());
        assert!(validate_sql_server_name(&"a".repeat(64)).is_err());
    }
}
