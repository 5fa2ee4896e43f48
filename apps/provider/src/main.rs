//! Host-facing entry point for the long-term retention policy resource.
//!
//! Usage: `ltrpolicy-provider <create|update|read|import|delete> [ID]`.
//! `create` and `update` read the desired-state JSON document from stdin.
//! Records are printed as JSON on stdout; logs go to stderr.

#![forbid(unsafe_code)]

mod provider_config;

use std::env;
use std::io::Read;
use std::sync::Arc;

use ltrpolicy_application::{LongTermRetentionPolicyClient, LongTermRetentionPolicyService};
use ltrpolicy_core::{AppError, AppResult};
use ltrpolicy_domain::{
    ResourceIdentifier, RetentionPolicyConfig, RetentionPolicyConfigInput, RetentionPolicyRecord,
};
use ltrpolicy_infrastructure::{
    ArmLongTermRetentionPolicyClient, InMemoryLongTermRetentionPolicyClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::provider_config::{ClientMode, ProviderConfig};

#[derive(Debug)]
enum ProviderCommand {
    Create,
    Update,
    Read(String),
    Import(String),
    Delete(String),
}

impl ProviderCommand {
    fn from_args(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        let command = args.next().ok_or_else(usage)?;
        let mut id = || args.next().ok_or_else(usage);

        match command.as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "read" => Ok(Self::Read(id()?)),
            "import" => Ok(Self::Import(id()?)),
            "delete" => Ok(Self::Delete(id()?)),
            _ => Err(usage()),
        }
    }
}

fn usage() -> AppError {
    AppError::Validation(
        "usage: ltrpolicy-provider <create|update|read|import|delete> [ID]".to_owned(),
    )
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = ProviderCommand::from_args(env::args().skip(1))?;
    let config = ProviderConfig::load()?;
    let service = build_service(&config)?;

    info!(command = ?command, "ltrpolicy-provider started");

    let timeouts = service.timeouts();
    match command {
        ProviderCommand::Create => {
            let desired = read_desired_state()?;
            let record = service.apply(&desired, timeouts.create_deadline()).await?;
            print_record(&record)
        }
        ProviderCommand::Update => {
            let desired = read_desired_state()?;
            let record = service.apply(&desired, timeouts.update_deadline()).await?;
            print_record(&record)
        }
        ProviderCommand::Read(raw_id) => {
            let id = ResourceIdentifier::parse(raw_id.as_str())?;
            let retention = service.read(&id, timeouts.read_deadline()).await?;
            print_record(&RetentionPolicyRecord::new(id, retention))
        }
        ProviderCommand::Import(raw_id) => {
            let record = service
                .import(raw_id.as_str(), timeouts.read_deadline())
                .await?;
            print_record(&record)
        }
        ProviderCommand::Delete(raw_id) => {
            let id = ResourceIdentifier::parse(raw_id.as_str())?;
            service.delete(&id, timeouts.delete_deadline()).await?;
            info!(id = %id, "long term retention policy reset to defaults");
            Ok(())
        }
    }
}

fn build_service(config: &ProviderConfig) -> AppResult<LongTermRetentionPolicyService> {
    let client: Arc<dyn LongTermRetentionPolicyClient> = match &config.client {
        ClientMode::Arm(arm_config) => {
            let http_client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build HTTP client: {error}"))
                })?;
            Arc::new(ArmLongTermRetentionPolicyClient::new(
                http_client,
                arm_config.clone(),
            ))
        }
        ClientMode::InMemory { subscription_id } => Arc::new(
            InMemoryLongTermRetentionPolicyClient::new(subscription_id.as_str()),
        ),
    };

    Ok(LongTermRetentionPolicyService::new(client).with_timeouts(config.timeouts))
}

fn read_desired_state() -> AppResult<RetentionPolicyConfig> {
    let mut document = String::new();
    std::io::stdin()
        .read_to_string(&mut document)
        .map_err(|error| AppError::Internal(format!("failed to read stdin: {error}")))?;

    let input = serde_json::from_str::<RetentionPolicyConfigInput>(document.as_str())
        .map_err(|error| AppError::Validation(format!("invalid desired-state document: {error}")))?;
    RetentionPolicyConfig::new(input)
}

fn print_record(record: &RetentionPolicyRecord) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(record)
        .map_err(|error| AppError::Internal(format!("failed to render record: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use ltrpolicy_core::AppError;

    use super::ProviderCommand;

    fn parse(args: &[&str]) -> Result<ProviderCommand, AppError> {
        ProviderCommand::from_args(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn commands_requiring_an_identifier_reject_missing_argument() {
        assert!(matches!(parse(&["read"]), Err(AppError::Validation(_))));
        assert!(matches!(parse(&["delete"]), Err(AppError::Validation(_))));
        assert!(matches!(parse(&["import"]), Err(AppError::Validation(_))));
    }

    #[test]
    fn known_commands_parse() {
        assert!(matches!(parse(&["create"]), Ok(ProviderCommand::Create)));
        assert!(matches!(parse(&["update"]), Ok(ProviderCommand::Update)));
        assert!(matches!(
            parse(&["read", "/subscriptions/sub"]),
            Ok(ProviderCommand::Read(id)) if id == "/subscriptions/sub"
        ));
        assert!(matches!(parse(&[]), Err(AppError::Validation(_))));
        assert!(matches!(parse(&["destroy"]), Err(AppError::Validation(_))));
    }
}
