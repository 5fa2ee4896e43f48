use std::env;
use std::time::Duration;

use ltrpolicy_application::ResourceTimeouts;
use ltrpolicy_core::{AppError, AppResult};
use ltrpolicy_infrastructure::{ArmClientConfig, DEFAULT_ARM_ENDPOINT, DEFAULT_POLL_INTERVAL};
use url::Url;

#[derive(Debug, Clone)]
pub enum ClientMode {
    Arm(ArmClientConfig),
    InMemory { subscription_id: String },
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client: ClientMode,
    pub timeouts: ResourceTimeouts,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn load() -> AppResult<Self> {
        let subscription_id = required_env("ARM_SUBSCRIPTION_ID")?;
        uuid::Uuid::parse_str(subscription_id.trim()).map_err(|error| {
            AppError::Validation(format!(
                "invalid ARM_SUBSCRIPTION_ID '{subscription_id}': {error}"
            ))
        })?;
        let subscription_id = subscription_id.trim().to_owned();

        let client_mode = env::var("LTRPOLICY_CLIENT").unwrap_or_else(|_| "arm".to_owned());
        let client = match client_mode.trim().to_ascii_lowercase().as_str() {
            "arm" => ClientMode::Arm(load_arm_config(subscription_id)?),
            "memory" => ClientMode::InMemory { subscription_id },
            other => {
                return Err(AppError::Validation(format!(
                    "LTRPOLICY_CLIENT must be 'arm' or 'memory', got '{other}'"
                )));
            }
        };

        let defaults = ResourceTimeouts::default();
        let timeouts = ResourceTimeouts {
            create: parse_env_minutes("LTRPOLICY_CREATE_TIMEOUT_MINUTES", defaults.create)?,
            read: parse_env_minutes("LTRPOLICY_READ_TIMEOUT_MINUTES", defaults.read)?,
            update: parse_env_minutes("LTRPOLICY_UPDATE_TIMEOUT_MINUTES", defaults.update)?,
            delete: parse_env_minutes("LTRPOLICY_DELETE_TIMEOUT_MINUTES", defaults.delete)?,
        };

        let request_timeout_seconds = parse_env_u64("LTRPOLICY_REQUEST_TIMEOUT_SECONDS", 60)?;
        if request_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "LTRPOLICY_REQUEST_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            client,
            timeouts,
            request_timeout: Duration::from_secs(request_timeout_seconds),
        })
    }
}

fn load_arm_config(subscription_id: String) -> AppResult<ArmClientConfig> {
    let endpoint = env::var("ARM_ENDPOINT").unwrap_or_else(|_| DEFAULT_ARM_ENDPOINT.to_owned());
    let endpoint = Url::parse(endpoint.trim()).map_err(|error| {
        AppError::Validation(format!("invalid ARM_ENDPOINT '{endpoint}': {error}"))
    })?;
    let access_token = required_env("ARM_ACCESS_TOKEN")?;
    let poll_interval_seconds = parse_env_u64(
        "LTRPOLICY_POLL_INTERVAL_SECONDS",
        DEFAULT_POLL_INTERVAL.as_secs(),
    )?;

    if poll_interval_seconds == 0 {
        return Err(AppError::Validation(
            "LTRPOLICY_POLL_INTERVAL_SECONDS must be greater than zero".to_owned(),
        ));
    }

    Ok(
        ArmClientConfig::new(endpoint, subscription_id, access_token)
            .with_poll_interval(Duration::from_secs(poll_interval_seconds)),
    )
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_minutes(name: &str, default: Duration) -> AppResult<Duration> {
    let minutes = parse_env_u64(name, default.as_secs() / 60)?;
    if minutes == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(minutes.saturating_mul(60)))
}
