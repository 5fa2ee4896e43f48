use ltrpolicy_core::{AppError, AppResult};
use ltrpolicy_domain::{DEFAULT_WEEK_OF_YEAR, RetentionDuration, RetentionSettings};
use serde::{Deserialize, Serialize};

/// `properties` block of a backup long-term retention policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PolicyProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_retention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_retention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_retention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_of_year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct PolicyRequestBody {
    pub properties: PolicyProperties,
}

#[derive(Debug, Deserialize)]
pub(super) struct PolicyResponseBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Option<PolicyProperties>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArmErrorEnvelope {
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArmErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ArmErrorDetail {
    pub(super) fn describe(&self) -> String {
        match (self.code.as_deref(), self.message.as_deref()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.to_owned(),
            (None, Some(message)) => message.to_owned(),
            (None, None) => "no error details returned".to_owned(),
        }
    }
}

/// Body returned by an `Azure-AsyncOperation` status URL.
#[derive(Debug, Deserialize)]
pub(super) struct AsyncOperationStatusBody {
    pub status: String,
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

impl From<&RetentionSettings> for PolicyRequestBody {
    fn from(retention: &RetentionSettings) -> Self {
        Self {
            properties: PolicyProperties {
                weekly_retention: Some(retention.weekly_retention().as_str().to_owned()),
                monthly_retention: Some(retention.monthly_retention().as_str().to_owned()),
                yearly_retention: Some(retention.yearly_retention().as_str().to_owned()),
                week_of_year: Some(i32::from(retention.week_of_year())),
            },
        }
    }
}

/// Maps provider properties onto settings.
///
/// The provider omits zero settings, so missing durations read as `P0W` and a
/// missing or zero week as week 1.
pub(super) fn flatten_retention(
    properties: Option<PolicyProperties>,
) -> AppResult<RetentionSettings> {
    let properties = properties.unwrap_or_default();
    let duration = |field: &str, value: Option<String>| match value {
        Some(value) if !value.trim().is_empty() => RetentionDuration::new(value).map_err(|error| {
            AppError::RemoteCall(format!("provider returned invalid {field}: {error}"))
        }),
        _ => Ok(RetentionDuration::disabled()),
    };

    let week_of_year = match properties.week_of_year {
        None | Some(0) => DEFAULT_WEEK_OF_YEAR,
        Some(week) => u8::try_from(week).map_err(|_| {
            AppError::RemoteCall(format!("provider returned invalid weekOfYear {week}"))
        })?,
    };

    RetentionSettings::new(
        duration("weeklyRetention", properties.weekly_retention)?,
        duration("monthlyRetention", properties.monthly_retention)?,
        duration("yearlyRetention", properties.yearly_retention)?,
        week_of_year,
    )
    .map_err(|error| AppError::RemoteCall(format!("provider returned invalid policy: {error}")))
}
