//! Long-term retention settings and ISO-8601 duration values.

use std::fmt::{Display, Formatter};

use ltrpolicy_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Duration literal that disables a retention slot.
const DISABLED_RETENTION: &str = "P0W";

/// Week of year used when yearly retention is disabled.
pub const DEFAULT_WEEK_OF_YEAR: u8 = 1;

/// Highest week number accepted for the yearly backup.
const MAX_WEEK_OF_YEAR: u8 = 52;

/// Validated ISO-8601 duration such as `P1W`, `P12M` or `P5Y`.
///
/// The input text is kept verbatim so the value the provider reports is
/// reflected back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetentionDuration(String);

impl RetentionDuration {
    /// Parses and validates an ISO-8601 duration.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        validate_iso8601_duration(trimmed)?;
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the zero-length duration used for disabled retention.
    #[must_use]
    pub fn disabled() -> Self {
        Self(DISABLED_RETENTION.to_owned())
    }

    /// Returns the duration text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether every component of the duration is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.chars().filter(char::is_ascii_digit).all(|digit| digit == '0')
    }
}

impl Display for RetentionDuration {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for RetentionDuration {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RetentionDuration> for String {
    fn from(value: RetentionDuration) -> Self {
        value.0
    }
}

/// Accepts `P[nY][nM][nW][nD][T[nH][nM][nS]]` with at least one component.
fn validate_iso8601_duration(value: &str) -> AppResult<()> {
    let invalid = || {
        AppError::Validation(format!(
            "'{value}' is not a valid ISO-8601 duration (expected e.g. P1W, P12M, P5Y)"
        ))
    };

    let body = value.strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((date_part, time_part)) => {
            if time_part.is_empty() {
                return Err(invalid());
            }
            (date_part, Some(time_part))
        }
        None => (body, None),
    };

    let date_components = parse_components(date_part, &['Y', 'M', 'W', 'D']).ok_or_else(invalid)?;
    let time_components = match time_part {
        Some(time_part) => parse_components(time_part, &['H', 'M', 'S']).ok_or_else(invalid)?,
        None => 0,
    };

    if date_components + time_components == 0 {
        return Err(invalid());
    }

    Ok(())
}

/// Returns the number of `<digits><unit>` components, or `None` when the
/// designators are unknown, repeated or out of order.
fn parse_components(part: &str, designators: &[char]) -> Option<usize> {
    let mut count = 0;
    let mut next_designator = 0;
    let mut digits = 0;

    for character in part.chars() {
        if character.is_ascii_digit() {
            digits += 1;
            continue;
        }

        if digits == 0 {
            return None;
        }

        let position = designators[next_designator..]
            .iter()
            .position(|designator| *designator == character)?;
        next_designator += position + 1;
        digits = 0;
        count += 1;
    }

    (digits == 0).then_some(count)
}

/// Complete long-term retention tuple accepted by the provider.
///
/// Deserialization goes through [`RetentionSettingsInput`] so stored state is
/// validated like host input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetentionSettingsInput")]
pub struct RetentionSettings {
    weekly_retention: RetentionDuration,
    monthly_retention: RetentionDuration,
    yearly_retention: RetentionDuration,
    week_of_year: u8,
}

impl RetentionSettings {
    /// Creates retention settings, validating the week of year.
    pub fn new(
        weekly_retention: RetentionDuration,
        monthly_retention: RetentionDuration,
        yearly_retention: RetentionDuration,
        week_of_year: u8,
    ) -> AppResult<Self> {
        if !(1..=MAX_WEEK_OF_YEAR).contains(&week_of_year) {
            return Err(AppError::Validation(format!(
                "week_of_year must be between 1 and {MAX_WEEK_OF_YEAR}, got {week_of_year}"
            )));
        }

        Ok(Self {
            weekly_retention,
            monthly_retention,
            yearly_retention,
            week_of_year,
        })
    }

    /// Returns the settings that switch long-term retention off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            weekly_retention: RetentionDuration::disabled(),
            monthly_retention: RetentionDuration::disabled(),
            yearly_retention: RetentionDuration::disabled(),
            week_of_year: DEFAULT_WEEK_OF_YEAR,
        }
    }

    /// Returns how long weekly backups are kept.
    #[must_use]
    pub fn weekly_retention(&self) -> &RetentionDuration {
        &self.weekly_retention
    }

    /// Returns how long monthly backups are kept.
    #[must_use]
    pub fn monthly_retention(&self) -> &RetentionDuration {
        &self.monthly_retention
    }

    /// Returns how long yearly backups are kept.
    #[must_use]
    pub fn yearly_retention(&self) -> &RetentionDuration {
        &self.yearly_retention
    }

    /// Returns the week whose backup is kept as the yearly backup.
    #[must_use]
    pub fn week_of_year(&self) -> u8 {
        self.week_of_year
    }

    /// Returns whether no backup is retained at all.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.weekly_retention.is_zero()
            && self.monthly_retention.is_zero()
            && self.yearly_retention.is_zero()
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Host-side retention block where every field is optional.
///
/// Omitted durations fall back to `P0W` and an omitted week to `1`, because
/// the provider always expects the full tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettingsInput {
    /// Weekly retention duration.
    #[serde(default)]
    pub weekly_retention: Option<String>,
    /// Monthly retention duration.
    #[serde(default)]
    pub monthly_retention: Option<String>,
    /// Yearly retention duration.
    #[serde(default)]
    pub yearly_retention: Option<String>,
    /// Week of year for the yearly backup.
    #[serde(default)]
    pub week_of_year: Option<u8>,
}

impl TryFrom<RetentionSettingsInput> for RetentionSettings {
    type Error = AppError;

    fn try_from(input: RetentionSettingsInput) -> Result<Self, Self::Error> {
        let duration = |field: &str, value: Option<String>| match value {
            Some(value) => RetentionDuration::new(value)
                .map_err(|error| error.with_context(format!("`{field}`"))),
            None => Ok(RetentionDuration::disabled()),
        };

        Self::new(
            duration("weekly_retention", input.weekly_retention)?,
            duration("monthly_retention", input.monthly_retention)?,
            duration("yearly_retention", input.yearly_retention)?,
            input.week_of_year.unwrap_or(DEFAULT_WEEK_OF_YEAR),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{RetentionDuration, RetentionSettings, RetentionSettingsInput};

    #[test]
    fn duration_accepts_common_retention_values() {
        for value in ["P0W", "P1W", "P12M", "P5Y", "P1Y2M3W4D", "P30D", "PT12H", "P1DT2H3M4S"] {
            assert!(RetentionDuration::new(value).is_ok(), "{value} should parse");
        }
    }

    #[test]
    fn duration_rejects_malformed_values() {
        for value in ["", "P", "1W", "PW", "P1", "P1X", "PT", "P1W1Y", "P1Y1Y", "p1w", "P-1W"] {
            assert!(RetentionDuration::new(value).is_err(), "{value} should fail");
        }
    }

    #[test]
    fn zero_durations_are_detected() {
        assert!(RetentionDuration::disabled().is_zero());
        assert!(
            RetentionDuration::new("PT0S")
                .map(|duration| duration.is_zero())
                .unwrap_or(false)
        );
        assert!(
            !RetentionDuration::new("P10W")
                .map(|duration| duration.is_zero())
                .unwrap_or(true)
        );
    }

    #[test]
    fn settings_reject_week_out_of_range() {
        for week in [0, 53] {
            let settings = RetentionSettings::new(
                RetentionDuration::disabled(),
                RetentionDuration::disabled(),
                RetentionDuration::disabled(),
                week,
            );
            assert!(settings.is_err());
        }
    }

    #[test]
    fn omitted_input_fields_fall_back_to_disabled_values() {
        let settings = RetentionSettings::try_from(RetentionSettingsInput {
            weekly_retention: Some("P2W".to_owned()),
            ..RetentionSettingsInput::default()
        });

        assert!(settings.is_ok());
        let settings = settings.unwrap_or_else(|_| unreachable!());
        assert_eq!(settings.weekly_retention().as_str(), "P2W");
        assert_eq!(settings.monthly_retention().as_str(), "P0W");
        assert_eq!(settings.yearly_retention().as_str(), "P0W");
        assert_eq!(settings.week_of_year(), 1);
        assert!(!settings.is_disabled());
    }

    #[test]
    fn input_error_names_the_offending_field() {
        let settings = RetentionSettings::try_from(RetentionSettingsInput {
            monthly_retention: Some("monthly".to_owned()),
            ..RetentionSettingsInput::default()
        });

        let message = settings.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("`monthly_retention`"));
    }

    #[test]
    fn disabled_settings_use_canonical_values() {
        let settings = RetentionSettings::disabled();
        assert_eq!(settings.weekly_retention().as_str(), "P0W");
        assert_eq!(settings.monthly_retention().as_str(), "P0W");
        assert_eq!(settings.yearly_retention().as_str(), "P0W");
        assert_eq!(settings.week_of_year(), 1);
        assert!(settings.is_disabled());
    }

    #[test]
    fn deserialized_settings_are_validated() {
        let out_of_range = serde_json::from_value::<RetentionSettings>(serde_json::json!({
            "weekly_retention": "P1W",
            "monthly_retention": "P0W",
            "yearly_retention": "P0W",
            "week_of_year": 0
        }));
        assert!(out_of_range.is_err());

        let partial = serde_json::from_value::<RetentionSettings>(serde_json::json!({
            "weekly_retention": "P1W"
        }));
        assert!(partial.is_ok());
        let partial = partial.unwrap_or_else(|_| unreachable!());
        assert_eq!(partial.week_of_year(), 1);
        assert_eq!(partial.yearly_retention().as_str(), "P0W");
    }
}
