//! Field names of the report form and the per-field checks run before an
//! autosave.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ErrorCode;

/// Every field of the edit form. Only the first three are patched directly;
/// the two relation fields go through the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Published,
    Description,
    CreatedByRef,
    MarkingDefinitions,
}

impl Field {
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Published,
        Self::Description,
        Self::CreatedByRef,
        Self::MarkingDefinitions,
    ];

    /// Wire key used for patches and focus broadcasts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Published => "published",
            Self::Description => "description",
            Self::CreatedByRef => "createdByRef",
            Self::MarkingDefinitions => "markingDefinitions",
        }
    }

    /// Whether the field is saved through a plain field patch.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Name | Self::Published | Self::Description)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "published" => Ok(Self::Published),
            "description" => Ok(Self::Description),
            "createdByRef" | "created_by_ref" | "author" => Ok(Self::CreatedByRef),
            "markingDefinitions" | "marking_definitions" | "markings" => {
                Ok(Self::MarkingDefinitions)
            }
            other => Err(ValidationError::new(
                "field",
                other,
                "unknown report field",
                "use one of: name, published, description, createdByRef, markingDefinitions",
                ErrorCode::UnknownField,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} '{value}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: ErrorCode,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: ErrorCode,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }
}

/// Validate a single field in isolation, as done right before it is saved.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the value breaks the field's rule or the
/// field is not a scalar field.
pub fn validate_at(field: Field, value: &str) -> Result<(), ValidationError> {
    match field {
        Field::Name => validate_name(value),
        Field::Published => validate_published(value),
        Field::Description => Ok(()),
        Field::CreatedByRef | Field::MarkingDefinitions => Err(ValidationError::new(
            field.as_str(),
            value,
            "relation fields cannot be patched as text",
            "change the relation through its own command",
            ErrorCode::UnknownField,
        )),
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(
            "name",
            value,
            "This field is required",
            "provide a non-empty name",
            ErrorCode::InvalidFieldValue,
        ));
    }
    Ok(())
}

fn validate_published(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            "published",
            value,
            "This field is required",
            "provide a publication date",
            ErrorCode::InvalidFieldValue,
        ));
    }
    if parse_date(value).is_none() {
        return Err(ValidationError::new(
            "published",
            value,
            "The value must be a date (YYYY-MM-DD)",
            "use the YYYY-MM-DD format",
            ErrorCode::InvalidFieldValue,
        ));
    }
    Ok(())
}

/// Parse the date forms accepted in the published field.
///
/// RFC 3339 timestamps are converted to UTC before taking the date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Format a server date as `YYYY-MM-DD` for the form.
#[must_use]
pub fn format_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let err = validate_at(Field::Name, "").expect_err("empty name must fail");
        assert_eq!(err.field, "name");
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert!(validate_at(Field::Name, "Operation Sandworm").is_ok());
    }

    #[test]
    fn published_must_be_a_date() {
        assert!(validate_at(Field::Published, "2020-02-29").is_ok());
        assert!(validate_at(Field::Published, "2020-02-29T12:00:00Z").is_ok());
        assert!(validate_at(Field::Published, "2020/02/29").is_ok());

        let err = validate_at(Field::Published, "yesterday").expect_err("must fail");
        assert_eq!(err.reason, "The value must be a date (YYYY-MM-DD)");

        let err = validate_at(Field::Published, "2021-02-29").expect_err("not a leap year");
        assert_eq!(err.field, "published");

        let err = validate_at(Field::Published, "  ").expect_err("blank must fail");
        assert_eq!(err.reason, "This field is required");
    }

    #[test]
    fn description_is_optional() {
        assert!(validate_at(Field::Description, "").is_ok());
        assert!(validate_at(Field::Description, "free text\nwith lines").is_ok());
    }

    #[test]
    fn relation_fields_are_not_patchable() {
        let err = validate_at(Field::MarkingDefinitions, "m-1").expect_err("must fail");
        assert_eq!(err.code, ErrorCode::UnknownField);
    }

    #[test]
    fn field_parse_accepts_wire_and_cli_names() {
        assert_eq!("createdByRef".parse::<Field>(), Ok(Field::CreatedByRef));
        assert_eq!("markings".parse::<Field>(), Ok(Field::MarkingDefinitions));
        assert!("title".parse::<Field>().is_err());
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>(), Ok(field));
        }
    }

    #[test]
    fn format_date_normalizes_to_utc_day() {
        assert_eq!(
            format_date("2019-03-14T23:30:00-02:00").as_deref(),
            Some("2019-03-15")
        );
        assert_eq!(format_date("garbage"), None);
    }
}
