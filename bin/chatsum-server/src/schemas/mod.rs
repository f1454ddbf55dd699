//! Request / response DTO (Data Transfer Object) types.
//!
//! These types are used by Axum handlers for JSON (de)serialisation, are
//! validated with [`validator`], and are annotated with [`utoipa`] attributes
//! to generate an OpenAPI 3.0 schema.

pub mod chat;
pub mod summary;

use validator::ValidationError;

use crate::entities::parse_timestamp;

/// Accept RFC 3339 timestamps, naive ISO-8601 date-times and plain dates.
pub(crate) fn iso8601(value: &str) -> Result<(), ValidationError> {
    if parse_timestamp(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("iso8601");
        err.message = Some(format!("'{value}' is not an ISO-8601 timestamp").into());
        Err(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_common_iso_forms() {
        for value in [
            "2024-03-01T12:30:00Z",
            "2024-03-01T12:30:00.123456+02:00",
            "2024-03-01T12:30:00.123456",
            "2024-03-01T12:30:00",
            "2024-03-01T12:30",
            "2024-03-01",
        ] {
            assert!(iso8601(value).is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn rejects_garbage() {
        for value in ["yesterday", "2024-13-01", "", "01/03/2024"] {
            assert!(iso8601(value).is_err(), "{value} should be rejected");
        }
    }
}
