use crate::error::AppError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

pub fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
