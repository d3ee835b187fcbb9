use crate::error::AppError;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATETIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
];
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const STORED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const STORED_FORMAT_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Parses a local deadline such as `2025-12-25T10:00`, `2025-12-25 10:00:30`
/// or `2025-12-25` (midnight).
pub fn parse_deadline(raw: &str) -> Result<PrimitiveDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::missing_deadline());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, *format) {
            return Ok(parsed);
        }
    }

    Date::parse(trimmed, DATE_FORMAT)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        .map_err(|_| {
            AppError::invalid_input(format!(
                "deadline '{trimmed}' must look like YYYY-MM-DDTHH:MM"
            ))
        })
}

/// Canonical form kept on committed tasks.
pub fn normalize_deadline(raw: &str) -> Result<String, AppError> {
    let parsed = parse_deadline(raw)?;
    let format = if parsed.second() == 0 {
        STORED_FORMAT
    } else {
        STORED_FORMAT_SECONDS
    };
    parsed
        .format(format)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn display_deadline(stored: &str) -> Result<String, AppError> {
    parse_deadline(stored)?
        .format(DISPLAY_FORMAT)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn deadline_passed(stored: &str) -> Result<bool, AppError> {
    let deadline = parse_deadline(stored)?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    Ok(deadline.assume_offset(offset) < now)
}
