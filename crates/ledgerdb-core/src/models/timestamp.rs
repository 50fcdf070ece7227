//! Timestamp helpers shared by the backends.
//!
//! Stored timestamps carry microsecond precision (the resolution of a
//! PostgreSQL `TIMESTAMP`), so every value is truncated before it is written.

use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime, Time};

/// The current UTC time, truncated to microseconds.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    truncate_to_micros(PrimitiveDateTime::new(now.date(), now.time()))
}

pub fn truncate_to_micros(ts: PrimitiveDateTime) -> PrimitiveDateTime {
    let t = ts.time();
    Time::from_hms_micro(t.hour(), t.minute(), t.second(), t.microsecond())
        .map(|time| ts.replace_time(time))
        .unwrap_or(ts)
}

/// Renders `YYYY-MM-DD HH:MM:SS.ffffff`, which sorts lexically in time order.
pub fn format(ts: PrimitiveDateTime) -> Result<String, time::error::Format> {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
    ))
}

pub fn parse(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"),
    )
}
