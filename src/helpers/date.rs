//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, TimeZone};

/// Timestamp layout used by the Prismic API (`2021-03-25T19:25:28+0000`)
const PRISMIC_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a content-store timestamp, accepting RFC 3339 as well
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, PRISMIC_TIMESTAMP)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
}

/// Publication date, e.g. `25 mar 2021`
pub fn publication_date<Tz: TimeZone>(date: &DateTime<Tz>, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format_localized("%d %b %Y", locale).to_string()
}

/// Edit marker, e.g. `*editado em 25 mar 2021 às 19:25`
pub fn edit_date<Tz: TimeZone>(date: &DateTime<Tz>, locale: Locale, prefix: &str, at: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} {} {} {}",
        prefix,
        date.format_localized("%d %b %Y", locale),
        at,
        date.format("%H:%M")
    )
}

/// Format a date in ISO 8601 for `<time datetime>` attributes
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
