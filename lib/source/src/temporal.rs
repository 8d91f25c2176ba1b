//! Reconstruction of temporal values that were extracted as epoch seconds.

use rdb2rdf_model::SqlType;
use time::{OffsetDateTime, UtcOffset};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Turns epoch seconds (optionally with a fractional part) into the lexical form of a DATE or
/// TIMESTAMP value in the time zone `offset`.
pub(crate) fn epoch_to_lexical(
    value: &str,
    sql_type: &SqlType,
    offset: UtcOffset,
) -> Result<String, String> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let (seconds, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{value}' is not an epoch timestamp"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{value}' is not an epoch timestamp"));
    }

    let seconds = seconds
        .parse::<i128>()
        .map_err(|error| format!("'{value}' is not an epoch timestamp: {error}"))?;
    let nanos = format!("{fraction:0<9}")
        .get(..9)
        .unwrap_or("0")
        .parse::<i128>()
        .map_err(|error| format!("'{value}' is not an epoch timestamp: {error}"))?;
    let total = seconds
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|total| total.checked_add(nanos))
        .map(|total| if negative { -total } else { total })
        .ok_or_else(|| format!("'{value}' is out of range"))?;

    let date_time = OffsetDateTime::from_unix_timestamp_nanos(total)
        .map_err(|error| format!("'{value}' is out of range: {error}"))?
        .to_offset(offset);

    let date = format!(
        "{:04}-{:02}-{:02}",
        date_time.year(),
        u8::from(date_time.month()),
        date_time.day()
    );
    match sql_type {
        SqlType::Date => Ok(date),
        _ => {
            let mut result = format!(
                "{date}T{:02}:{:02}:{:02}",
                date_time.hour(),
                date_time.minute(),
                date_time.second()
            );
            let nanos = date_time.nanosecond();
            if nanos != 0 {
                let fraction = format!("{nanos:09}");
                result.push('.');
                result.push_str(fraction.trim_end_matches('0'));
            }
            Ok(result)
        }
    }
}
