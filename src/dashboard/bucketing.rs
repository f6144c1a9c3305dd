//! Aggregation of timestamped amounts into fixed calendar buckets for charts.
//!
//! Records carry their timestamp as a display string, e.g. "15.03.2025, 10:00:00".
//! Records whose timestamp is missing or cannot be parsed are skipped and
//! logged, they never abort an aggregation.

use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

/// The display format for record timestamps, e.g. "15.03.2025, 10:00:00".
pub const DISPLAY_TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day].[month].[year], [hour]:[minute]:[second]");

/// Like [DISPLAY_TIMESTAMP_FORMAT] but also accepts unpadded parts, e.g. "5.3.2025, 9:00:00".
const PARSE_TIMESTAMP_FORMAT: &[BorrowedFormatItem] = format_description!("[day padding:none].[month padding:none].[year], [hour padding:none]:[minute padding:none]:[second padding:none]");

/// Three letter month names, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Three letter weekday names, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// An amount and the display timestamp it was recorded at.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountRecord {
    pub amount: f64,
    pub timestamp: Option<String>,
}

impl AmountRecord {
    #[cfg(test)]
    pub fn new(amount: f64, timestamp: &str) -> Self {
        Self {
            amount,
            timestamp: Some(timestamp.to_owned()),
        }
    }
}

/// One slot of a bucket series.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub value: f64,
    /// Whether the slot covers the period containing "now".
    pub is_current_period: bool,
}

/// Parse a display timestamp such as "15.03.2025, 10:00:00".
///
/// # Errors
/// Returns [Error::UnparseableTimestamp] if `timestamp` does not have the
/// shape of [DISPLAY_TIMESTAMP_FORMAT] or describes an invalid date or time.
pub fn parse_display_timestamp(timestamp: &str) -> Result<PrimitiveDateTime, Error> {
    PrimitiveDateTime::parse(timestamp, PARSE_TIMESTAMP_FORMAT)
        .map_err(|_| Error::UnparseableTimestamp(timestamp.to_owned()))
}

/// Sum record amounts by month of year and label the twelve slots.
///
/// Slot 0 is January. `today` decides which slot is flagged as the current
/// period.
pub fn bucket_by_month(records: &[AmountRecord], labels: &[&str; 12], today: Date) -> Vec<Bucket> {
    let mut sums = [0.0; 12];

    for (amount, date_time) in parsed_records(records) {
        sums[month_index(date_time.date())] += amount;
    }

    let current = month_index(today);

    labelled(&sums, labels, current)
}

/// Sum record amounts by day of week and label the seven slots.
///
/// Slot 0 is Sunday. `today` decides which slot is flagged as the current
/// period.
pub fn bucket_by_weekday(
    records: &[AmountRecord],
    labels: &[&str; 7],
    today: Date,
) -> Vec<Bucket> {
    let mut sums = [0.0; 7];

    for (amount, date_time) in parsed_records(records) {
        sums[weekday_index(date_time.date())] += amount;
    }

    let current = weekday_index(today);

    labelled(&sums, labels, current)
}

/// Iterate over records with a valid timestamp, logging the ones without.
fn parsed_records(
    records: &[AmountRecord],
) -> impl Iterator<Item = (f64, PrimitiveDateTime)> + '_ {
    records.iter().filter_map(|record| {
        let timestamp = record.timestamp.as_deref().filter(|text| !text.is_empty());

        let Some(timestamp) = timestamp else {
            tracing::warn!("skipping record with no timestamp: {record:?}");
            return None;
        };

        match parse_display_timestamp(timestamp) {
            Ok(date_time) => Some((record.amount, date_time)),
            Err(error) => {
                tracing::warn!("skipping record: {error}");
                None
            }
        }
    })
}

fn month_index(date: Date) -> usize {
    usize::from(u8::from(date.month()) - 1)
}

fn weekday_index(date: Date) -> usize {
    usize::from(date.weekday().number_days_from_sunday())
}

fn labelled(sums: &[f64], labels: &[&str], current: usize) -> Vec<Bucket> {
    sums.iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (&value, &label))| Bucket {
            label: label.to_owned(),
            value,
            is_current_period: index == current,
        })
        .collect()
}
