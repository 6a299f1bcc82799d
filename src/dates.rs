//! Date Validation - Parse, Normalize, Recover
//!
//! Every date-bearing option ends up as a `NormalizedDate`. An unparseable
//! value is reported and replaced by today's date, never by the fallback.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DateValue, DocumentContext, RawConfig, Scalar};
use crate::diagnostics::{Diagnostic, Diagnostics};

const RULE: &str = "dates";

/// A calendar day; always rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDate(NaiveDate);

impl NormalizedDate {
    pub fn parse(value: &DateValue) -> Option<Self> {
        match value {
            DateValue::Timestamp(ms) => DateTime::<Utc>::from_timestamp_millis(*ms).map(|dt| Self(dt.date_naive())),
            DateValue::Text(text) => parse_text(text.trim()).map(Self),
            DateValue::Other(_) => None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// `YYYYMMDD`, as used in dated version names.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Midnight UTC with millisecond precision.
    pub fn iso_timestamp(&self) -> String {
        format!("{}T00:00:00.000Z", self)
    }
}

impl From<NaiveDate> for NormalizedDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

fn parse_text(text: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%m/%d/%Y") {
        return Some(d);
    }
    // Year-month and bare year denote the first day of the period.
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d") {
        return Some(d);
    }
    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}

/// Blank text counts as absent.
fn provided(value: &Option<DateValue>) -> Option<&DateValue> {
    value.as_ref().filter(|v| !v.is_blank())
}

/// Absent → `fallback`; valid → normalized; invalid → reported and today.
pub fn validate_date(
    field: &str,
    value: Option<&DateValue>,
    fallback: NormalizedDate,
    today: NormalizedDate,
    diags: &mut Diagnostics,
) -> NormalizedDate {
    let Some(value) = value else {
        return fallback;
    };
    match NormalizedDate::parse(value) {
        Some(date) => date,
        None => {
            diags.push(
                Diagnostic::error(
                    RULE,
                    format!("{field} is not a valid date: \"{value}\". Expected format 'YYYY-MM-DD'."),
                )
                .with_element(field),
            );
            today
        }
    }
}

/// Output of the date stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDates {
    pub publish_date: NormalizedDate,
    pub publish_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<NormalizedDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_publish_date: Option<NormalizedDate>,
    pub cr_end: NormalizedDate,
    pub pr_end: NormalizedDate,
    pub per_end: NormalizedDate,
    pub revised_rec_end: NormalizedDate,
    pub dash_date: String,
    #[serde(rename = "publishISODate")]
    pub publish_iso_date: String,
    #[serde(rename = "shortISODate")]
    pub short_iso_date: String,
    /// Emptied when it repeats the publish year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_start: Option<Scalar>,
}

pub fn resolve_dates(raw: &RawConfig, ctx: &DocumentContext, diags: &mut Diagnostics) -> ResolvedDates {
    let today = ctx.today;
    let host = ctx.last_modified.unwrap_or(today);
    let check = |field: &str, value: &Option<DateValue>, fallback, diags: &mut Diagnostics| {
        validate_date(field, provided(value), fallback, today, diags)
    };

    let publish_date = check("publishDate", &raw.publish_date, host, diags);
    let modification_date = provided(&raw.modification_date)
        .map(|_| check("modificationDate", &raw.modification_date, host, diags));
    let previous_publish_date = provided(&raw.previous_publish_date)
        .map(|_| check("previousPublishDate", &raw.previous_publish_date, today, diags));

    let cr_end = check("crEnd", &raw.cr_end, today, diags);
    let pr_end = check("prEnd", &raw.pr_end, today, diags);
    let per_end = check("perEnd", &raw.per_end, today, diags);
    let revised_rec_end = check("revisedRecEnd", &raw.revised_rec_end, today, diags);

    let publish_year = publish_date.year();
    let copyright_start = raw.copyright_start.as_ref().map(|start| {
        if scalar_year(start) == Some(publish_year) {
            Scalar::Text(String::new())
        } else {
            start.clone()
        }
    });

    ResolvedDates {
        publish_date,
        publish_year,
        modification_date,
        previous_publish_date,
        cr_end,
        pr_end,
        per_end,
        revised_rec_end,
        dash_date: publish_date.to_string(),
        publish_iso_date: publish_date.iso_timestamp(),
        short_iso_date: publish_date.to_string(),
        copyright_start,
    }
}

fn scalar_year(value: &Scalar) -> Option<i32> {
    match value {
        Scalar::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Scalar::Text(s) => s.trim().parse().ok(),
    }
}
