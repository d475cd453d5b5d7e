//! Date-range derivation for time-bucketed clicks
//!
//! A click on a time bucket carries an anchor such as `"15 Jan 2024"`,
//! `"Q1-2024"` or `"3-2024"`. The anchor is parsed according to the
//! report's interval and expanded to the bucket's bounds in UTC unix
//! seconds. When the filter already holds a range for the same key, the
//! derived range is intersected with it.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

use crate::json::{as_i64, range_value};
use crate::types::XAxis;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Bucket width of a time-grouped chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Day,
    /// Sunday-start week
    Week,
    /// Monday-start week
    IsoWeek,
    /// Two Monday-start weeks
    BiWeek,
    Month,
    Quarter,
    Year,
}

impl Interval {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "day" | "days" => Some(Interval::Day),
            "week" | "weekly" => Some(Interval::Week),
            "isoWeek" | "iso_week" => Some(Interval::IsoWeek),
            "bi_week" | "biweekly" | "bi-weekly" => Some(Interval::BiWeek),
            "month" | "monthly" => Some(Interval::Month),
            "quarter" | "quarterly" => Some(Interval::Quarter),
            "year" | "yearly" => Some(Interval::Year),
            _ => None,
        }
    }

    /// Interval named by a filter, with `week` promoted to ISO when the report
    /// starts its weeks on Monday. Unknown or missing names mean `day`.
    pub fn from_filter(name: Option<&str>, week_starts_on_monday: bool) -> Self {
        match name.and_then(Interval::parse) {
            Some(Interval::Week) if week_starts_on_monday => Interval::IsoWeek,
            Some(interval) => interval,
            None => Interval::Day,
        }
    }
}

/// Which bound of the bucket to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    From,
    To,
}

/// How week buckets are labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekFormat {
    /// `DD MMM YYYY` of the week's first day
    #[default]
    Date,
    /// `WW-YYYY`
    Number,
}

impl WeekFormat {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("number") => WeekFormat::Number,
            _ => WeekFormat::Date,
        }
    }
}

/// A closed range of unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: i64,
    pub to: i64,
}

impl DateRange {
    /// Intersect with an existing `{$gt|$gte, $lt|$lte}` filter value
    pub fn narrow(self, existing: Option<&Value>) -> Self {
        let (lower, upper) = existing.map(existing_bounds).unwrap_or((None, None));
        DateRange {
            from: lower.map_or(self.from, |l| self.from.max(l)),
            to: upper.map_or(self.to, |u| self.to.min(u)),
        }
    }

    /// Narrow the lower bound only
    pub fn narrow_from(self, existing: Option<&Value>) -> Self {
        let lower = existing.and_then(|v| existing_bounds(v).0);
        DateRange {
            from: lower.map_or(self.from, |l| self.from.max(l)),
            to: self.to,
        }
    }

    /// `{"$gt": "<from>", "$lt": "<to>"}`
    pub fn to_value(&self) -> Value {
        range_value(self.from, self.to)
    }

    /// `{"$gte": "<from>", "$lte": "<to>"}`
    pub fn to_inclusive_value(&self) -> Value {
        let mut range = Map::new();
        range.insert("$gte".to_string(), Value::String(self.from.to_string()));
        range.insert("$lte".to_string(), Value::String(self.to.to_string()));
        Value::Object(range)
    }
}

/// Lower and upper bounds of an existing range filter
pub fn existing_bounds(value: &Value) -> (Option<i64>, Option<i64>) {
    let Some(range) = value.as_object() else {
        return (None, None);
    };
    let lower = range
        .get("$gt")
        .and_then(as_i64)
        .or_else(|| range.get("$gte").and_then(as_i64));
    let upper = range
        .get("$lt")
        .and_then(as_i64)
        .or_else(|| range.get("$lte").and_then(as_i64));
    (lower, upper)
}

/// One bound of the bucket `anchor` falls in
pub fn derive(anchor: &XAxis, interval: Interval, edge: Edge, week_format: WeekFormat) -> Option<i64> {
    let range = derive_range(anchor, interval, week_format)?;
    Some(match edge {
        Edge::From => range.from,
        Edge::To => range.to,
    })
}

/// Both bounds of the bucket `anchor` falls in
pub fn derive_range(anchor: &XAxis, interval: Interval, week_format: WeekFormat) -> Option<DateRange> {
    let (date, interval) = match anchor {
        XAxis::Epoch(secs) => (epoch_date(*secs)?, interval),
        XAxis::Label(text) => parse_anchor(text.trim(), interval, week_format)?,
        XAxis::Point(_) | XAxis::Missing => return None,
    };
    bucket(date, interval)
}

/// Range of the calendar day containing `anchor`
pub fn day_range(anchor: &XAxis) -> Option<DateRange> {
    derive_range(anchor, Interval::Day, WeekFormat::Date)
}

/// Range of the bucket starting at `start` unix seconds
pub fn bucket_at(start: i64, interval: Interval) -> Option<DateRange> {
    epoch_date(start).and_then(|date| bucket(date, interval))
}

/// Last second of the UTC day containing `secs`
pub fn end_of_day(secs: i64) -> Option<i64> {
    bucket_at(secs, Interval::Day).map(|r| r.to)
}

/// Parse a `DD MMM YYYY` label to the start of that day
pub fn parse_day_label(text: &str) -> Option<i64> {
    parse_loose(text.trim()).map(start_of_day)
}

/// Parse a date in any of the accepted label shapes, falling back to epochs
pub fn parse_loose_anchor(anchor: &XAxis) -> Option<NaiveDate> {
    match anchor {
        XAxis::Epoch(secs) => epoch_date(*secs),
        XAxis::Label(text) => {
            let text = text.trim();
            epoch_label(text).and_then(epoch_date).or_else(|| parse_loose(text))
        }
        _ => None,
    }
}

/// The bucket containing `date`, or `None` when the bucket runs past the
/// dates chrono can represent
pub fn bucket(date: NaiveDate, interval: Interval) -> Option<DateRange> {
    let (start, next) = match interval {
        Interval::Day => (date, date.checked_add_days(Days::new(1))?),
        Interval::Week => {
            let back = Days::new(u64::from(date.weekday().num_days_from_sunday()));
            let start = date.checked_sub_days(back)?;
            (start, start.checked_add_days(Days::new(7))?)
        }
        Interval::IsoWeek => {
            let start = week_monday(date)?;
            (start, start.checked_add_days(Days::new(7))?)
        }
        Interval::BiWeek => {
            let start = week_monday(date)?;
            (start, start.checked_add_days(Days::new(14))?)
        }
        Interval::Month => {
            let start = first_of_month(date.year(), date.month())?;
            (start, start.checked_add_months(Months::new(1))?)
        }
        Interval::Quarter => {
            let start = first_of_month(date.year(), (date.month0() / 3) * 3 + 1)?;
            (start, start.checked_add_months(Months::new(3))?)
        }
        Interval::Year => {
            let start = first_of_month(date.year(), 1)?;
            (start, start.checked_add_months(Months::new(12))?)
        }
    };
    Some(DateRange {
        from: start_of_day(start),
        to: start_of_day(next) - 1,
    })
}

fn parse_anchor(text: &str, interval: Interval, week_format: WeekFormat) -> Option<(NaiveDate, Interval)> {
    if let Some(secs) = epoch_label(text) {
        return epoch_date(secs).map(|d| (d, interval));
    }
    match interval {
        Interval::Quarter => parse_quarter(text).map(|d| (d, interval)),
        Interval::Week | Interval::IsoWeek | Interval::BiWeek if week_format == WeekFormat::Number => {
            // Week numbers are ISO week numbers whatever the report's week start.
            let monday = parse_week_number(text)?;
            let interval = if interval == Interval::BiWeek {
                Interval::BiWeek
            } else {
                Interval::IsoWeek
            };
            Some((monday, interval))
        }
        Interval::Month => parse_month(text).or_else(|| parse_loose(text)).map(|d| (d, interval)),
        Interval::Year => parse_year(text).or_else(|| parse_loose(text)).map(|d| (d, interval)),
        _ => parse_loose(text).map(|d| (d, interval)),
    }
}

fn epoch_label(text: &str) -> Option<i64> {
    if text.len() >= 9 && text.chars().all(|c| c.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

fn epoch_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

fn quarter_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^Q?([1-4])[-\s](\d{4})$").ok())
        .as_ref()
}

fn week_number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^W?(\d{1,2})-(\d{4})$").ok())
        .as_ref()
}

fn parse_quarter(text: &str) -> Option<NaiveDate> {
    let caps = quarter_pattern()?.captures(text)?;
    let quarter: u32 = caps[1].parse().ok()?;
    let year: i32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
}

fn parse_week_number(text: &str) -> Option<NaiveDate> {
    let caps = week_number_pattern()?.captures(text)?;
    let week: u32 = caps[1].parse().ok()?;
    let year: i32 = caps[2].parse().ok()?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

fn parse_month(text: &str) -> Option<NaiveDate> {
    ["01-%B-%Y", "01 %B %Y"]
        .iter()
        .zip([format!("01-{text}"), format!("01 {text}")])
        .find_map(|(fmt, candidate)| NaiveDate::parse_from_str(&candidate, fmt).ok())
}

fn parse_year(text: &str) -> Option<NaiveDate> {
    if text.len() == 4 {
        text.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    } else {
        None
    }
}

/// Day-precision parse of the label shapes the dashboard emits
fn parse_loose(text: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%d %B %Y", "%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%B %d, %Y", "%d-%B-%Y"];
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }
    ["%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

fn week_monday(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}
