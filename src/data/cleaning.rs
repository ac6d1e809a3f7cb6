//! Field Cleaning Module
//! Parses raw CSV text into typed sales fields.
//!
//! Every parser returns `Result<_, ParseIssueKind>` instead of coercing bad
//! input to a missing value; the loader attaches the line and column and
//! collects the issues into a [`LoadReport`].

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Day names in canonical Monday-first order.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Why a single field could not be cleaned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseIssueKind {
    #[error("empty value")]
    Empty,
    #[error("not a decimal price")]
    InvalidPrice,
    #[error("not a non-negative integer quantity")]
    InvalidQuantity,
    #[error("not a day-first date")]
    InvalidDate,
    #[error("not an HH:MM:SS time")]
    InvalidTime,
}

/// A field that failed to parse. Non-fatal: the field is stored as missing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("line {line}, column `{column}`: {kind} ({raw:?})")]
pub struct ParseIssue {
    /// 1-based data line in the source file (header excluded).
    pub line: usize,
    pub column: &'static str,
    pub raw: String,
    pub kind: ParseIssueKind,
}

/// Summary of one load: row counts, join outcome and every field-level issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub unmatched_rows: usize,
    pub duplicate_type_ids: Vec<String>,
    pub issues: Vec<ParseIssue>,
}

impl LoadReport {
    /// True when nothing was coerced, dropped or deduplicated.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.unmatched_rows == 0 && self.duplicate_type_ids.is_empty()
    }

    /// Issue counts keyed by column name.
    pub fn issues_by_column(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.column).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn record<T>(
        &mut self,
        line: usize,
        column: &'static str,
        raw: Option<&str>,
        parsed: Result<T, ParseIssueKind>,
    ) -> Option<T> {
        match parsed {
            Ok(value) => Some(value),
            Err(kind) => {
                self.issues.push(ParseIssue {
                    line,
                    column,
                    raw: raw.unwrap_or_default().to_string(),
                    kind,
                });
                None
            }
        }
    }
}

fn non_empty(raw: Option<&str>) -> Result<&str, ParseIssueKind> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseIssueKind::Empty),
    }
}

/// Parse a unit price, accepting a comma as decimal separator ("12,50").
pub fn parse_price(raw: Option<&str>) -> Result<f64, ParseIssueKind> {
    let value = non_empty(raw)?;
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or(ParseIssueKind::InvalidPrice)
}

/// Parse a line-item quantity; negative counts are rejected.
pub fn parse_quantity(raw: Option<&str>) -> Result<i64, ParseIssueKind> {
    let value = non_empty(raw)?;
    value
        .parse::<i64>()
        .ok()
        .filter(|qty| *qty >= 0)
        .ok_or(ParseIssueKind::InvalidQuantity)
}

/// Accepted order date layouts, tried in order. Two-digit years come before
/// their four-digit form since `%Y` would also accept `15` as year 15.
const DATE_FORMATS: [&str; 7] = [
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

/// Parse an order date using the day-first convention.
///
/// `DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY` and two-digit years are read
/// day-first; an ISO `YYYY-MM-DD` date keeps its year-first meaning. A
/// trailing time component ("01/02/2015 00:00:00") is ignored.
pub fn parse_order_date(raw: Option<&str>) -> Result<NaiveDate, ParseIssueKind> {
    let value = non_empty(raw)?;
    let date_part = value.split_whitespace().next().unwrap_or(value);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or(ParseIssueKind::InvalidDate)
}

/// Parse a strict `HH:MM:SS` order time and return its hour.
pub fn parse_hour(raw: Option<&str>) -> Result<u32, ParseIssueKind> {
    let value = non_empty(raw)?;
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .map(|time| time.hour())
        .map_err(|_| ParseIssueKind::InvalidTime)
}

/// Join key of a `pizza_name_id`: everything before the last underscore.
///
/// `"bbq_ckn_s"` becomes `"bbq_ckn"`; an identifier without an underscore is
/// its own key.
pub fn pizza_type_key(pizza_name_id: &str) -> &str {
    pizza_name_id
        .rsplit_once('_')
        .map(|(prefix, _)| prefix)
        .unwrap_or(pizza_name_id)
}

/// Monday = 0 ... Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_monday() as i32
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(Duration::days(i64::from(days)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn comma_price_matches_dotted_price() {
        assert_eq!(parse_price(Some("12,50")), Ok(12.5));
        assert_eq!(parse_price(Some("12.50")), Ok(12.5));
        assert_eq!(parse_price(Some(" 20,75 ")), Ok(20.75));
    }

    #[test]
    fn bad_prices_are_issues() {
        assert_eq!(parse_price(None), Err(ParseIssueKind::Empty));
        assert_eq!(parse_price(Some("  ")), Err(ParseIssueKind::Empty));
        assert_eq!(parse_price(Some("abc")), Err(ParseIssueKind::InvalidPrice));
        assert_eq!(parse_price(Some("1,234.50")), Err(ParseIssueKind::InvalidPrice));
        assert_eq!(parse_price(Some("NaN")), Err(ParseIssueKind::InvalidPrice));
    }

    #[test]
    fn quantity_must_be_non_negative_integer() {
        assert_eq!(parse_quantity(Some("3")), Ok(3));
        assert_eq!(parse_quantity(Some("0")), Ok(0));
        assert_eq!(parse_quantity(Some("-1")), Err(ParseIssueKind::InvalidQuantity));
        assert_eq!(parse_quantity(Some("1.5")), Err(ParseIssueKind::InvalidQuantity));
    }

    #[test]
    fn dates_are_day_first() {
        assert_eq!(parse_order_date(Some("01/02/2015")), Ok(date(2015, 2, 1)));
        assert_eq!(parse_order_date(Some("1/2/2015")), Ok(date(2015, 2, 1)));
        assert_eq!(parse_order_date(Some("13-12-2015")), Ok(date(2015, 12, 13)));
        assert_eq!(parse_order_date(Some("31.01.2015")), Ok(date(2015, 1, 31)));
        assert_eq!(parse_order_date(Some("05/06/15")), Ok(date(2015, 6, 5)));
        assert_eq!(parse_order_date(Some("2015-02-01")), Ok(date(2015, 2, 1)));
        assert_eq!(
            parse_order_date(Some("01/02/2015 00:00:00")),
            Ok(date(2015, 2, 1))
        );
    }

    #[test]
    fn impossible_dates_are_issues() {
        assert_eq!(parse_order_date(Some("31/02/2015")), Err(ParseIssueKind::InvalidDate));
        assert_eq!(parse_order_date(Some("12/31/2015")), Err(ParseIssueKind::InvalidDate));
        assert_eq!(parse_order_date(Some("yesterday")), Err(ParseIssueKind::InvalidDate));
        assert_eq!(parse_order_date(Some("")), Err(ParseIssueKind::Empty));
    }

    #[test]
    fn mixed_separators_are_issues() {
        assert_eq!(parse_order_date(Some("01/02-2015")), Err(ParseIssueKind::InvalidDate));
        assert_eq!(parse_order_date(Some("01.02/2015")), Err(ParseIssueKind::InvalidDate));
        assert_eq!(parse_order_date(Some("2015-02/01")), Err(ParseIssueKind::InvalidDate));
    }

    #[test]
    fn hour_comes_from_strict_time() {
        assert_eq!(parse_hour(Some("11:38:36")), Ok(11));
        assert_eq!(parse_hour(Some("23:00:00")), Ok(23));
        assert_eq!(parse_hour(Some("11:38")), Err(ParseIssueKind::InvalidTime));
        assert_eq!(parse_hour(Some("25:00:00")), Err(ParseIssueKind::InvalidTime));
    }

    #[test]
    fn type_key_strips_size_suffix() {
        assert_eq!(pizza_type_key("bbq_ckn_s"), "bbq_ckn");
        assert_eq!(pizza_type_key("hawaiian_xxl"), "hawaiian");
        assert_eq!(pizza_type_key("margherita"), "margherita");
    }

    #[test]
    fn weekday_is_monday_based() {
        // 2015-01-05 was a Monday.
        assert_eq!(weekday_index(date(2015, 1, 5)), 0);
        assert_eq!(weekday_index(date(2015, 1, 11)), 6);
        assert_eq!(WEEKDAY_NAMES[weekday_index(date(2015, 1, 9)) as usize], "Friday");
    }

    #[test]
    fn report_records_issue_with_location() {
        let mut report = LoadReport::default();
        let price = report.record(7, "unit_price", Some("x"), parse_price(Some("x")));
        assert_eq!(price, None);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].line, 7);
        assert_eq!(report.issues_by_column().get("unit_price"), Some(&1));
        assert!(!report.is_clean());
    }

    proptest! {
        #[test]
        fn comma_and_dot_forms_parse_identically(cents in 0u32..1_000_000) {
            let dotted = format!("{}.{:02}", cents / 100, cents % 100);
            let comma = dotted.replace('.', ",");
            prop_assert_eq!(parse_price(Some(&dotted)), parse_price(Some(&comma)));
        }

        #[test]
        fn epoch_days_round_trip(offset in -20_000i32..40_000) {
            let day = date_from_epoch_days(offset).unwrap();
            prop_assert_eq!(epoch_days(day), offset);
        }
    }
}
