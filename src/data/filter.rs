//! Filter Engine
//! Restricts the merged table to a category set and an order-date range.

use super::cleaning::epoch_days;
use super::table::{columns, SalesTable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Date constraint picked by the user.
///
/// A date picker can be left half-filled; that state is kept explicit as
/// `SingleDate` and, like `Unbounded`, does not constrain the dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateRange {
    Unbounded,
    SingleDate(NaiveDate),
    /// Inclusive on both ends; `start <= end`.
    Range(NaiveDate, NaiveDate),
}

impl DateRange {
    /// Inclusive range, swapping reversed bounds.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange::Range(start, end)
        } else {
            DateRange::Range(end, start)
        }
    }

    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Self::between(start, end),
            (Some(single), None) | (None, Some(single)) => DateRange::SingleDate(single),
            (None, None) => DateRange::Unbounded,
        }
    }

    fn predicate(&self) -> Option<Expr> {
        match *self {
            DateRange::Unbounded | DateRange::SingleDate(_) => None,
            DateRange::Range(start, end) => {
                let days = col(columns::ORDER_DATE).cast(DataType::Int32);
                Some(
                    days.clone()
                        .gt_eq(lit(epoch_days(start)))
                        .and(days.lt_eq(lit(epoch_days(end)))),
                )
            }
        }
    }
}

/// Category and date selection driving every dashboard query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub categories: BTreeSet<String>,
    pub dates: DateRange,
}

impl FilterSelection {
    pub fn new(categories: impl IntoIterator<Item = String>, dates: DateRange) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            dates,
        }
    }

    /// Default view: every category over the table's full date span.
    pub fn everything(table: &SalesTable) -> Self {
        let dates = match table.date_span() {
            Some((first, last)) => DateRange::between(first, last),
            None => DateRange::Unbounded,
        };
        Self::new(table.categories().iter().cloned(), dates)
    }

    /// Rows whose category is selected and whose date is in range.
    ///
    /// Never touches the source table. An empty category set selects nothing.
    pub fn apply(&self, table: &SalesTable) -> PolarsResult<DataFrame> {
        let source = table.frame();
        if self.categories.is_empty() {
            debug!("Empty category selection, filtered view is empty");
            return Ok(source.head(Some(0)));
        }

        let in_categories = self
            .categories
            .iter()
            .fold(lit(false), |acc, category| {
                acc.or(col(columns::PIZZA_CATEGORY).eq(lit(category.as_str())))
            });

        let predicate = match self.dates.predicate() {
            Some(dates) => in_categories.and(dates),
            None => in_categories,
        };

        let filtered = source.clone().lazy().filter(predicate).collect()?;
        debug!(
            "Filter {:?} kept {} of {} rows",
            self.dates,
            filtered.height(),
            source.height()
        );
        Ok(filtered)
    }
}
