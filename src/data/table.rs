//! Sales Table Module
//! The cleaned, merged, immutable table every query reads from.

use super::cleaning::date_from_epoch_days;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Column names of the raw inputs and of the merged table.
pub mod columns {
    pub const ORDER_ID: &str = "order_id";
    pub const PIZZA_NAME_ID: &str = "pizza_name_id";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const ORDER_DATE: &str = "order_date";
    pub const ORDER_TIME: &str = "order_time";

    pub const PIZZA_TYPE_ID: &str = "pizza_type_id";
    pub const PIZZA_NAME: &str = "pizza_name";
    pub const PIZZA_CATEGORY: &str = "pizza_category";
    pub const PIZZA_SIZE: &str = "pizza_size";

    pub const LINE: &str = "line";
    pub const HOUR: &str = "hour";
    pub const WEEKDAY: &str = "weekday";
    pub const REVENUE: &str = "revenue";

    pub const SALES_REQUIRED: [&str; 6] = [
        ORDER_ID,
        PIZZA_NAME_ID,
        QUANTITY,
        UNIT_PRICE,
        ORDER_DATE,
        ORDER_TIME,
    ];

    pub const TYPES_REQUIRED: [&str; 4] = [PIZZA_TYPE_ID, PIZZA_NAME, PIZZA_CATEGORY, PIZZA_SIZE];

    /// Column layout of the merged table, in order.
    pub const MERGED: [&str; 13] = [
        LINE,
        ORDER_ID,
        PIZZA_NAME_ID,
        PIZZA_TYPE_ID,
        QUANTITY,
        UNIT_PRICE,
        ORDER_DATE,
        WEEKDAY,
        HOUR,
        PIZZA_NAME,
        PIZZA_CATEGORY,
        PIZZA_SIZE,
        REVENUE,
    ];
}

/// Cleaned and joined sales data.
///
/// Built once by the loader and never mutated afterwards; the desktop app
/// shares it behind an `Arc`, filters always produce new frames.
#[derive(Debug, Clone)]
pub struct SalesTable {
    df: DataFrame,
    categories: Vec<String>,
    date_span: Option<(NaiveDate, NaiveDate)>,
}

impl SalesTable {
    pub(crate) fn new(df: DataFrame) -> PolarsResult<Self> {
        let categories: BTreeSet<String> = df
            .column(columns::PIZZA_CATEGORY)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let days = df.column(columns::ORDER_DATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let date_span = match (days.min(), days.max()) {
            (Some(min), Some(max)) => date_from_epoch_days(min).zip(date_from_epoch_days(max)),
            _ => None,
        };

        Ok(Self {
            df,
            categories: categories.into_iter().collect(),
            date_span,
        })
    }

    /// The merged frame, laid out as [`columns::MERGED`].
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    /// Distinct categories, sorted. Missing categories are not listed.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Earliest and latest order date, if any row has a date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }
}
