//! CSV Data Loader Module
//! Reads the sales and pizza-type files, cleans every field and joins them
//! into a [`SalesTable`] using Polars.

use super::cleaning::{
    epoch_days, parse_hour, parse_order_date, parse_price, parse_quantity, pizza_type_key,
    weekday_index, LoadReport,
};
use super::table::{columns, SalesTable};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder written into name/category/size when unmatched rows are imputed.
pub const UNKNOWN: &str = "Unknown";

/// Marker column added to the types frame to detect join misses.
const TYPE_MATCHED: &str = "type_matched";

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Failed to read CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{} is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("Failed to build sales table: {0}")]
    Frame(#[from] PolarsError),
}

/// What to do with sales rows whose pizza type is absent from the types file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UnmatchedPolicy {
    /// Remove them from the merged table.
    #[default]
    Drop,
    /// Keep them with name, category and size set to [`UNKNOWN`].
    Impute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadOptions {
    pub unmatched: UnmatchedPolicy,
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub table: SalesTable,
    pub report: LoadReport,
}

/// Cleaned sales columns, one entry per source row.
#[derive(Default)]
struct SalesColumns {
    line: Vec<i64>,
    order_id: Vec<Option<String>>,
    pizza_name_id: Vec<Option<String>>,
    pizza_type_id: Vec<String>,
    quantity: Vec<Option<i64>>,
    unit_price: Vec<Option<f64>>,
    order_date: Vec<Option<i32>>,
    weekday: Vec<Option<i32>>,
    hour: Vec<Option<i32>>,
}

/// Loads and merges the two input files.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    options: LoadOptions,
}

impl DataLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Load both files, clean them and join them into one table.
    ///
    /// Field-level problems end up in the returned [`LoadReport`]; only a
    /// missing file, an unreadable CSV or a missing column is an error.
    pub fn load(&self, sales_path: &Path, types_path: &Path) -> Result<LoadedData, DataLoadError> {
        info!(
            "Loading sales from {} and pizza types from {}",
            sales_path.display(),
            types_path.display()
        );

        let raw_sales = Self::read_csv(sales_path, &columns::SALES_REQUIRED)?;
        let raw_types = Self::read_csv(types_path, &columns::TYPES_REQUIRED)?;

        let mut report = LoadReport {
            rows_read: raw_sales.height(),
            ..LoadReport::default()
        };

        let sales = Self::clean_sales(&raw_sales, &mut report)?;
        let types = Self::clean_types(&raw_types, &mut report)?;

        let joined = sales
            .lazy()
            .join(
                types.lazy(),
                [col(columns::PIZZA_TYPE_ID)],
                [col(columns::PIZZA_TYPE_ID)],
                JoinArgs::new(JoinType::Left),
            )
            .sort([columns::LINE], SortMultipleOptions::default())
            .collect()?;

        report.unmatched_rows = joined.column(TYPE_MATCHED)?.null_count();
        if report.unmatched_rows > 0 {
            warn!(
                "{} sales rows have no matching pizza type ({:?} policy)",
                report.unmatched_rows, self.options.unmatched
            );
        }

        let resolved = match self.options.unmatched {
            UnmatchedPolicy::Drop => joined.lazy().filter(col(TYPE_MATCHED).is_not_null()),
            UnmatchedPolicy::Impute => joined.lazy().with_columns([
                col(columns::PIZZA_NAME).fill_null(lit(UNKNOWN)),
                col(columns::PIZZA_CATEGORY).fill_null(lit(UNKNOWN)),
                col(columns::PIZZA_SIZE).fill_null(lit(UNKNOWN)),
            ]),
        };

        let merged = resolved
            .with_column(
                (col(columns::QUANTITY).cast(DataType::Float64) * col(columns::UNIT_PRICE))
                    .alias(columns::REVENUE),
            )
            .select(columns::MERGED.map(col))
            .collect()?;

        report.rows_loaded = merged.height();
        if !report.issues.is_empty() {
            warn!(
                "{} fields could not be parsed and were stored as missing: {:?}",
                report.issues.len(),
                report.issues_by_column()
            );
        }
        info!(
            "Loaded {} of {} sales rows",
            report.rows_loaded, report.rows_read
        );

        Ok(LoadedData {
            table: SalesTable::new(merged)?,
            report,
        })
    }

    /// Read a CSV with every column as text, then check the required columns.
    fn read_csv(path: &Path, required: &[&str]) -> Result<DataFrame, DataLoadError> {
        if !path.is_file() {
            return Err(DataLoadError::MissingFile(path.to_path_buf()));
        }

        // Schema inference is disabled so that cleaning sees the raw text.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| DataLoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        debug!("Read {} rows from {}", df.height(), path.display());
        Ok(df)
    }

    fn text_column<'a>(df: &'a DataFrame, name: &str) -> PolarsResult<&'a StringChunked> {
        df.column(name)?.str()
    }

    fn clean_sales(raw: &DataFrame, report: &mut LoadReport) -> PolarsResult<DataFrame> {
        let order_ids = Self::text_column(raw, columns::ORDER_ID)?;
        let name_ids = Self::text_column(raw, columns::PIZZA_NAME_ID)?;
        let quantities = Self::text_column(raw, columns::QUANTITY)?;
        let prices = Self::text_column(raw, columns::UNIT_PRICE)?;
        let dates = Self::text_column(raw, columns::ORDER_DATE)?;
        let times = Self::text_column(raw, columns::ORDER_TIME)?;

        let mut out = SalesColumns::default();

        for i in 0..raw.height() {
            let line = i + 1;

            let order_id = order_ids
                .get(i)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            let name_id = name_ids.get(i).map(str::trim).unwrap_or_default();

            let raw_qty = quantities.get(i);
            let quantity = report.record(line, columns::QUANTITY, raw_qty, parse_quantity(raw_qty));

            let raw_price = prices.get(i);
            let unit_price =
                report.record(line, columns::UNIT_PRICE, raw_price, parse_price(raw_price));

            let raw_date = dates.get(i);
            let order_date =
                report.record(line, columns::ORDER_DATE, raw_date, parse_order_date(raw_date));

            let raw_time = times.get(i);
            let hour = report.record(line, columns::ORDER_TIME, raw_time, parse_hour(raw_time));

            out.line.push(line as i64);
            out.order_id.push(order_id);
            out.pizza_type_id.push(pizza_type_key(name_id).to_string());
            out.pizza_name_id
                .push(Some(name_id.to_string()).filter(|id| !id.is_empty()));
            out.quantity.push(quantity);
            out.unit_price.push(unit_price);
            out.order_date.push(order_date.map(epoch_days));
            out.weekday.push(order_date.map(weekday_index));
            out.hour.push(hour.map(|h| h as i32));
        }

        DataFrame::new(vec![
            Column::new(columns::LINE.into(), out.line),
            Column::new(columns::ORDER_ID.into(), out.order_id),
            Column::new(columns::PIZZA_NAME_ID.into(), out.pizza_name_id),
            Column::new(columns::PIZZA_TYPE_ID.into(), out.pizza_type_id),
            Column::new(columns::QUANTITY.into(), out.quantity),
            Column::new(columns::UNIT_PRICE.into(), out.unit_price),
            Column::new(columns::ORDER_DATE.into(), out.order_date).cast(&DataType::Date)?,
            Column::new(columns::WEEKDAY.into(), out.weekday),
            Column::new(columns::HOUR.into(), out.hour),
        ])
    }

    /// Trim the type attributes and keep the first row of every type id.
    fn clean_types(raw: &DataFrame, report: &mut LoadReport) -> PolarsResult<DataFrame> {
        let ids = Self::text_column(raw, columns::PIZZA_TYPE_ID)?;
        let names = Self::text_column(raw, columns::PIZZA_NAME)?;
        let categories = Self::text_column(raw, columns::PIZZA_CATEGORY)?;
        let sizes = Self::text_column(raw, columns::PIZZA_SIZE)?;

        let text = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut out_ids = Vec::new();
        let mut out_names = Vec::new();
        let mut out_categories = Vec::new();
        let mut out_sizes = Vec::new();

        for i in 0..raw.height() {
            let Some(id) = text(ids.get(i)) else {
                continue;
            };
            if seen.contains_key(&id) {
                if !report.duplicate_type_ids.contains(&id) {
                    report.duplicate_type_ids.push(id);
                }
                continue;
            }
            seen.insert(id.clone(), i);

            out_ids.push(id);
            out_names.push(text(names.get(i)));
            out_categories.push(text(categories.get(i)));
            out_sizes.push(text(sizes.get(i)));
        }

        if !report.duplicate_type_ids.is_empty() {
            warn!(
                "Duplicate pizza type ids kept at first occurrence: {}",
                report.duplicate_type_ids.join(", ")
            );
        }

        let matched = vec![true; out_ids.len()];
        DataFrame::new(vec![
            Column::new(columns::PIZZA_TYPE_ID.into(), out_ids),
            Column::new(columns::PIZZA_NAME.into(), out_names),
            Column::new(columns::PIZZA_CATEGORY.into(), out_categories),
            Column::new(columns::PIZZA_SIZE.into(), out_sizes),
            Column::new(TYPE_MATCHED.into(), matched),
        ])
    }
}
