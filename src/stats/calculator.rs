//! Report Calculator Module
//! Grouped summaries and KPI scalars over a filtered sales frame.
//!
//! Every query is a pure function of the frame it is given. Grouping and
//! aggregation run through Polars; ordering and top-N selection happen on the
//! small grouped result so ties break deterministically.

use crate::data::{columns, WEEKDAY_NAMES};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Number of pizzas shown in the top and weak seller rankings.
pub const RANKING_SIZE: usize = 5;

/// Size order used by the average-ticket chart.
pub const TICKET_SIZE_ORDER: [&str; 4] = ["S", "M", "L", "XL"];
/// Size order used by the average-price chart.
pub const PRICE_SIZE_ORDER: [&str; 5] = ["S", "M", "L", "XL", "XXL"];

const ORDERS: &str = "orders";
const BASKET: &str = "basket";

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// How the size of an order's basket is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BasketMeasure {
    /// Sum of quantities in the order.
    #[default]
    TotalQuantity,
    /// Number of distinct pizza name-and-size identifiers in the order.
    DistinctLines,
}

/// Headline numbers shown on the KPI cards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_pizzas: i64,
    pub unique_orders: usize,
    /// Revenue per order; 0 when there are no orders.
    pub average_ticket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PizzaRevenue {
    pub pizza_name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PizzaVolume {
    pub pizza_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyDemand {
    pub hour: u32,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayDemand {
    pub weekday: &'static str,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeShare {
    pub size: String,
    pub quantity: i64,
    pub revenue: f64,
    /// Fraction of all pizzas sold in this size.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeTicket {
    pub size: String,
    pub revenue: f64,
    pub orders: u64,
    pub average_ticket: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasketBin {
    pub basket_size: i64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizePrice {
    pub size: String,
    pub average_unit_price: f64,
}

/// Order of a size label: listed sizes first, anything else alphabetically after.
fn size_rank<'a>(order: &[&str], size: &'a str) -> (usize, &'a str) {
    let rank = order.iter().position(|s| *s == size).unwrap_or(order.len());
    (rank, size)
}

fn sort_by_size<T>(rows: &mut [T], order: &[&str], size: impl Fn(&T) -> &str) {
    rows.sort_by(|a, b| size_rank(order, size(a)).cmp(&size_rank(order, size(b))));
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Computes the dashboard queries.
pub struct ReportCalculator;

impl ReportCalculator {
    /// Group by `key` (null keys removed) and apply `aggs`.
    fn grouped<E: AsRef<[Expr]>>(df: &DataFrame, key: &str, aggs: E) -> QueryResult<DataFrame> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(key).is_not_null())
            .group_by([col(key)])
            .agg(aggs)
            .collect()?;
        Ok(grouped)
    }

    /// Total revenue, pizzas, distinct orders and average ticket.
    pub fn kpis(df: &DataFrame) -> QueryResult<Kpis> {
        let total_revenue = df.column(columns::REVENUE)?.f64()?.sum().unwrap_or(0.0);
        let total_pizzas = df.column(columns::QUANTITY)?.i64()?.sum().unwrap_or(0);
        let unique_orders = df
            .column(columns::ORDER_ID)?
            .as_materialized_series()
            .drop_nulls()
            .n_unique()?;

        Ok(Kpis {
            total_revenue,
            total_pizzas,
            unique_orders,
            average_ticket: safe_ratio(total_revenue, unique_orders as f64),
        })
    }

    /// Pizzas with the highest summed revenue, best first.
    pub fn top_sellers(df: &DataFrame, n: usize) -> QueryResult<Vec<PizzaRevenue>> {
        let grouped = Self::grouped(df, columns::PIZZA_NAME, [col(columns::REVENUE).sum()])?;
        let names = grouped.column(columns::PIZZA_NAME)?.str()?;
        let revenue = grouped.column(columns::REVENUE)?.f64()?;

        let mut rows: Vec<PizzaRevenue> = names
            .into_iter()
            .zip(revenue.into_iter())
            .filter_map(|(name, revenue)| {
                Some(PizzaRevenue {
                    pizza_name: name?.to_string(),
                    revenue: revenue.unwrap_or(0.0),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then_with(|| a.pizza_name.cmp(&b.pizza_name))
        });
        rows.truncate(n);
        Ok(rows)
    }

    /// Pizzas with the lowest summed quantity, weakest first.
    pub fn weak_sellers(df: &DataFrame, n: usize) -> QueryResult<Vec<PizzaVolume>> {
        let grouped = Self::grouped(df, columns::PIZZA_NAME, [col(columns::QUANTITY).sum()])?;
        let names = grouped.column(columns::PIZZA_NAME)?.str()?;
        let quantity = grouped.column(columns::QUANTITY)?.i64()?;

        let mut rows: Vec<PizzaVolume> = names
            .into_iter()
            .zip(quantity.into_iter())
            .filter_map(|(name, quantity)| {
                Some(PizzaVolume {
                    pizza_name: name?.to_string(),
                    quantity: quantity.unwrap_or(0),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.quantity
                .cmp(&b.quantity)
                .then_with(|| a.pizza_name.cmp(&b.pizza_name))
        });
        rows.truncate(n);
        Ok(rows)
    }

    /// Pizzas sold per hour of day, for the hours that have sales.
    pub fn hourly_demand(df: &DataFrame) -> QueryResult<Vec<HourlyDemand>> {
        let grouped = Self::grouped(df, columns::HOUR, [col(columns::QUANTITY).sum()])?;
        let hours = grouped.column(columns::HOUR)?.i32()?;
        let quantity = grouped.column(columns::QUANTITY)?.i64()?;

        let mut rows: Vec<HourlyDemand> = hours
            .into_iter()
            .zip(quantity.into_iter())
            .filter_map(|(hour, quantity)| {
                Some(HourlyDemand {
                    hour: u32::try_from(hour?).ok()?,
                    quantity: quantity.unwrap_or(0),
                })
            })
            .collect();
        rows.sort_by_key(|row| row.hour);
        Ok(rows)
    }

    /// Pizzas sold per weekday, Monday to Sunday; days without sales are 0.
    pub fn weekly_demand(df: &DataFrame) -> QueryResult<Vec<WeekdayDemand>> {
        let grouped = Self::grouped(df, columns::WEEKDAY, [col(columns::QUANTITY).sum()])?;
        let days = grouped.column(columns::WEEKDAY)?.i32()?;
        let quantity = grouped.column(columns::QUANTITY)?.i64()?;

        let mut totals = [0i64; 7];
        for (day, qty) in days.into_iter().zip(quantity.into_iter()) {
            let slot = day
                .and_then(|d| usize::try_from(d).ok())
                .and_then(|d| totals.get_mut(d));
            if let Some(slot) = slot {
                *slot += qty.unwrap_or(0);
            }
        }

        Ok(WEEKDAY_NAMES
            .into_iter()
            .zip(totals)
            .map(|(weekday, quantity)| WeekdayDemand { weekday, quantity })
            .collect())
    }

    /// Quantity and revenue per size with each size's share of pizzas sold.
    pub fn size_mix(df: &DataFrame) -> QueryResult<Vec<SizeShare>> {
        let grouped = Self::grouped(
            df,
            columns::PIZZA_SIZE,
            [col(columns::QUANTITY).sum(), col(columns::REVENUE).sum()],
        )?;
        let sizes = grouped.column(columns::PIZZA_SIZE)?.str()?;
        let quantity = grouped.column(columns::QUANTITY)?.i64()?;
        let revenue = grouped.column(columns::REVENUE)?.f64()?;
        let total = quantity.sum().unwrap_or(0) as f64;

        let mut rows: Vec<SizeShare> = sizes
            .into_iter()
            .zip(quantity.into_iter())
            .zip(revenue.into_iter())
            .filter_map(|((size, qty), rev)| {
                let qty = qty.unwrap_or(0);
                Some(SizeShare {
                    size: size?.to_string(),
                    quantity: qty,
                    revenue: rev.unwrap_or(0.0),
                    share: safe_ratio(qty as f64, total),
                })
            })
            .collect();
        sort_by_size(&mut rows, &PRICE_SIZE_ORDER, |row| row.size.as_str());
        Ok(rows)
    }

    /// Quantity and revenue per category, highest revenue first.
    pub fn category_mix(df: &DataFrame) -> QueryResult<Vec<CategoryRevenue>> {
        let grouped = Self::grouped(
            df,
            columns::PIZZA_CATEGORY,
            [col(columns::QUANTITY).sum(), col(columns::REVENUE).sum()],
        )?;
        let categories = grouped.column(columns::PIZZA_CATEGORY)?.str()?;
        let quantity = grouped.column(columns::QUANTITY)?.i64()?;
        let revenue = grouped.column(columns::REVENUE)?.f64()?;

        let mut rows: Vec<CategoryRevenue> = categories
            .into_iter()
            .zip(quantity.into_iter())
            .zip(revenue.into_iter())
            .filter_map(|((category, qty), rev)| {
                Some(CategoryRevenue {
                    category: category?.to_string(),
                    quantity: qty.unwrap_or(0),
                    revenue: rev.unwrap_or(0.0),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }

    /// Revenue per size divided by the distinct orders containing that size.
    pub fn average_ticket_by_size(df: &DataFrame) -> QueryResult<Vec<SizeTicket>> {
        let grouped = Self::grouped(
            df,
            columns::PIZZA_SIZE,
            [
                col(columns::REVENUE).sum(),
                col(columns::ORDER_ID)
                    .drop_nulls()
                    .n_unique()
                    .cast(DataType::UInt64)
                    .alias(ORDERS),
            ],
        )?;
        let sizes = grouped.column(columns::PIZZA_SIZE)?.str()?;
        let revenue = grouped.column(columns::REVENUE)?.f64()?;
        let orders = grouped.column(ORDERS)?.u64()?;

        let mut rows: Vec<SizeTicket> = sizes
            .into_iter()
            .zip(revenue.into_iter())
            .zip(orders.into_iter())
            .filter_map(|((size, rev), orders)| {
                let revenue = rev.unwrap_or(0.0);
                let orders = orders.unwrap_or(0);
                Some(SizeTicket {
                    size: size?.to_string(),
                    revenue,
                    orders,
                    average_ticket: safe_ratio(revenue, orders as f64),
                })
            })
            .collect();
        sort_by_size(&mut rows, &TICKET_SIZE_ORDER, |row| row.size.as_str());
        Ok(rows)
    }

    /// Histogram of basket sizes: how many orders had each basket size.
    pub fn basket_distribution(
        df: &DataFrame,
        measure: BasketMeasure,
    ) -> QueryResult<Vec<BasketBin>> {
        let basket = match measure {
            BasketMeasure::TotalQuantity => col(columns::QUANTITY).sum().alias(BASKET),
            BasketMeasure::DistinctLines => col(columns::PIZZA_NAME_ID)
                .drop_nulls()
                .n_unique()
                .cast(DataType::Int64)
                .alias(BASKET),
        };
        let per_order = Self::grouped(df, columns::ORDER_ID, [basket])?;
        let sizes = per_order.column(BASKET)?.i64()?;

        let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
        for size in sizes.into_iter().flatten() {
            *histogram.entry(size).or_insert(0) += 1;
        }

        Ok(histogram
            .into_iter()
            .map(|(basket_size, orders)| BasketBin { basket_size, orders })
            .collect())
    }

    /// Mean unit price per size; sizes without any known price are skipped.
    pub fn average_price_by_size(df: &DataFrame) -> QueryResult<Vec<SizePrice>> {
        let grouped = Self::grouped(df, columns::PIZZA_SIZE, [col(columns::UNIT_PRICE).mean()])?;
        let sizes = grouped.column(columns::PIZZA_SIZE)?.str()?;
        let prices = grouped.column(columns::UNIT_PRICE)?.f64()?;

        let mut rows: Vec<SizePrice> = sizes
            .into_iter()
            .zip(prices.into_iter())
            .filter_map(|(size, price)| {
                Some(SizePrice {
                    size: size?.to_string(),
                    average_unit_price: price?,
                })
            })
            .collect();
        sort_by_size(&mut rows, &PRICE_SIZE_ORDER, |row| row.size.as_str());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;
    use crate::data::{DateRange, FilterSelection};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn all_rows() -> DataFrame {
        fixture_table().frame().clone()
    }

    fn no_rows() -> DataFrame {
        let table = fixture_table();
        FilterSelection::new(Vec::new(), DateRange::Unbounded)
            .apply(&table)
            .unwrap()
    }

    #[test]
    fn kpis_over_fixture() {
        let kpis = ReportCalculator::kpis(&all_rows()).unwrap();
        assert!(close(kpis.total_revenue, 239.2));
        assert_eq!(kpis.total_pizzas, 13);
        assert_eq!(kpis.unique_orders, 6);
        assert!(close(kpis.average_ticket, 239.2 / 6.0));
    }

    #[test]
    fn kpis_degrade_to_zero_on_empty_selection() {
        let kpis = ReportCalculator::kpis(&no_rows()).unwrap();
        assert_eq!(kpis, Kpis::default());
        assert_eq!(kpis.average_ticket, 0.0);
    }

    #[test]
    fn top_sellers_rank_by_revenue() {
        let top = ReportCalculator::top_sellers(&all_rows(), RANKING_SIZE).unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.pizza_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "The Barbecue Chicken Pizza",
                "The Hawaiian Pizza",
                "The Classic Deluxe Pizza",
                "The Greek Pizza",
                "The Italian Supreme Pizza",
            ]
        );
        assert!(close(top[0].revenue, 75.0));
    }

    #[test]
    fn weak_sellers_rank_by_quantity_then_name() {
        let weak = ReportCalculator::weak_sellers(&all_rows(), RANKING_SIZE).unwrap();
        let ranked: Vec<(&str, i64)> = weak
            .iter()
            .map(|r| (r.pizza_name.as_str(), r.quantity))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("The Five Cheese Pizza", 1),
                ("The Greek Pizza", 1),
                ("The Italian Supreme Pizza", 1),
                ("The Barbecue Chicken Pizza", 3),
                ("The Classic Deluxe Pizza", 3),
            ]
        );
    }

    #[test]
    fn hourly_demand_is_sorted_by_hour() {
        let hourly = ReportCalculator::hourly_demand(&all_rows()).unwrap();
        let pairs: Vec<(u32, i64)> = hourly.iter().map(|h| (h.hour, h.quantity)).collect();
        assert_eq!(pairs, vec![(11, 4), (12, 4), (13, 1), (18, 4)]);
    }

    #[test]
    fn weekly_demand_lists_every_day_monday_first() {
        let weekly = ReportCalculator::weekly_demand(&all_rows()).unwrap();
        let pairs: Vec<(&str, i64)> = weekly.iter().map(|d| (d.weekday, d.quantity)).collect();
        assert_eq!(
            pairs,
            vec![
                ("Monday", 4),
                ("Tuesday", 1),
                ("Wednesday", 0),
                ("Thursday", 4),
                ("Friday", 3),
                ("Saturday", 1),
                ("Sunday", 0),
            ]
        );
        let empty = ReportCalculator::weekly_demand(&no_rows()).unwrap();
        assert!(empty.iter().all(|d| d.quantity == 0));
    }

    #[test]
    fn size_mix_partitions_revenue_and_quantity() {
        let df = all_rows();
        let mix = ReportCalculator::size_mix(&df).unwrap();
        let kpis = ReportCalculator::kpis(&df).unwrap();

        let sizes: Vec<&str> = mix.iter().map(|s| s.size.as_str()).collect();
        assert_eq!(sizes, vec!["S", "M", "L", "XL", "XXL"]);

        let revenue: f64 = mix.iter().map(|s| s.revenue).sum();
        let quantity: i64 = mix.iter().map(|s| s.quantity).sum();
        let share: f64 = mix.iter().map(|s| s.share).sum();
        assert!(close(revenue, kpis.total_revenue));
        assert_eq!(quantity, kpis.total_pizzas);
        assert!(close(share, 1.0));
    }

    #[test]
    fn category_mix_partitions_revenue() {
        let df = all_rows();
        let mix = ReportCalculator::category_mix(&df).unwrap();
        assert_eq!(mix[0].category, "Classic");
        assert!(close(mix[0].revenue, 124.95));
        let revenue: f64 = mix.iter().map(|c| c.revenue).sum();
        assert!(close(revenue, ReportCalculator::kpis(&df).unwrap().total_revenue));
    }

    #[test]
    fn average_ticket_by_size_uses_distinct_orders() {
        let tickets = ReportCalculator::average_ticket_by_size(&all_rows()).unwrap();
        let sizes: Vec<&str> = tickets.iter().map(|t| t.size.as_str()).collect();
        assert_eq!(sizes, vec!["S", "M", "L", "XL", "XXL"]);

        let medium = &tickets[1];
        assert_eq!(medium.orders, 2);
        assert!(close(medium.average_ticket, 26.5));
        let large = &tickets[2];
        assert!(close(large.average_ticket, 19.625));
    }

    #[test]
    fn basket_histogram_accounts_for_every_pizza() {
        let df = all_rows();
        let bins =
            ReportCalculator::basket_distribution(&df, BasketMeasure::TotalQuantity).unwrap();
        let pairs: Vec<(i64, usize)> = bins.iter().map(|b| (b.basket_size, b.orders)).collect();
        assert_eq!(pairs, vec![(1, 3), (3, 2), (4, 1)]);

        let pizzas: i64 = bins.iter().map(|b| b.basket_size * b.orders as i64).sum();
        assert_eq!(pizzas, ReportCalculator::kpis(&df).unwrap().total_pizzas);
    }

    #[test]
    fn basket_can_count_distinct_lines() {
        let bins =
            ReportCalculator::basket_distribution(&all_rows(), BasketMeasure::DistinctLines).unwrap();
        let pairs: Vec<(i64, usize)> = bins.iter().map(|b| (b.basket_size, b.orders)).collect();
        assert_eq!(pairs, vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn average_price_by_size_in_fixed_order() {
        let prices = ReportCalculator::average_price_by_size(&all_rows()).unwrap();
        let pairs: Vec<(&str, f64)> = prices
            .iter()
            .map(|p| (p.size.as_str(), p.average_unit_price))
            .collect();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0].0, "S");
        assert!(close(pairs[0].1, 12.0));
        assert!(close(pairs[2].1, 19.625));
        assert_eq!(pairs[4].0, "XXL");
    }

    #[test]
    fn queries_on_empty_selection_are_empty() {
        let df = no_rows();
        assert!(ReportCalculator::top_sellers(&df, RANKING_SIZE).unwrap().is_empty());
        assert!(ReportCalculator::weak_sellers(&df, RANKING_SIZE).unwrap().is_empty());
        assert!(ReportCalculator::hourly_demand(&df).unwrap().is_empty());
        assert!(ReportCalculator::size_mix(&df).unwrap().is_empty());
        assert!(ReportCalculator::average_ticket_by_size(&df).unwrap().is_empty());
        assert!(ReportCalculator::basket_distribution(&df, BasketMeasure::TotalQuantity)
            .unwrap()
            .is_empty());
        assert!(ReportCalculator::average_price_by_size(&df).unwrap().is_empty());
    }

    #[test]
    fn unknown_sizes_sort_after_listed_ones() {
        let mut sizes = vec!["XL", "Family", "S", "Bambino", "M"];
        sort_by_size(&mut sizes, &TICKET_SIZE_ORDER, |s| *s);
        assert_eq!(sizes, vec!["S", "M", "XL", "Bambino", "Family"]);
    }
}
