//! Data module - CSV loading, cleaning and filtering

mod cleaning;
mod filter;
mod loader;
mod table;

pub use cleaning::{LoadReport, WEEKDAY_NAMES};
pub use filter::{DateRange, FilterSelection};
pub use loader::{DataLoadError, DataLoader, LoadOptions, LoadedData, UnmatchedPolicy};
pub use table::{columns, SalesTable};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{DataLoader, SalesTable};
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Ten line items over six matched orders plus one unmatched pizza type.
    pub const SALES_CSV: &str = "\
order_id,pizza_name_id,quantity,unit_price,order_date,order_time
1,hawaiian_m,1,\"13,25\",01/01/2015,11:38:36
2,classic_dlx_s,2,12.00,01/01/2015,11:57:40
2,five_cheese_l,1,\"18,50\",01/01/2015,11:57:40
3,ital_supr_l,1,20.75,02/01/2015,12:12:28
3,bbq_ckn_xl,2,25.00,02/01/2015,12:12:28
4,bbq_ckn_xl,1,25.00,03/01/2015,13:02:59
5,the_greek_xxl,1,35.95,05/01/2015,18:30:00
5,hawaiian_m,3,13.25,05/01/2015,18:30:00
6,mystery_pie_m,1,10.00,05/01/2015,19:00:00
7,classic_dlx_s,1,12.00,06/01/2015,12:05:00
";

    pub const TYPES_CSV: &str = "\
pizza_type_id,pizza_name,pizza_category,pizza_size
hawaiian,The Hawaiian Pizza,Classic,M
classic_dlx,The Classic Deluxe Pizza,Classic,S
five_cheese,The Five Cheese Pizza,Veggie,L
ital_supr,The Italian Supreme Pizza,Supreme,L
bbq_ckn,The Barbecue Chicken Pizza,Chicken,XL
the_greek,The Greek Pizza,Classic,XXL
";

    pub fn write_inputs(sales: &str, types: &str) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let sales_path = dir.path().join("pizza_sales.csv");
        let types_path = dir.path().join("pizza_types.csv");
        std::fs::write(&sales_path, sales).unwrap();
        std::fs::write(&types_path, types).unwrap();
        (dir, sales_path, types_path)
    }

    pub fn fixture_table() -> SalesTable {
        let (_dir, sales_path, types_path) = write_inputs(SALES_CSV, TYPES_CSV);
        DataLoader::default()
            .load(&sales_path, &types_path)
            .unwrap()
            .table
    }
}
