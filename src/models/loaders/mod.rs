pub mod csv_loader;

pub use csv_loader::{parse_orders, read_orders};
