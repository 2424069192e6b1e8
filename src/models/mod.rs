pub mod loaders;
pub mod order;

pub use loaders::{parse_orders, read_orders};
pub use order::{validate_order_number, Order, REQUIRED_COLUMNS};
