//! Small widgets shared by the reports

pub mod sparkline;

pub use sparkline::{PriceSparkline, Trend};
