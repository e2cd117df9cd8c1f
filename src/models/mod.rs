pub mod report;
pub mod row;

pub use report::{HourlyConnectionMetricsReport, UserReport};
pub use row::ConnectionRow;
