// Analyzer module: aggregate views over deals and customer lifecycle derivation.

pub mod aggregation;
pub mod lifecycle;

pub use aggregation::{deals_per_month, deals_per_year, value_per_customer};
pub use lifecycle::{derive_status, status_breakdown, status_rows};
