//! Dashboard aggregation over the prepared dataset.
//!
//! Each tab (`TOTAL` plus one per service group) is reduced independently
//! under the sidebar filter into KPIs, month series and top-N rankings.
//! Rendering is left to whatever consumes the resulting [`DashboardReport`].

pub mod aggregate;
pub mod filter;
pub mod format;
pub mod types;
pub mod utility;

pub use aggregate::{build_report, tab_report};
pub use filter::{DashboardFilter, Tab};
pub use types::DashboardReport;
