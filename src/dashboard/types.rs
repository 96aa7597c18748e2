//! Data types produced by the dashboard aggregation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::filter::DashboardFilter;
use crate::model::{ServiceGroup, Status, Zone};

/// Headline numbers shown at the top of each tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_requests: usize,
    /// Share of ATENDIDA/FISCALIZACAO requests, 0–100.
    pub percent_resolved: f64,
    /// Mean `duration_days` over resolved requests only.
    pub mean_resolution_days: f64,
}

/// [`Kpis`] rendered as card text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCards {
    pub total_requests: String,
    pub percent_resolved: String,
    pub mean_resolution_days: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPercent {
    pub month: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service_group: ServiceGroup,
    pub service_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneCount {
    pub zone: Zone,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborhoodCount {
    pub neighborhood: String,
    pub count: usize,
}

/// Everything one tab displays under the current filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabReport {
    pub tab: String,
    pub kpis: Kpis,
    pub cards: KpiCards,
    /// Months 1..=12, zero-filled.
    pub resolved_pct_by_month: Vec<MonthPercent>,
    /// Months 1..=12, zero-filled.
    pub requests_by_month: Vec<MonthCount>,
    pub top_services: Vec<ServiceCount>,
    pub requests_by_zone: Vec<ZoneCount>,
    pub top_neighborhoods: Vec<NeighborhoodCount>,
}

/// Label and chart colour for one status, in rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLegendEntry {
    pub status: Status,
    pub order: u8,
    pub label: &'static str,
    pub color: &'static str,
}

/// Complete dashboard snapshot, written as JSON by the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub target_year: i32,
    pub filter: DashboardFilter,
    pub status_legend: Vec<StatusLegendEntry>,
    pub tabs: Vec<TabReport>,
}
