use chrono::Utc;
use tracing::debug;

use crate::dashboard::filter::{DashboardFilter, Tab, select};
use crate::dashboard::types::{
    DashboardReport, KpiCards, Kpis, MonthCount, MonthPercent, NeighborhoodCount, ServiceCount,
    StatusLegendEntry, TabReport, ZoneCount,
};
use crate::dashboard::utility::{count_by, mean, pct, top_n};
use crate::model::{Dataset, ServiceRequest, Status, Zone};

/// Length of the service and neighborhood rankings.
pub const TOP_N: usize = 10;

pub const SCHEMA_VERSION: u8 = 1;

pub fn kpis(records: &[&ServiceRequest]) -> Kpis {
    Kpis {
        total_requests: records.len(),
        percent_resolved: percent_resolved(records),
        mean_resolution_days: mean_resolution_days(records),
    }
}

/// Percentage of `records` whose status is ATENDIDA or FISCALIZACAO; 0 when empty.
pub fn percent_resolved(records: &[&ServiceRequest]) -> f64 {
    let resolved = records.iter().filter(|r| r.status.is_resolved()).count();
    pct(resolved, records.len())
}

/// Mean duration of resolved requests that have a last-status date; 0 when
/// there are none.
pub fn mean_resolution_days(records: &[&ServiceRequest]) -> f64 {
    let durations: Vec<f64> = records
        .iter()
        .filter(|r| r.status.is_resolved())
        .filter_map(|r| r.duration_days)
        .map(|d| d as f64)
        .collect();
    mean(&durations)
}

pub fn resolved_pct_by_month(records: &[&ServiceRequest]) -> Vec<MonthPercent> {
    (1..=12)
        .map(|month| {
            let in_month: Vec<_> = records
                .iter()
                .copied()
                .filter(|r| r.month == month)
                .collect();
            MonthPercent {
                month,
                percent: percent_resolved(&in_month),
            }
        })
        .collect()
}

pub fn requests_by_month(records: &[&ServiceRequest]) -> Vec<MonthCount> {
    let counts = count_by(records, |r| r.month);
    (1..=12)
        .map(|month| MonthCount {
            month,
            count: counts.get(&month).copied().unwrap_or(0),
        })
        .collect()
}

/// Most requested services, keyed by (group, service name).
pub fn top_services(records: &[&ServiceRequest], n: usize) -> Vec<ServiceCount> {
    let counts = count_by(records, |r| (r.service_group, r.service_name.clone()));
    top_n(counts, n)
        .into_iter()
        .map(|((service_group, service_name), count)| ServiceCount {
            service_group,
            service_name,
            count,
        })
        .collect()
}

/// Count per zone, only for zones with at least one request.
pub fn requests_by_zone(records: &[&ServiceRequest]) -> Vec<ZoneCount> {
    let counts = count_by(records, |r| r.zone);
    Zone::ALL
        .into_iter()
        .filter_map(|zone| counts.get(&zone).map(|&count| ZoneCount { zone, count }))
        .collect()
}

pub fn top_neighborhoods(records: &[&ServiceRequest], n: usize) -> Vec<NeighborhoodCount> {
    let counts = count_by(records, |r| r.neighborhood.clone());
    top_n(counts, n)
        .into_iter()
        .map(|(neighborhood, count)| NeighborhoodCount {
            neighborhood,
            count,
        })
        .collect()
}

pub fn status_legend() -> Vec<StatusLegendEntry> {
    Status::ALL
        .into_iter()
        .map(|status| StatusLegendEntry {
            status,
            order: status.order(),
            label: status.label(),
            color: status.color(),
        })
        .collect()
}

/// Aggregates one tab under `filter`. Nothing is carried between calls.
pub fn tab_report(dataset: &Dataset, tab: Tab, filter: &DashboardFilter) -> TabReport {
    let records = select(dataset, tab, filter);
    debug!(tab = %tab, selected = records.len(), "Aggregating tab");

    let kpis = kpis(&records);
    let cards = KpiCards::from(&kpis);

    TabReport {
        tab: tab.label().to_string(),
        kpis,
        cards,
        resolved_pct_by_month: resolved_pct_by_month(&records),
        requests_by_month: requests_by_month(&records),
        top_services: top_services(&records, TOP_N),
        requests_by_zone: requests_by_zone(&records),
        top_neighborhoods: top_neighborhoods(&records, TOP_N),
    }
}

/// Builds every tab of the dashboard under `filter`.
pub fn build_report(
    dataset: &Dataset,
    filter: &DashboardFilter,
    target_year: i32,
) -> DashboardReport {
    let tabs = Tab::tabs_for(dataset)
        .into_iter()
        .map(|tab| tab_report(dataset, tab, filter))
        .collect();

    DashboardReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        target_year,
        filter: filter.clone(),
        status_legend: status_legend(),
        tabs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceGroup;
    use crate::model::tests::request;

    fn sample() -> Dataset {
        Dataset::new(vec![
            request(
                ServiceGroup::Drenagem,
                "DESOBSTRUCAO",
                "IBURA",
                "6",
                "2024-01-10",
                "2024-01-15",
                Status::Atendida,
            ),
            request(
                ServiceGroup::Drenagem,
                "DESOBSTRUCAO",
                "IBURA",
                "6",
                "2024-01-20",
                "2024-01-21",
                Status::Cadastrada,
            ),
            request(
                ServiceGroup::Drenagem,
                "LIMPEZA DE CANAL",
                "BOA VISTA",
                "1",
                "2024-03-01",
                "2024-03-11",
                Status::Fiscalizacao,
            ),
            request(
                ServiceGroup::IluminacaoPublica,
                "TROCA DE LAMPADA",
                "VARZEA",
                "4",
                "2024-03-05",
                "2024-03-05",
                Status::Pendencia,
            ),
        ])
    }

    #[test]
    fn test_kpis_over_empty_subset() {
        let k = kpis(&[]);
        assert_eq!(k.total_requests, 0);
        assert_eq!(k.percent_resolved, 0.0);
        assert_eq!(k.mean_resolution_days, 0.0);
    }

    #[test]
    fn test_kpis() {
        let data = sample();
        let records: Vec<_> = data.iter().collect();
        let k = kpis(&records);
        assert_eq!(k.total_requests, 4);
        assert_eq!(k.percent_resolved, 50.0);
        // resolved durations: 5 and 10
        assert_eq!(k.mean_resolution_days, 7.5);
    }

    #[test]
    fn test_mean_skips_resolved_without_last_date() {
        let data = Dataset::new(vec![
            request(
                ServiceGroup::Drenagem,
                "DESOBSTRUCAO",
                "IBURA",
                "6",
                "2024-01-10",
                "2024-01-14",
                Status::Atendida,
            ),
            request(
                ServiceGroup::Drenagem,
                "DESOBSTRUCAO",
                "IBURA",
                "6",
                "2024-01-11",
                "",
                Status::Atendida,
            ),
        ]);
        let records: Vec<_> = data.iter().collect();
        let k = kpis(&records);
        assert_eq!(k.percent_resolved, 100.0);
        assert_eq!(k.mean_resolution_days, 4.0);
    }

    #[test]
    fn test_month_series_are_zero_filled() {
        let data = sample();
        let records: Vec<_> = data.iter().collect();

        let counts = requests_by_month(&records);
        assert_eq!(counts.len(), 12);
        assert_eq!(counts[0], MonthCount { month: 1, count: 2 });
        assert_eq!(counts[1], MonthCount { month: 2, count: 0 });
        assert_eq!(counts[2], MonthCount { month: 3, count: 2 });

        let pcts = resolved_pct_by_month(&records);
        assert_eq!(pcts.len(), 12);
        assert_eq!(pcts[0].percent, 50.0);
        assert_eq!(pcts[1].percent, 0.0);
        assert_eq!(pcts[11].month, 12);
    }

    #[test]
    fn test_rankings() {
        let data = sample();
        let records: Vec<_> = data.iter().collect();

        let services = top_services(&records, TOP_N);
        assert_eq!(services[0].service_name, "DESOBSTRUCAO");
        assert_eq!(services[0].count, 2);
        assert_eq!(services.len(), 3);

        let hoods = top_neighborhoods(&records, 2);
        assert_eq!(
            hoods,
            vec![
                NeighborhoodCount {
                    neighborhood: "IBURA".into(),
                    count: 2,
                },
                NeighborhoodCount {
                    neighborhood: "BOA VISTA".into(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_zone_counts_skip_empty_zones() {
        let data = sample();
        let records: Vec<_> = data.iter().collect();
        let zones = requests_by_zone(&records);
        assert_eq!(
            zones,
            vec![
                ZoneCount {
                    zone: Zone::Centro,
                    count: 1,
                },
                ZoneCount {
                    zone: Zone::Oeste,
                    count: 1,
                },
                ZoneCount {
                    zone: Zone::Sul,
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn test_build_report_has_total_tab_first() {
        let data = sample();
        let filter = DashboardFilter::from_dataset(&data);
        let report = build_report(&data, &filter, 2024);

        let tabs: Vec<_> = report.tabs.iter().map(|t| t.tab.as_str()).collect();
        assert_eq!(tabs, vec!["TOTAL", "DRENAGEM", "ILUMINACAO PUBLICA"]);
        assert_eq!(report.tabs[0].kpis.total_requests, 4);
        assert_eq!(report.tabs[1].kpis.total_requests, 3);
        assert_eq!(report.status_legend.len(), 6);
        assert_eq!(report.status_legend[4].color, "#32cd32");
    }

    #[test]
    fn test_filtered_tab_with_no_matches() {
        let data = sample();
        let filter = DashboardFilter::from_dataset(&data).with_months([7]);
        let tab = tab_report(&data, Tab::All, &filter);
        assert_eq!(tab.kpis.total_requests, 0);
        assert_eq!(tab.kpis.percent_resolved, 0.0);
        assert_eq!(tab.cards.percent_resolved, "0%");
        assert!(tab.top_services.is_empty());
        assert!(tab.requests_by_month.iter().all(|m| m.count == 0));
    }
}
