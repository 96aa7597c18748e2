//! Tab and sidebar-filter selection over the prepared dataset.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::model::{Dataset, ServiceGroup, ServiceRequest, Status, Zone};

/// One dashboard tab: every group together, or a single service group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    All,
    Group(ServiceGroup),
}

impl Tab {
    /// `TOTAL` followed by each group present in the dataset, in label order.
    pub fn tabs_for(dataset: &Dataset) -> Vec<Tab> {
        std::iter::once(Tab::All)
            .chain(dataset.service_groups().into_iter().map(Tab::Group))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::All => "TOTAL",
            Tab::Group(group) => group.label(),
        }
    }

    pub fn contains(self, request: &ServiceRequest) -> bool {
        match self {
            Tab::All => true,
            Tab::Group(group) => request.service_group == group,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user's zone, month and status selection.
///
/// A record matches when all three sets contain its value, so an empty set
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardFilter {
    pub zones: BTreeSet<Zone>,
    pub months: BTreeSet<u32>,
    pub statuses: BTreeSet<Status>,
}

impl DashboardFilter {
    /// Selects every zone, month and status present in `dataset`.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            zones: dataset.zones().into_iter().collect(),
            months: dataset.months().into_iter().collect(),
            statuses: dataset.statuses().into_iter().collect(),
        }
    }

    pub fn with_zones(mut self, zones: impl IntoIterator<Item = Zone>) -> Self {
        self.zones = zones.into_iter().collect();
        self
    }

    pub fn with_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn matches(&self, request: &ServiceRequest) -> bool {
        self.zones.contains(&request.zone)
            && self.months.contains(&request.month)
            && self.statuses.contains(&request.status)
    }
}

/// Records of `tab` that pass `filter`, in dataset order.
pub fn select<'a>(
    dataset: &'a Dataset,
    tab: Tab,
    filter: &DashboardFilter,
) -> Vec<&'a ServiceRequest> {
    dataset
        .iter()
        .filter(|r| tab.contains(r) && filter.matches(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::request;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            request(
                ServiceGroup::Drenagem,
                "A",
                "IBURA",
                "6",
                "2024-01-10",
                "2024-01-12",
                Status::Cadastrada,
            ),
            request(
                ServiceGroup::Drenagem,
                "A",
                "BOA VISTA",
                "1",
                "2024-02-10",
                "2024-02-12",
                Status::Atendida,
            ),
            request(
                ServiceGroup::Arborizacao,
                "B",
                "CASA AMARELA",
                "3",
                "2024-02-11",
                "2024-02-20",
                Status::Atendida,
            ),
        ])
    }

    #[test]
    fn test_tabs_start_with_total() {
        let tabs = Tab::tabs_for(&dataset());
        assert_eq!(
            tabs,
            vec![
                Tab::All,
                Tab::Group(ServiceGroup::Arborizacao),
                Tab::Group(ServiceGroup::Drenagem),
            ]
        );
        assert_eq!(tabs[0].label(), "TOTAL");
    }

    #[test]
    fn test_default_filter_selects_everything() {
        let data = dataset();
        let filter = DashboardFilter::from_dataset(&data);
        assert_eq!(select(&data, Tab::All, &filter).len(), 3);
        assert_eq!(
            select(&data, Tab::Group(ServiceGroup::Drenagem), &filter).len(),
            2
        );
        assert!(select(&data, Tab::Group(ServiceGroup::LimpezaUrbana), &filter).is_empty());
    }

    #[test]
    fn test_filter_narrows_selection() {
        let data = dataset();
        let filter = DashboardFilter::from_dataset(&data)
            .with_months([2])
            .with_zones([Zone::Norte]);
        let selected = select(&data, Tab::All, &filter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].neighborhood, "CASA AMARELA");
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let data = dataset();
        let filter = DashboardFilter::from_dataset(&data)
            .with_statuses(Vec::<Status>::new());
        assert!(select(&data, Tab::All, &filter).is_empty());
    }
}
