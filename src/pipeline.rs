//! Data preparation pipeline.
//!
//! Turns raw source rows into the cleaned, sorted [`Dataset`]. Steps run in
//! a fixed order because later ones read fields derived by earlier ones:
//! domain filter, date parsing, derivation, year filter, region-code
//! normalization, zone mapping, status rank, sort.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{ParseError, Result};
use crate::model::{Dataset, ServiceGroup, ServiceRequest, Status, Zone};
use crate::source::{self, RawRequest};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loads `config.source_path` and runs every step over it.
#[tracing::instrument(
    skip(config),
    fields(source = %config.source_path.display(), year = config.target_year)
)]
pub fn prepare(config: &PipelineConfig) -> Result<Dataset> {
    let raw = source::load(config)?;
    transform(raw, config.target_year)
}

/// Same as [`prepare`] over source bytes already in memory.
pub fn prepare_bytes(bytes: &[u8], config: &PipelineConfig) -> Result<Dataset> {
    let raw = source::parse(bytes, config)?;
    transform(raw, config.target_year)
}

/// Dates and calendar fields of a row that has a demand date.
struct Derived {
    request_date: NaiveDate,
    last_status_date: Option<NaiveDate>,
    duration_days: Option<i64>,
    month: u32,
    day: u32,
    year: i32,
    weekday: u32,
}

struct DatedRow {
    group: ServiceGroup,
    raw: RawRequest,
    /// `None` when `DATA_DEMANDA` is empty: the row has no year.
    derived: Option<Derived>,
}

/// Runs the filter/derive/sort steps over pruned source rows.
pub fn transform(raw: Vec<RawRequest>, target_year: i32) -> Result<Dataset> {
    let loaded = raw.len();

    let in_domain: Vec<(ServiceGroup, RawRequest)> = raw
        .into_iter()
        .filter_map(|r| ServiceGroup::from_label(&r.service_group).map(|g| (g, r)))
        .collect();
    debug!(
        kept = in_domain.len(),
        dropped = loaded - in_domain.len(),
        "Domain filter applied"
    );

    let rows = in_domain
        .into_iter()
        .map(|(group, raw)| parse_dates(group, raw))
        .collect::<Result<Vec<_>>>()?;

    let before_year = rows.len();
    let in_year: Vec<(ServiceGroup, RawRequest, Derived)> = rows
        .into_iter()
        .filter_map(|row| match row.derived {
            Some(derived) if derived.year == target_year => Some((row.group, row.raw, derived)),
            _ => None,
        })
        .collect();
    debug!(
        kept = in_year.len(),
        dropped = before_year - in_year.len(),
        target_year,
        "Year filter applied"
    );

    let mut records = in_year
        .into_iter()
        .map(|(group, raw, derived)| finish(group, raw, derived))
        .collect::<Result<Vec<_>>>()?;

    // Vec::sort_by_key is stable, so equal ranks keep source order.
    records.sort_by_key(|r| r.status_order);

    info!(records = records.len(), loaded, "Dataset prepared");
    Ok(Dataset::new(records))
}

fn parse_dates(group: ServiceGroup, raw: RawRequest) -> Result<DatedRow> {
    let request_date = parse_date(&raw.request_date, "DATA_DEMANDA", raw.line)?;
    let last_status_date = parse_date(&raw.last_status_date, "DATA_ULT_SITUACAO", raw.line)?;
    let derived = request_date.map(|date| derive(date, last_status_date));
    Ok(DatedRow {
        group,
        raw,
        derived,
    })
}

/// Empty cells are `None`; anything else must be `YYYY-MM-DD`.
fn parse_date(value: &str, column: &'static str, line: u64) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| {
            ParseError::InvalidDate {
                line,
                column,
                value: value.to_string(),
            }
            .into()
        })
}

fn derive(request_date: NaiveDate, last_status_date: Option<NaiveDate>) -> Derived {
    Derived {
        request_date,
        last_status_date,
        duration_days: last_status_date.map(|last| (last - request_date).num_days()),
        month: request_date.month(),
        day: request_date.day(),
        year: request_date.year(),
        weekday: request_date.weekday().num_days_from_monday(),
    }
}

/// Canonical text form of a region code.
///
/// Integral numbers lose any decimal or padding (`"3.0"`, `" 03"` -> `"3"`);
/// anything else is kept trimmed.
pub fn normalize_region_code(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => format!("{}", v as i64),
        _ => trimmed.to_string(),
    }
}

fn finish(group: ServiceGroup, raw: RawRequest, derived: Derived) -> Result<ServiceRequest> {
    let region_code = normalize_region_code(&raw.region_code);
    let zone = Zone::from_region_code(&region_code);

    let status = Status::from_code(&raw.status).ok_or_else(|| ParseError::UnknownStatus {
        line: raw.line,
        value: raw.status.clone(),
    })?;

    Ok(ServiceRequest {
        service_group: group,
        service_name: raw.service_name,
        neighborhood: raw.neighborhood,
        region_code,
        zone,
        request_date: derived.request_date,
        last_status_date: derived.last_status_date,
        duration_days: derived.duration_days,
        month: derived.month,
        day: derived.day,
        year: derived.year,
        weekday: derived.weekday,
        status,
        status_order: status.order(),
    })
}
