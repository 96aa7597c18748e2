use crate::dashboard::types::{KpiCards, Kpis};

/// Formats a count with `.` as the thousands separator: `12345` -> `"12.345"`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub fn format_percent(p: f64) -> String {
    format!("{p:.0}%")
}

pub fn format_days(days: f64) -> String {
    format!("{days:.0}")
}

impl From<&Kpis> for KpiCards {
    fn from(kpis: &Kpis) -> Self {
        KpiCards {
            total_requests: format_count(kpis.total_requests),
            percent_resolved: format_percent(kpis.percent_resolved),
            mean_resolution_days: format_days(kpis.mean_resolution_days),
        }
    }
}
