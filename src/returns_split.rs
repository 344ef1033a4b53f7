//! RTO versus customer-return breakdown per style.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::kpi::Window;
use crate::types::{MasterStyleRow, ReasonRow, ReturnKind, ReturnRecord, ReturnsSplitRow};
use crate::util::safe_ratio;

#[derive(Default)]
struct SplitAcc {
    rto: f64,
    other: f64,
}

/// Split returns inside `[today - window_days, today]` for every master
/// style. Styles with no returned units in the window get no row.
pub fn build_returns_split(
    master: &[MasterStyleRow],
    returns: &[ReturnRecord],
    today: NaiveDate,
    window_days: u32,
) -> Vec<ReturnsSplitRow> {
    let window = Window::trailing(today, window_days);
    let mut by_style: HashMap<&str, SplitAcc> = HashMap::new();
    for r in returns.iter().filter(|r| window.contains(r.return_date)) {
        let acc = by_style.entry(r.style_key.as_str()).or_default();
        match r.kind() {
            ReturnKind::Rto => acc.rto += r.units_returned,
            ReturnKind::Return => acc.other += r.units_returned,
        }
    }

    master
        .iter()
        .filter_map(|m| {
            let acc = by_style.get(m.style_key.as_str())?;
            let total = acc.rto + acc.other;
            if total == 0.0 {
                return None;
            }
            Some(ReturnsSplitRow {
                style_id: m.style_id.clone(),
                style_key: m.style_key.clone(),
                rto_qty: acc.rto,
                return_qty: acc.other,
                total_returns: total,
                rto_pct: safe_ratio(acc.rto, total),
                return_pct: safe_ratio(acc.other, total),
            })
        })
        .collect()
}

/// Returned units per (style, reason) in the same window, style order then
/// largest reason first. Returns without a reason are left out.
pub fn reason_breakdown(
    master: &[MasterStyleRow],
    returns: &[ReturnRecord],
    today: NaiveDate,
    window_days: u32,
) -> Vec<ReasonRow> {
    let window = Window::trailing(today, window_days);
    let mut by_style: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for r in returns.iter().filter(|r| window.contains(r.return_date)) {
        let Some(reason) = r.reason.as_deref() else {
            continue;
        };
        let reasons = by_style.entry(r.style_key.as_str()).or_default();
        match reasons.iter_mut().find(|(name, _)| *name == reason) {
            Some((_, units)) => *units += r.units_returned,
            None => reasons.push((reason, r.units_returned)),
        }
    }

    let mut rows = Vec::new();
    for m in master {
        let Some(reasons) = by_style.get_mut(m.style_key.as_str()) else {
            continue;
        };
        reasons.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        rows.extend(reasons.iter().map(|(reason, units)| ReasonRow {
            style_id: m.style_id.clone(),
            reason: reason.to_string(),
            units_returned: *units,
        }));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use crate::master::build_master_table;
    use crate::types::SalesRecord;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn ret(key: &str, days_ago: i64, units: f64, kind: &str, reason: Option<&str>) -> ReturnRecord {
        ReturnRecord {
            return_date: Some(today() - Duration::days(days_ago)),
            style_id: key.to_string(),
            style_key: key.to_string(),
            units_returned: units,
            return_type: kind.to_string(),
            reason: reason.map(str::to_string),
        }
    }

    fn master(keys: &[&str]) -> Vec<MasterStyleRow> {
        let sales: Vec<SalesRecord> = keys
            .iter()
            .map(|k| SalesRecord {
                order_date: Some(today()),
                style_id: k.to_uppercase(),
                style_key: k.to_string(),
                net_units: 1,
                net_gmv: 0.0,
                size: None,
                brand: None,
            })
            .collect();
        build_master_table(&sales, &[], &[], &Params::default(), today())
    }

    #[test]
    fn split_percentages() {
        let returns = vec![
            ret("a", 1, 1.0, "rto", None),
            ret("a", 2, 3.0, "Customer Return", None),
            ret("b", 40, 2.0, "RTO", None),
        ];
        let rows = build_returns_split(&master(&["a", "b", "c"]), &returns, today(), 30);
        assert_eq!(rows.len(), 1);
        let a = &rows[0];
        assert_eq!(a.style_id, "A");
        assert_eq!(a.rto_qty, 1.0);
        assert_eq!(a.return_qty, 3.0);
        assert_eq!(a.total_returns, 4.0);
        assert_eq!(a.rto_pct, 0.25);
        assert_eq!(a.return_pct, 0.75);
    }

    #[test]
    fn zero_unit_returns_are_skipped() {
        let returns = vec![ret("a", 1, 0.0, "RTO", None)];
        assert!(build_returns_split(&master(&["a"]), &returns, today(), 30).is_empty());
    }

    #[test]
    fn reasons_per_style() {
        let returns = vec![
            ret("a", 1, 1.0, "Return", Some("Quality")),
            ret("a", 2, 2.0, "Return", Some("Size issue")),
            ret("a", 3, 2.0, "Return", Some("Size issue")),
            ret("a", 4, 1.0, "Return", None),
            ret("a", 90, 9.0, "Return", Some("Colour")),
        ];
        let rows = reason_breakdown(&master(&["a"]), &returns, today(), 30);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reason, "Size issue");
        assert_eq!(rows[0].units_returned, 4.0);
        assert_eq!(rows[1].reason, "Quality");
    }
}
