//! Period-over-period momentum per style.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::config::Params;
use crate::types::{MasterStyleRow, ReturnKind, ReturnRecord, SalesRecord, WatchTag, WatchlistRow};
use crate::util::{format_pct, safe_ratio};

const RISING_ABOVE: f64 = 0.15;
const FALLING_BELOW: f64 = -0.15;

/// Relative change from `previous` to `recent`. Starting from nothing counts
/// as +100% when anything sold, 0 otherwise.
pub fn momentum(recent: u64, previous: u64) -> f64 {
    if previous > 0 {
        (recent as f64 - previous as f64) / previous as f64
    } else if recent > 0 {
        1.0
    } else {
        0.0
    }
}

/// Tag rules in precedence order: age first, then a start from zero, then
/// momentum bands.
pub fn classify_tag(
    age_days: Option<i64>,
    recent: u64,
    previous: u64,
    momentum_pct: f64,
    new_age_days: i64,
    watch_min_orders: u64,
) -> WatchTag {
    if age_days.is_some_and(|d| d <= new_age_days) {
        WatchTag::New
    } else if recent >= watch_min_orders && previous == 0 {
        WatchTag::Started
    } else if momentum_pct > RISING_ABOVE {
        WatchTag::Rising
    } else if momentum_pct < FALLING_BELOW {
        WatchTag::Falling
    } else {
        WatchTag::Flat
    }
}

#[derive(Default)]
struct ReturnsAcc {
    total: f64,
    rto: f64,
}

/// Build the watchlist for every master style. The recent period is the
/// report window; the previous period is the equal-length window before it.
pub fn build_watchlist(
    master: &[MasterStyleRow],
    sales: &[SalesRecord],
    returns: &[ReturnRecord],
    params: &Params,
    today: NaiveDate,
) -> Vec<WatchlistRow> {
    let recent_w = params.report_window(today);
    let previous_w = recent_w.preceding();

    let mut recent: HashMap<&str, u64> = HashMap::new();
    let mut previous: HashMap<&str, u64> = HashMap::new();
    for s in sales {
        if recent_w.contains(s.order_date) {
            *recent.entry(s.style_key.as_str()).or_default() += s.net_units as u64;
        } else if previous_w.contains(s.order_date) {
            *previous.entry(s.style_key.as_str()).or_default() += s.net_units as u64;
        }
    }
    let mut returned: HashMap<&str, ReturnsAcc> = HashMap::new();
    for r in returns.iter().filter(|r| recent_w.contains(r.return_date)) {
        let acc = returned.entry(r.style_key.as_str()).or_default();
        acc.total += r.units_returned;
        if r.kind() == ReturnKind::Rto {
            acc.rto += r.units_returned;
        }
    }

    let rows: Vec<WatchlistRow> = master
        .iter()
        .map(|m| {
            let key = m.style_key.as_str();
            let orders_recent = recent.get(key).copied().unwrap_or(0);
            let orders_previous = previous.get(key).copied().unwrap_or(0);
            let momentum_pct = momentum(orders_recent, orders_previous);
            let tag = classify_tag(
                m.days_since_first_order,
                orders_recent,
                orders_previous,
                momentum_pct,
                params.new_age_days,
                params.watch_min_orders,
            );
            let (returns_recent, rto_qty) = returned
                .get(key)
                .map_or((0.0, 0.0), |a| (a.total, a.rto));
            let return_pct_recent = safe_ratio(returns_recent, orders_recent as f64);
            WatchlistRow {
                style_id: m.style_id.clone(),
                style_key: m.style_key.clone(),
                tag,
                orders_recent,
                orders_previous,
                momentum_pct,
                is_new: tag == WatchTag::New,
                returns_recent,
                return_pct_recent,
                rto_qty,
                return_qty: returns_recent - rto_qty,
                note: note_for(tag, return_pct_recent, params),
            }
        })
        .collect();

    info!(
        styles = rows.len(),
        window_start = %recent_w.start,
        window_end = %recent_w.end,
        "watchlist built"
    );
    rows
}

fn note_for(tag: WatchTag, return_pct: f64, params: &Params) -> String {
    match tag {
        WatchTag::New => format!("New (<= {}d)", params.new_age_days),
        WatchTag::Started => "Started performing recently".to_string(),
        _ if return_pct >= params.high_return_pct => {
            format!("High returns ({})", format_pct(return_pct))
        }
        WatchTag::Rising | WatchTag::Falling => tag.to_string(),
        WatchTag::Flat => String::new(),
    }
}
