//! Rolling-window headline numbers.
//!
//! Windows compare calendar dates only and include both ends, so a 30-day
//! window ending today spans `today - 30 ..= today`.

use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::HashMap;

use crate::types::{
    DailyOrders, KpiSummary, MasterStyleRow, ReasonCount, ReturnKind, ReturnRecord, SalesRecord,
    Status,
};
use crate::util::safe_ratio;

/// `date` moved back `days` days, clamped to the earliest representable date.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|d| date.checked_sub_signed(d))
        .unwrap_or(NaiveDate::MIN)
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// `[today - days, today]`.
    pub fn trailing(today: NaiveDate, days: u32) -> Window {
        Window {
            start: days_before(today, days as i64),
            end: today,
        }
    }

    /// `[start, end]`, swapping reversed bounds.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Window {
        Window {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// The last `months` complete calendar months before the month of `today`.
    pub fn full_months_before(today: NaiveDate, months: u32) -> Window {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let end = days_before(first_of_month, 1);
        let start = end
            .with_day(1)
            .and_then(|d| d.checked_sub_months(Months::new(months.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        Window { start, end }
    }

    /// Days from `start` to `end`.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// The window of the same span ending the day before this one starts.
    pub fn preceding(&self) -> Window {
        let end = days_before(self.start, 1);
        Window {
            start: days_before(end, self.span_days()),
            end,
        }
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| d >= self.start && d <= self.end)
    }
}

pub fn total_orders(sales: &[SalesRecord], window: Window) -> u64 {
    sales
        .iter()
        .filter(|s| window.contains(s.order_date))
        .map(|s| s.net_units as u64)
        .sum()
}

pub fn total_gmv(sales: &[SalesRecord], window: Window) -> f64 {
    sales
        .iter()
        .filter(|s| window.contains(s.order_date))
        .map(|s| s.net_gmv)
        .sum()
}

pub fn units_returned(returns: &[ReturnRecord], window: Window) -> f64 {
    returns
        .iter()
        .filter(|r| window.contains(r.return_date))
        .map(|r| r.units_returned)
        .sum()
}

/// Returned units over orders in the same window; 0 when there are no orders.
pub fn return_pct(sales: &[SalesRecord], returns: &[ReturnRecord], window: Window) -> f64 {
    let orders = total_orders(sales, window);
    if orders == 0 || returns.is_empty() {
        return 0.0;
    }
    safe_ratio(units_returned(returns, window), orders as f64)
}

/// Orders per day for the `days` days ending `today`, oldest first.
pub fn daily_orders(sales: &[SalesRecord], today: NaiveDate, days: u32) -> Vec<DailyOrders> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for s in sales {
        if let Some(d) = s.order_date {
            *per_day.entry(d).or_default() += s.net_units as u64;
        }
    }
    (0..days as i64)
        .rev()
        .map(|back| {
            let day = days_before(today, back);
            DailyOrders {
                day,
                orders: per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Returned units per reason inside `window`, largest first, at most `top`.
pub fn returns_by_reason(
    returns: &[ReturnRecord],
    window: Window,
    top: usize,
) -> Vec<ReasonCount> {
    let mut per_reason: HashMap<&str, f64> = HashMap::new();
    for r in returns.iter().filter(|r| window.contains(r.return_date)) {
        if let Some(reason) = r.reason.as_deref() {
            *per_reason.entry(reason).or_default() += r.units_returned;
        }
    }
    let mut rows: Vec<ReasonCount> = per_reason
        .into_iter()
        .map(|(reason, units)| ReasonCount {
            reason: reason.to_string(),
            units,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.units
            .partial_cmp(&a.units)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.reason.cmp(&b.reason))
    });
    rows.truncate(top);
    rows
}

/// Every headline number for `window`; the daily series ends at `today`.
pub fn summarize(
    sales: &[SalesRecord],
    returns: &[ReturnRecord],
    master: Option<&[MasterStyleRow]>,
    today: NaiveDate,
    window: Window,
) -> KpiSummary {
    let total_orders = total_orders(sales, window);
    let total_returns = units_returned(returns, window);
    let rto_qty: f64 = returns
        .iter()
        .filter(|r| window.contains(r.return_date) && r.kind() == ReturnKind::Rto)
        .map(|r| r.units_returned)
        .sum();

    KpiSummary {
        window_days: window.span_days().try_into().unwrap_or(u32::MAX),
        window_start: window.start,
        window_end: window.end,
        total_orders,
        total_gmv: total_gmv(sales, window),
        total_returns,
        return_pct: return_pct(sales, returns, window),
        rto_qty,
        return_qty: total_returns - rto_qty,
        rto_pct: safe_ratio(rto_qty, total_returns),
        active_styles: master
            .map(|rows| rows.iter().filter(|r| r.status == Status::Active).count()),
        daily_orders: daily_orders(sales, today, 7),
        top_return_reasons: returns_by_reason(returns, window, 10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn sale(key: &str, days_ago: i64, gmv: f64) -> SalesRecord {
        SalesRecord {
            order_date: Some(today() - Duration::days(days_ago)),
            style_id: key.to_string(),
            style_key: key.to_string(),
            net_units: 1,
            net_gmv: gmv,
            size: None,
            brand: None,
        }
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

    #[test]
    fn window_excludes_older_orders() {
        let sales = vec![sale("a", 40, 1.0), sale("a", 10, 2.0), sale("a", 5, 3.0)];
        let w = Window::trailing(today(), 30);
        assert_eq!(total_orders(&sales, w), 2);
        assert_eq!(total_gmv(&sales, w), 5.0);
    }

    #[test]
    fn both_window_ends_are_inclusive() {
        let sales = vec![sale("a", 30, 1.0), sale("a", 0, 1.0), sale("a", 31, 1.0)];
        assert_eq!(total_orders(&sales, Window::trailing(today(), 30)), 2);
    }

    #[test]
    fn undated_rows_never_count() {
        let mut s = sale("a", 1, 9.0);
        s.order_date = None;
        assert_eq!(total_orders(&[s], Window::trailing(today(), 30)), 0);
    }

    #[test]
    fn return_pct_is_guarded() {
        let w = Window::trailing(today(), 30);
        let returns = vec![ret("a", 3, 2.0, "Return", None)];
        assert_eq!(return_pct(&[], &returns, w), 0.0);
        assert_eq!(return_pct(&[sale("a", 1, 0.0)], &[], w), 0.0);
        let sales: Vec<_> = (1..=4).map(|d| sale("a", d, 0.0)).collect();
        assert_eq!(return_pct(&sales, &returns, w), 0.5);
    }

    #[test]
    fn preceding_window_is_adjacent_and_equal() {
        let w = Window::trailing(today(), 30);
        let p = w.preceding();
        assert_eq!(p.end, w.start - Duration::days(1));
        assert_eq!(p.end - p.start, w.end - w.start);
    }

    #[test]
    fn huge_spans_clamp_instead_of_overflowing() {
        let w = Window::trailing(today(), u32::MAX);
        assert_eq!(w.start, NaiveDate::MIN);
        let p = w.preceding();
        assert_eq!((p.start, p.end), (NaiveDate::MIN, NaiveDate::MIN));
        assert!(!p.contains(Some(today())));
    }

    #[test]
    fn calendar_month_windows() {
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let w = Window::full_months_before(d(2024, 3, 1), 1);
        assert_eq!((w.start, w.end), (d(2024, 2, 1), d(2024, 2, 29)));
        let w = Window::full_months_before(d(2024, 1, 20), 3);
        assert_eq!((w.start, w.end), (d(2023, 10, 1), d(2023, 12, 31)));
        assert_eq!(w.preceding().end, d(2023, 9, 30));
    }

    #[test]
    fn between_swaps_reversed_bounds() {
        let a = today();
        let b = days_before(a, 10);
        assert_eq!(Window::between(a, b), Window::between(b, a));
        assert_eq!(Window::between(a, b).span_days(), 10);
    }

    #[test]
    fn summary_splits_rto() {
        let sales = vec![sale("a", 1, 100.0), sale("b", 2, 50.0)];
        let returns = vec![
            ret("a", 1, 1.0, "RTO", Some("Undelivered")),
            ret("b", 2, 3.0, "Customer Return", Some("Size issue")),
            ret("b", 90, 5.0, "Customer Return", Some("Quality")),
        ];
        let k = summarize(&sales, &returns, None, today(), Window::trailing(today(), 30));
        assert_eq!(k.window_days, 30);
        assert_eq!(k.total_orders, 2);
        assert_eq!(k.total_gmv, 150.0);
        assert_eq!(k.total_returns, 4.0);
        assert_eq!(k.rto_qty, 1.0);
        assert_eq!(k.return_qty, 3.0);
        assert_eq!(k.rto_pct, 0.25);
        assert_eq!(k.return_pct, 2.0);
        assert_eq!(k.active_styles, None);
        assert_eq!(k.daily_orders.len(), 7);
        assert_eq!(k.daily_orders[6].day, today());
        assert_eq!(k.daily_orders[5].orders, 1);
        assert_eq!(k.top_return_reasons[0].reason, "Size issue");
        assert_eq!(k.top_return_reasons.len(), 2);
    }
}
