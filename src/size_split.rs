//! Size split of each forecast style's required units.
//!
//! Shares come from units sold per size inside the size lookback window.
//! Each size first gets `floor(max(total * share, total * min_share, min_units))`;
//! units still missing then go one each to the sizes furthest below their
//! share, largest shortfall first. The minimums can push the sum above the
//! total; it never ends up below it.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;

use crate::config::Params;
use crate::kpi::Window;
use crate::types::{ForecastRow, SalesRecord, SizeAllocationRow};

#[derive(Debug, Clone, PartialEq)]
pub struct SizeShare {
    pub size: String,
    pub units_sold: u64,
    pub share: f64,
}

/// Per style key, the sizes sold inside `window`, best seller first.
/// Rows without a size do not count toward any share.
pub fn size_shares(sales: &[SalesRecord], window: Window) -> HashMap<String, Vec<SizeShare>> {
    let mut units: HashMap<&str, HashMap<String, u64>> = HashMap::new();
    for s in sales.iter().filter(|s| window.contains(s.order_date)) {
        let Some(size) = s.size.as_deref() else { continue };
        *units
            .entry(s.style_key.as_str())
            .or_default()
            .entry(size.trim().to_uppercase())
            .or_default() += s.net_units as u64;
    }

    units
        .into_iter()
        .map(|(key, per_size)| {
            let total: u64 = per_size.values().sum();
            let mut shares: Vec<SizeShare> = per_size
                .into_iter()
                .map(|(size, units_sold)| SizeShare {
                    size,
                    units_sold,
                    share: units_sold as f64 / total as f64,
                })
                .collect();
            shares.sort_by(|a, b| {
                b.units_sold
                    .cmp(&a.units_sold)
                    .then_with(|| a.size.cmp(&b.size))
            });
            (key.to_string(), shares)
        })
        .collect()
}

/// Split `total` units across `shares`, index for index.
pub fn allocate(total: u64, shares: &[SizeShare], min_share: f64, min_units: u64) -> Vec<u64> {
    if total == 0 {
        return vec![0; shares.len()];
    }
    let t = total as f64;
    let mut alloc: Vec<u64> = shares
        .iter()
        .map(|s| {
            (t * s.share)
                .max(t * min_share)
                .max(min_units as f64)
                .floor() as u64
        })
        .collect();

    let given: u64 = alloc.iter().sum();
    if given < total {
        let shortfall = |i: usize| t * shares[i].share / (alloc[i] + 1) as f64;
        let mut order: Vec<usize> = (0..shares.len()).filter(|&i| shares[i].share > 0.0).collect();
        order.sort_by(|&a, &b| {
            shortfall(b)
                .partial_cmp(&shortfall(a))
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        let missing = (total - given) as usize;
        for i in order.into_iter().take(missing) {
            alloc[i] += 1;
        }
    }
    alloc
}

/// Allocation rows for every forecast style that sold any sized unit in the
/// size lookback window.
pub fn build_size_allocation(
    forecast: &[ForecastRow],
    sales: &[SalesRecord],
    params: &Params,
    today: NaiveDate,
) -> Vec<SizeAllocationRow> {
    let window = Window::trailing(today, params.size_split_lookback_days);
    let shares = size_shares(sales, window);

    let mut rows = Vec::new();
    for f in forecast {
        let Some(sizes) = shares.get(&f.style_key) else { continue };
        let units = allocate(
            f.total_required,
            sizes,
            params.size_split_min_share,
            params.size_split_min_units,
        );
        for (s, allocated_units) in sizes.iter().zip(units) {
            rows.push(SizeAllocationRow {
                style_id: f.style_id.clone(),
                style_key: f.style_key.clone(),
                size: s.size.clone(),
                units_sold: s.units_sold,
                share: s.share,
                allocated_units,
            });
        }
    }

    info!(styles = shares.len(), rows = rows.len(), "size allocation built");
    rows
}
