//! Per-style master table.
//!
//! One row per style in the universe. The universe comes from the catalog
//! when it declares any styles, otherwise from the styles seen in sales.
//! The brand filter applies to whichever source is used, so a filter that
//! matches no catalog brand yields an empty table.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::{BrandFilter, Params};
use crate::types::{
    CatalogRecord, MasterStyleRow, NewnessBucket, ReturnRecord, RiskFlag, SalesRecord, Status,
};
use crate::util::{days_between, safe_ratio};

#[derive(Default)]
struct SalesAcc {
    orders: u64,
    gmv: f64,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

// A universe entry: display id, join key, brand.
struct StyleSeed {
    style_id: String,
    style_key: String,
    brand: Option<String>,
}

fn universe(
    sales: &[SalesRecord],
    catalog: &[CatalogRecord],
    brand_filter: &BrandFilter,
) -> Vec<StyleSeed> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seeds = Vec::new();
    let mut admit = |style_id: &str, style_key: &str, brand: Option<&str>| {
        if brand_filter.allows(brand) && seen.insert(style_key.to_string()) {
            seeds.push(StyleSeed {
                style_id: style_id.to_string(),
                style_key: style_key.to_string(),
                brand: brand.map(str::to_string),
            });
        }
    };
    if catalog.is_empty() {
        for s in sales.iter().filter(|s| !s.style_key.is_empty()) {
            admit(&s.style_id, &s.style_key, s.brand.as_deref());
        }
    } else {
        for c in catalog {
            admit(&c.style_id, &c.style_key, c.brand.as_deref());
        }
    }
    seeds
}

/// Lifecycle status; each rule is checked only when the previous did not match.
pub fn classify_status(
    has_sales: bool,
    orders: u64,
    age_days: Option<i64>,
    zero_sale_age_days: i64,
    new_age_days: i64,
) -> Status {
    if !has_sales {
        return Status::CatalogOnly;
    }
    if orders == 0 && age_days.is_some_and(|d| d >= zero_sale_age_days) {
        return Status::ZeroSale;
    }
    if age_days.is_some_and(|d| d <= new_age_days) {
        return Status::New;
    }
    if orders > 0 {
        return Status::Active;
    }
    Status::Unknown
}

pub fn risk_flag(return_pct: f64, high_return_pct: f64) -> RiskFlag {
    if return_pct >= high_return_pct {
        RiskFlag::HighReturns
    } else {
        RiskFlag::None
    }
}

/// Build the master table. Empty inputs give an empty table.
pub fn build_master_table(
    sales: &[SalesRecord],
    returns: &[ReturnRecord],
    catalog: &[CatalogRecord],
    params: &Params,
    today: NaiveDate,
) -> Vec<MasterStyleRow> {
    let seeds = universe(sales, catalog, &params.brand_filter);
    if seeds.is_empty() {
        return Vec::new();
    }

    let mut by_style: HashMap<&str, SalesAcc> = HashMap::new();
    for s in sales {
        let acc = by_style.entry(s.style_key.as_str()).or_default();
        acc.orders += s.net_units as u64;
        acc.gmv += s.net_gmv;
        if let Some(d) = s.order_date {
            acc.first = Some(acc.first.map_or(d, |f| f.min(d)));
            acc.last = Some(acc.last.map_or(d, |l| l.max(d)));
        }
    }
    let mut live: HashMap<&str, NaiveDate> = HashMap::new();
    for c in catalog {
        if let Some(d) = c.live_date {
            live.entry(c.style_key.as_str())
                .and_modify(|e| *e = (*e).min(d))
                .or_insert(d);
        }
    }
    let mut returned: HashMap<&str, f64> = HashMap::new();
    for r in returns {
        *returned.entry(r.style_key.as_str()).or_default() += r.units_returned;
    }

    let rows: Vec<MasterStyleRow> = seeds
        .into_iter()
        .map(|seed| {
            let acc = by_style.get(seed.style_key.as_str());
            let orders = acc.map_or(0, |a| a.orders);
            let first = acc.and_then(|a| a.first);
            let age = first.map(|f| days_between(f, today));
            let live_date = live.get(seed.style_key.as_str()).copied();
            let units_returned = returned.get(seed.style_key.as_str()).copied().unwrap_or(0.0);
            let return_pct = if orders > 0 {
                safe_ratio(units_returned, orders as f64)
            } else {
                0.0
            };
            MasterStyleRow {
                style_id: seed.style_id,
                style_key: seed.style_key,
                brand: seed.brand,
                first_order_date: first,
                last_order_date: acc.and_then(|a| a.last),
                days_since_first_order: age,
                live_date,
                days_since_live: live_date.map(|d| days_between(d, today)),
                newness_bucket: NewnessBucket::from_age(age),
                orders,
                gmv: acc.map_or(0.0, |a| a.gmv),
                units_returned,
                return_pct,
                status: classify_status(
                    acc.is_some(),
                    orders,
                    age,
                    params.zero_sale_age_days,
                    params.new_age_days,
                ),
                risk_flag: risk_flag(return_pct, params.high_return_pct),
            }
        })
        .collect();

    info!(styles = rows.len(), "master table built");
    rows
}

/// Styles with nothing sold for at least `zero_sale_age_days`: Zero-Sale rows
/// plus unsold styles whose catalog live date is that old.
pub fn zero_sale_styles(master: &[MasterStyleRow], zero_sale_age_days: i64) -> Vec<MasterStyleRow> {
    master
        .iter()
        .filter(|r| {
            r.status == Status::ZeroSale
                || (r.orders == 0 && r.days_since_live.is_some_and(|d| d >= zero_sale_age_days))
        })
        .cloned()
        .collect()
}
