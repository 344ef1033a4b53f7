//! Ad-spend recommendation per style.

use std::collections::HashMap;

use crate::config::Params;
use crate::types::{AdAction, AdRecoRow, MasterStyleRow, WatchlistRow};

const TRENDING_MOMENTUM: f64 = 0.2;

/// Inputs for one style's recommendation.
#[derive(Debug, Clone, Copy)]
pub struct AdSignals {
    pub orders_recent: u64,
    pub return_pct_recent: f64,
    pub momentum_pct: f64,
    pub lifetime_orders: u64,
    pub gmv: f64,
    pub age_days: Option<i64>,
}

/// First matching rule wins.
pub fn recommend(s: &AdSignals, params: &Params) -> AdAction {
    let min = params.start_recent_min_orders;
    let selling = s.orders_recent >= min;
    if selling && s.return_pct_recent < params.high_return_pct && s.gmv >= params.scale_min_gmv {
        AdAction::Scale
    } else if selling && s.momentum_pct >= TRENDING_MOMENTUM {
        AdAction::TrendingPush
    } else if !selling && s.age_days.is_some_and(|d| d <= params.new_age_days) {
        AdAction::PushNewDiscovery
    } else if s.lifetime_orders == 0 && s.age_days.is_some_and(|d| d > params.new_age_days) {
        AdAction::PushZeroSale
    } else if selling && s.return_pct_recent >= params.high_return_pct {
        AdAction::StopHighReturns
    } else {
        AdAction::Watch
    }
}

pub fn build_ads_reco(
    master: &[MasterStyleRow],
    watchlist: &[WatchlistRow],
    params: &Params,
) -> Vec<AdRecoRow> {
    let watch: HashMap<&str, &WatchlistRow> = watchlist
        .iter()
        .map(|w| (w.style_key.as_str(), w))
        .collect();

    master
        .iter()
        .map(|m| {
            let w = watch.get(m.style_key.as_str());
            let signals = AdSignals {
                orders_recent: w.map_or(0, |w| w.orders_recent),
                return_pct_recent: w.map_or(0.0, |w| w.return_pct_recent),
                momentum_pct: w.map_or(0.0, |w| w.momentum_pct),
                lifetime_orders: m.orders,
                gmv: m.gmv,
                // Unsold styles are aged from their catalog live date.
                age_days: m.days_since_first_order.or(m.days_since_live),
            };
            AdRecoRow {
                style_id: m.style_id.clone(),
                style_key: m.style_key.clone(),
                status: m.status,
                orders_recent: signals.orders_recent,
                return_pct_recent: signals.return_pct_recent,
                momentum_pct: signals.momentum_pct,
                gmv: m.gmv,
                action: recommend(&signals, params),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> AdSignals {
        AdSignals {
            orders_recent: 0,
            return_pct_recent: 0.0,
            momentum_pct: 0.0,
            lifetime_orders: 0,
            gmv: 0.0,
            age_days: Some(200),
        }
    }

    #[test]
    fn scale_needs_volume_and_gmv() {
        let p = Params::default();
        let s = AdSignals {
            orders_recent: 5,
            lifetime_orders: 40,
            gmv: 12_000.0,
            ..signals()
        };
        assert_eq!(recommend(&s, &p), AdAction::Scale);
        let s = AdSignals { gmv: 500.0, ..s };
        assert_eq!(recommend(&s, &p), AdAction::Watch);
        let s = AdSignals { momentum_pct: 0.2, ..s };
        assert_eq!(recommend(&s, &p), AdAction::TrendingPush);
    }

    #[test]
    fn young_slow_styles_get_discovery_push() {
        let p = Params::default();
        let s = AdSignals {
            orders_recent: 1,
            lifetime_orders: 1,
            age_days: Some(10),
            ..signals()
        };
        assert_eq!(recommend(&s, &p), AdAction::PushNewDiscovery);
    }

    #[test]
    fn old_unsold_styles_get_zero_sale_push() {
        let p = Params::default();
        assert_eq!(recommend(&signals(), &p), AdAction::PushZeroSale);
        // Unknown age cannot be judged either way.
        let s = AdSignals { age_days: None, ..signals() };
        assert_eq!(recommend(&s, &p), AdAction::Watch);
    }

    #[test]
    fn unsold_catalog_styles_are_aged_from_live_date() {
        use crate::master::build_master_table;
        use crate::types::CatalogRecord;
        use chrono::{Duration, NaiveDate};

        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let listed = |key: &str, days_ago: Option<i64>| CatalogRecord {
            style_id: key.to_string(),
            style_key: key.to_string(),
            brand: None,
            live_date: days_ago.map(|d| today - Duration::days(d)),
        };
        let catalog = [
            listed("stale", Some(100)),
            listed("fresh", Some(10)),
            listed("undated", None),
        ];
        let p = Params::default();
        let master = build_master_table(&[], &[], &catalog, &p, today);
        let actions: Vec<AdAction> = build_ads_reco(&master, &[], &p)
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(
            actions,
            [AdAction::PushZeroSale, AdAction::PushNewDiscovery, AdAction::Watch]
        );
    }

    #[test]
    fn high_returns_stop_spend() {
        let p = Params::default();
        let s = AdSignals {
            orders_recent: 4,
            lifetime_orders: 30,
            return_pct_recent: 0.5,
            gmv: 50_000.0,
            ..signals()
        };
        assert_eq!(recommend(&s, &p), AdAction::StopHighReturns);
    }
}
