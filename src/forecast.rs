//! Event inventory forecast per style.
//!
//! gross    = avg_daily * event_days * traffic * seasonality [* (1 + momentum)]
//! net      = gross * (1 - return_rate)
//! safety   = z * sqrt(gross)
//! required = ceil(net + safety)

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::config::Params;
use crate::kpi::Window;
use crate::types::{ForecastRow, MasterStyleRow, SalesRecord, WatchlistRow};

/// z for a ~90% service level, used unless the service level is honored.
pub const FIXED_Z: f64 = 1.28;

const MOMENTUM_FLOOR: f64 = -0.3;
const MOMENTUM_CAP: f64 = 0.5;

/// Standard normal quantile (Acklam's rational approximation, |error| < 1.2e-9).
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239e0,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838e0,
        -2.549732539343734e0,
        4.374664141464968e0,
        2.938163982698783e0,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996e0,
        3.754408661907416e0,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}

/// z used for safety stock under `params`.
pub fn safety_z(params: &Params) -> f64 {
    if params.dynamic_service_level {
        normal_quantile(params.service_level)
    } else {
        FIXED_Z
    }
}

/// Quantities for one style given its lookback orders and momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleForecast {
    pub avg_daily_sales: f64,
    pub gross: f64,
    pub net: f64,
    pub safety: f64,
    pub total_required: u64,
}

pub fn forecast_style(orders_lookback: u64, momentum: f64, params: &Params) -> StyleForecast {
    let avg_daily_sales = orders_lookback as f64 / params.forecast_lookback_days as f64;
    let mut gross = avg_daily_sales
        * params.event_days as f64
        * params.traffic_multiplier
        * params.seasonality_boost;
    if params.use_momentum_adjust {
        gross *= 1.0 + momentum.clamp(MOMENTUM_FLOOR, MOMENTUM_CAP);
    }
    let net = gross * (1.0 - params.forecast_return_rate);
    let safety = safety_z(params) * gross.max(0.0).sqrt();
    StyleForecast {
        avg_daily_sales,
        gross,
        net,
        safety,
        total_required: (net + safety).max(0.0).ceil() as u64,
    }
}

/// Forecast every master style that sold inside the lookback window.
pub fn build_forecast(
    master: &[MasterStyleRow],
    watchlist: &[WatchlistRow],
    sales: &[SalesRecord],
    params: &Params,
    today: NaiveDate,
) -> Vec<ForecastRow> {
    let lookback = Window::trailing(today, params.forecast_lookback_days);
    let mut orders: HashMap<&str, u64> = HashMap::new();
    for s in sales.iter().filter(|s| lookback.contains(s.order_date)) {
        *orders.entry(s.style_key.as_str()).or_default() += s.net_units as u64;
    }
    let momentum: HashMap<&str, f64> = watchlist
        .iter()
        .map(|w| (w.style_key.as_str(), w.momentum_pct))
        .collect();
    let z = safety_z(params);

    let rows: Vec<ForecastRow> = master
        .iter()
        .filter_map(|m| {
            let n = *orders.get(m.style_key.as_str()).filter(|n| **n > 0)?;
            let mom = momentum.get(m.style_key.as_str()).copied().unwrap_or(0.0);
            let f = forecast_style(n, mom, params);
            Some(ForecastRow {
                style_id: m.style_id.clone(),
                style_key: m.style_key.clone(),
                orders_lookback: n,
                avg_daily_sales: f.avg_daily_sales,
                momentum: mom,
                gross_forecast: f.gross,
                net_forecast: f.net,
                safety_stock: f.safety,
                total_required: f.total_required,
                leadtime_days: params.leadtime_days,
                service_level: params.service_level,
                z_score: z,
            })
        })
        .collect();

    info!(styles = rows.len(), z, "forecast built");
    rows
}
