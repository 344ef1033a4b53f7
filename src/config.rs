//! Report parameters.
//!
//! Every knob of the workbook lives in [`Params`]. Defaults match the
//! workbook's seeded parameter sheet; a JSON file may override any subset
//! and `key=value` pairs from the command line override the file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ReportError, Result};
use crate::kpi::Window;

/// Longest window or lookback accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 36_500;
const MAX_WINDOW_MONTHS: u32 = 1_200;

/// Which catalog brands take part in the style universe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "brands", rename_all = "UPPERCASE")]
pub enum BrandFilter {
    #[default]
    All,
    One(String),
    List(Vec<String>),
}

impl BrandFilter {
    /// Parse `ALL`, `ONE:<brand>` or `LIST:<a>,<b>,...`.
    pub fn parse(s: &str) -> Option<BrandFilter> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(BrandFilter::All);
        }
        let (mode, rest) = s.split_once(':')?;
        match mode.trim().to_uppercase().as_str() {
            "ONE" => Some(BrandFilter::One(rest.trim().to_string())),
            "LIST" => Some(BrandFilter::List(
                rest.split(',')
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty())
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Case-insensitive membership; a style without a brand only passes `All`.
    pub fn allows(&self, brand: Option<&str>) -> bool {
        match self {
            BrandFilter::All => true,
            BrandFilter::One(want) => brand.is_some_and(|b| b.trim().eq_ignore_ascii_case(want)),
            BrandFilter::List(wants) => brand
                .is_some_and(|b| wants.iter().any(|w| b.trim().eq_ignore_ascii_case(w))),
        }
    }
}

/// How the report window (KPIs and the watchlist's recent period) is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowMode {
    /// `[today - report_window_days, today]`.
    #[default]
    RollingDays,
    /// The last `months` complete calendar months before today's month.
    CalendarMonths { months: u32 },
    /// Fixed inclusive dates; reversed bounds are swapped.
    BetweenDates { start: NaiveDate, end: NaiveDate },
}

impl WindowMode {
    /// Parse `rolling_days`, `calendar_months:<n>` or `between_dates:<from>,<to>`.
    pub fn parse(s: &str) -> Option<WindowMode> {
        let s = s.trim();
        let (mode, rest) = s.split_once(':').unwrap_or((s, ""));
        match mode.trim().to_lowercase().as_str() {
            "rolling_days" => Some(WindowMode::RollingDays),
            "calendar_months" => rest
                .trim()
                .parse()
                .ok()
                .map(|months| WindowMode::CalendarMonths { months }),
            "between_dates" => {
                let (a, b) = rest.split_once(',')?;
                Some(WindowMode::BetweenDates {
                    start: a.trim().parse().ok()?,
                    end: b.trim().parse().ok()?,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Reference date for every window; `None` means the local date at run time.
    pub today: Option<NaiveDate>,
    pub zero_sale_age_days: i64,
    pub high_return_pct: f64,
    pub watch_min_orders: u64,
    pub new_age_days: i64,
    pub start_recent_min_orders: u64,
    pub forecast_lookback_days: u32,
    pub event_days: u32,
    pub traffic_multiplier: f64,
    pub seasonality_boost: f64,
    pub forecast_return_rate: f64,
    pub leadtime_days: u32,
    pub service_level: f64,
    /// Derive the safety-stock z from `service_level` instead of the fixed 1.28.
    pub dynamic_service_level: bool,
    pub use_momentum_adjust: bool,
    pub report_window_days: u32,
    pub window_mode: WindowMode,
    pub return_window_days: u32,
    pub scale_min_gmv: f64,
    pub size_split_lookback_days: u32,
    /// Floor on any size's share of a style's required units.
    pub size_split_min_share: f64,
    pub size_split_min_units: u64,
    pub brand_filter: BrandFilter,
    /// Abort an import on the first unparseable date instead of keeping the row.
    pub strict_dates: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            today: None,
            zero_sale_age_days: 14,
            high_return_pct: 0.35,
            watch_min_orders: 3,
            new_age_days: 60,
            start_recent_min_orders: 2,
            forecast_lookback_days: 30,
            event_days: 10,
            traffic_multiplier: 3.0,
            seasonality_boost: 1.0,
            forecast_return_rate: 0.25,
            leadtime_days: 7,
            service_level: 0.9,
            dynamic_service_level: false,
            use_momentum_adjust: true,
            report_window_days: 30,
            window_mode: WindowMode::RollingDays,
            return_window_days: 30,
            scale_min_gmv: 10_000.0,
            size_split_lookback_days: 60,
            size_split_min_share: 0.05,
            size_split_min_units: 1,
            brand_filter: BrandFilter::All,
            strict_dates: false,
        }
    }
}

impl Params {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: Params = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// The pinned reference date, or the local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// The report window for `today` under [`Params::window_mode`].
    pub fn report_window(&self, today: NaiveDate) -> Window {
        match self.window_mode {
            WindowMode::RollingDays => Window::trailing(today, self.report_window_days),
            WindowMode::CalendarMonths { months } => Window::full_months_before(today, months),
            WindowMode::BetweenDates { start, end } => Window::between(start, end),
        }
    }

    /// Override one parameter by name from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        let value = value.trim();
        match key {
            "today" => self.today = Some(parse_value(key, value)?),
            "zero_sale_age_days" => self.zero_sale_age_days = parse_value(key, value)?,
            "high_return_pct" => self.high_return_pct = parse_value(key, value)?,
            "watch_min_orders" => self.watch_min_orders = parse_value(key, value)?,
            "new_age_days" => self.new_age_days = parse_value(key, value)?,
            "start_recent_min_orders" => self.start_recent_min_orders = parse_value(key, value)?,
            "forecast_lookback_days" => self.forecast_lookback_days = parse_value(key, value)?,
            "event_days" => self.event_days = parse_value(key, value)?,
            "traffic_multiplier" => self.traffic_multiplier = parse_value(key, value)?,
            "seasonality_boost" => self.seasonality_boost = parse_value(key, value)?,
            "forecast_return_rate" => self.forecast_return_rate = parse_value(key, value)?,
            "leadtime_days" => self.leadtime_days = parse_value(key, value)?,
            "service_level" => self.service_level = parse_value(key, value)?,
            "dynamic_service_level" => self.dynamic_service_level = parse_value(key, value)?,
            "use_momentum_adjust" => self.use_momentum_adjust = parse_value(key, value)?,
            "report_window_days" => self.report_window_days = parse_value(key, value)?,
            "return_window_days" => self.return_window_days = parse_value(key, value)?,
            "scale_min_gmv" => self.scale_min_gmv = parse_value(key, value)?,
            "size_split_lookback_days" => self.size_split_lookback_days = parse_value(key, value)?,
            "size_split_min_share" => self.size_split_min_share = parse_value(key, value)?,
            "size_split_min_units" => self.size_split_min_units = parse_value(key, value)?,
            "window_mode" => {
                self.window_mode = WindowMode::parse(value).ok_or_else(|| {
                    invalid(
                        key,
                        "expected rolling_days, calendar_months:<n> or between_dates:<from>,<to>",
                    )
                })?
            }
            "strict_dates" => self.strict_dates = parse_value(key, value)?,
            "brand_filter" => {
                self.brand_filter = BrandFilter::parse(value).ok_or_else(|| {
                    invalid(key, "expected ALL, ONE:<brand> or LIST:<a>,<b>")
                })?
            }
            _ => return Err(invalid(key, "unknown parameter")),
        }
        Ok(())
    }

    /// Reject values that would make a stage divide by zero, go negative or
    /// reach outside the calendar.
    pub fn validate(&self) -> Result<()> {
        for (name, days) in [
            ("forecast_lookback_days", self.forecast_lookback_days),
            ("report_window_days", self.report_window_days),
            ("size_split_lookback_days", self.size_split_lookback_days),
        ] {
            if days == 0 {
                return Err(invalid(name, "must be at least 1"));
            }
            if days > MAX_WINDOW_DAYS {
                return Err(invalid(name, "must be at most 36500 days"));
            }
        }
        if self.return_window_days > MAX_WINDOW_DAYS {
            return Err(invalid("return_window_days", "must be at most 36500 days"));
        }
        if let WindowMode::CalendarMonths { months } = self.window_mode {
            if months == 0 || months > MAX_WINDOW_MONTHS {
                return Err(invalid("window_mode", "months must be within 1..=1200"));
            }
        }
        if !(0.0..=1.0).contains(&self.size_split_min_share) {
            return Err(invalid("size_split_min_share", "must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.forecast_return_rate) {
            return Err(invalid("forecast_return_rate", "must be within 0..=1"));
        }
        if !(self.service_level > 0.0 && self.service_level < 1.0) {
            return Err(invalid("service_level", "must be strictly between 0 and 1"));
        }
        if self.high_return_pct < 0.0 {
            return Err(invalid("high_return_pct", "must not be negative"));
        }
        if self.traffic_multiplier < 0.0 || self.seasonality_boost < 0.0 {
            return Err(invalid("traffic_multiplier", "multipliers must not be negative"));
        }
        if self.zero_sale_age_days < 0 || self.new_age_days < 0 {
            return Err(invalid("new_age_days", "ages must not be negative"));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| invalid(key, &format!("cannot parse '{}'", value)))
}

fn invalid(name: &str, reason: &str) -> ReportError {
    ReportError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parameter_sheet() {
        let p = Params::default();
        assert_eq!(p.zero_sale_age_days, 14);
        assert_eq!(p.high_return_pct, 0.35);
        assert_eq!(p.watch_min_orders, 3);
        assert_eq!(p.new_age_days, 60);
        assert_eq!(p.forecast_lookback_days, 30);
        assert_eq!(p.event_days, 10);
        assert_eq!(p.traffic_multiplier, 3.0);
        assert_eq!(p.forecast_return_rate, 0.25);
        assert_eq!(p.leadtime_days, 7);
        assert_eq!(p.service_level, 0.9);
        assert!(p.use_momentum_adjust);
        assert_eq!(p.report_window_days, 30);
        assert_eq!(p.return_window_days, 30);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let p: Params =
            serde_json::from_str(r#"{"new_age_days": 45, "today": "2024-05-01"}"#).unwrap();
        assert_eq!(p.new_age_days, 45);
        assert_eq!(p.today(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(p.watch_min_orders, 3);
    }

    #[test]
    fn set_by_name() {
        let mut p = Params::default();
        p.set("traffic_multiplier", "2.5").unwrap();
        p.set("use_momentum_adjust", "false").unwrap();
        p.set("brand_filter", "LIST: Roadster, HRX").unwrap();
        assert_eq!(p.traffic_multiplier, 2.5);
        assert!(!p.use_momentum_adjust);
        assert_eq!(
            p.brand_filter,
            BrandFilter::List(vec!["Roadster".into(), "HRX".into()])
        );
        assert!(matches!(
            p.set("nope", "1"),
            Err(ReportError::InvalidParameter { .. })
        ));
        assert!(p.set("event_days", "ten").is_err());
    }

    #[test]
    fn validation_rejects_zero_lookback() {
        let p = Params {
            forecast_lookback_days: 0,
            ..Params::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let mut p = Params::default();
        p.set("report_window_days", "4000000000").unwrap();
        assert!(matches!(
            p.validate(),
            Err(ReportError::InvalidParameter { name, .. }) if name == "report_window_days"
        ));
        let p = Params {
            forecast_lookback_days: MAX_WINDOW_DAYS + 1,
            ..Params::default()
        };
        assert!(p.validate().is_err());
        let p = Params {
            window_mode: WindowMode::CalendarMonths { months: 0 },
            ..Params::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn window_mode_from_text_and_json() {
        assert_eq!(WindowMode::parse("rolling_days"), Some(WindowMode::RollingDays));
        assert_eq!(
            WindowMode::parse("calendar_months:3"),
            Some(WindowMode::CalendarMonths { months: 3 })
        );
        assert_eq!(
            WindowMode::parse("between_dates: 2024-01-01 , 2024-03-31"),
            Some(WindowMode::BetweenDates {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            })
        );
        assert_eq!(WindowMode::parse("calendar_months"), None);
        assert_eq!(WindowMode::parse("weekly"), None);

        let p: Params =
            serde_json::from_str(r#"{"window_mode": {"mode": "calendar_months", "months": 2}}"#)
                .unwrap();
        assert_eq!(p.window_mode, WindowMode::CalendarMonths { months: 2 });
    }

    #[test]
    fn report_window_per_mode() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        let rolling = Params::default().report_window(today);
        assert_eq!((rolling.start, rolling.end), (d(2024, 5, 16), today));

        let mut p = Params::default();
        p.set("window_mode", "calendar_months:2").unwrap();
        let months = p.report_window(today);
        assert_eq!((months.start, months.end), (d(2024, 4, 1), d(2024, 5, 31)));

        p.set("window_mode", "between_dates:2024-03-31,2024-01-01").unwrap();
        let between = p.report_window(today);
        assert_eq!((between.start, between.end), (d(2024, 1, 1), d(2024, 3, 31)));
    }

    #[test]
    fn brand_filter_membership() {
        let one = BrandFilter::One("Roadster".into());
        assert!(one.allows(Some(" roadster ")));
        assert!(!one.allows(Some("HRX")));
        assert!(!one.allows(None));
        assert!(BrandFilter::All.allows(None));
    }
}
