use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

use crate::util::{format_number, format_pct};

// ---------------------------------------------------------------------------
// Canonical records produced by the importer
// ---------------------------------------------------------------------------

/// One sold unit. Sales exports carry no quantity: every row is one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    #[serde(rename = "OrderDate")]
    pub order_date: Option<NaiveDate>,
    #[serde(rename = "StyleID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    pub style_key: String,
    #[serde(rename = "NetUnits")]
    pub net_units: u32,
    #[serde(rename = "NetGMV")]
    pub net_gmv: f64,
    #[serde(rename = "Brand")]
    pub brand: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnRecord {
    #[serde(rename = "ReturnDate")]
    pub return_date: Option<NaiveDate>,
    #[serde(rename = "StyleID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    pub style_key: String,
    #[serde(rename = "UnitsReturned")]
    pub units_returned: f64,
    #[serde(rename = "ReturnType")]
    pub return_type: String,
    #[serde(rename = "Reason")]
    pub reason: Option<String>,
}

impl ReturnRecord {
    pub fn kind(&self) -> ReturnKind {
        ReturnKind::classify(&self.return_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    #[serde(rename = "StyleID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    pub style_key: String,
    #[serde(rename = "Brand")]
    pub brand: Option<String>,
    #[serde(rename = "LiveDate")]
    pub live_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnKind {
    #[serde(rename = "RTO")]
    Rto,
    Return,
}

impl ReturnKind {
    /// RTO when the free-text type mentions "rto" in any case.
    pub fn classify(return_type: &str) -> ReturnKind {
        if return_type.to_uppercase().contains("RTO") {
            ReturnKind::Rto
        } else {
            ReturnKind::Return
        }
    }
}

// ---------------------------------------------------------------------------
// Classification labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "Catalog-Only")]
    CatalogOnly,
    #[serde(rename = "Zero-Sale")]
    ZeroSale,
    New,
    Active,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::CatalogOnly => "Catalog-Only",
            Status::ZeroSale => "Zero-Sale",
            Status::New => "New",
            Status::Active => "Active",
            Status::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NewnessBucket {
    #[serde(rename = "0-7d")]
    Days0To7,
    #[serde(rename = "8-30d")]
    Days8To30,
    #[serde(rename = "31-60d")]
    Days31To60,
    #[serde(rename = "61-90d")]
    Days61To90,
    #[serde(rename = "91d+")]
    Days91Plus,
    Unknown,
}

impl NewnessBucket {
    pub fn from_age(days: Option<i64>) -> NewnessBucket {
        match days {
            None => NewnessBucket::Unknown,
            Some(d) if d <= 7 => NewnessBucket::Days0To7,
            Some(d) if d <= 30 => NewnessBucket::Days8To30,
            Some(d) if d <= 60 => NewnessBucket::Days31To60,
            Some(d) if d <= 90 => NewnessBucket::Days61To90,
            Some(_) => NewnessBucket::Days91Plus,
        }
    }
}

impl fmt::Display for NewnessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NewnessBucket::Days0To7 => "0-7d",
            NewnessBucket::Days8To30 => "8-30d",
            NewnessBucket::Days31To60 => "31-60d",
            NewnessBucket::Days61To90 => "61-90d",
            NewnessBucket::Days91Plus => "91d+",
            NewnessBucket::Unknown => "Unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskFlag {
    #[serde(rename = "")]
    None,
    #[serde(rename = "High Returns")]
    HighReturns,
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskFlag::None => "",
            RiskFlag::HighReturns => "High Returns",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchTag {
    New,
    Started,
    Rising,
    Falling,
    Flat,
}

impl fmt::Display for WatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WatchTag::New => "NEW",
            WatchTag::Started => "STARTED",
            WatchTag::Rising => "RISING",
            WatchTag::Falling => "FALLING",
            WatchTag::Flat => "FLAT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdAction {
    #[serde(rename = "SCALE")]
    Scale,
    #[serde(rename = "TRENDING PUSH")]
    TrendingPush,
    #[serde(rename = "PUSH (New Discovery)")]
    PushNewDiscovery,
    #[serde(rename = "PUSH (Zero-Sale)")]
    PushZeroSale,
    #[serde(rename = "STOP (High Returns)")]
    StopHighReturns,
    #[serde(rename = "WATCH")]
    Watch,
}

impl fmt::Display for AdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdAction::Scale => "SCALE",
            AdAction::TrendingPush => "TRENDING PUSH",
            AdAction::PushNewDiscovery => "PUSH (New Discovery)",
            AdAction::PushZeroSale => "PUSH (Zero-Sale)",
            AdAction::StopHighReturns => "STOP (High Returns)",
            AdAction::Watch => "WATCH",
        })
    }
}

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MasterStyleRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "Brand")]
    #[tabled(skip)]
    pub brand: Option<String>,
    #[serde(rename = "FirstOrderDate")]
    #[tabled(rename = "FirstOrder", display_with = "display_date")]
    pub first_order_date: Option<NaiveDate>,
    #[serde(rename = "LastOrderDate")]
    #[tabled(rename = "LastOrder", display_with = "display_date")]
    pub last_order_date: Option<NaiveDate>,
    #[serde(rename = "Days_Since_FirstOrder")]
    #[tabled(rename = "Age", display_with = "display_days")]
    pub days_since_first_order: Option<i64>,
    /// Earliest catalog live date seen for the style.
    #[serde(rename = "LiveDate")]
    #[tabled(skip)]
    pub live_date: Option<NaiveDate>,
    #[serde(rename = "Days_Since_Live")]
    #[tabled(skip)]
    pub days_since_live: Option<i64>,
    #[serde(rename = "Newness_Bucket")]
    #[tabled(rename = "Newness")]
    pub newness_bucket: NewnessBucket,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "GMV")]
    #[tabled(rename = "GMV", display_with = "display_money")]
    pub gmv: f64,
    #[serde(rename = "UnitsReturned")]
    #[tabled(rename = "Returned", display_with = "display_units")]
    pub units_returned: f64,
    #[serde(rename = "ReturnPct")]
    #[tabled(rename = "Return%", display_with = "display_ratio")]
    pub return_pct: f64,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: Status,
    #[serde(rename = "RiskFlag")]
    #[tabled(rename = "RiskFlag")]
    pub risk_flag: RiskFlag,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WatchlistRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "Tag")]
    #[tabled(rename = "Tag")]
    pub tag: WatchTag,
    #[serde(rename = "OrdersRecent")]
    #[tabled(rename = "Recent")]
    pub orders_recent: u64,
    #[serde(rename = "OrdersPrevious")]
    #[tabled(rename = "Previous")]
    pub orders_previous: u64,
    #[serde(rename = "MomentumPct")]
    #[tabled(rename = "Momentum", display_with = "display_ratio")]
    pub momentum_pct: f64,
    #[serde(rename = "New?")]
    #[tabled(skip)]
    pub is_new: bool,
    #[serde(rename = "ReturnsRecent")]
    #[tabled(rename = "Returns", display_with = "display_units")]
    pub returns_recent: f64,
    #[serde(rename = "ReturnPctRecent")]
    #[tabled(rename = "Return%", display_with = "display_ratio")]
    pub return_pct_recent: f64,
    #[serde(rename = "RTO Qty")]
    #[tabled(skip)]
    pub rto_qty: f64,
    #[serde(rename = "Return Qty")]
    #[tabled(skip)]
    pub return_qty: f64,
    #[serde(rename = "Note")]
    #[tabled(rename = "Note")]
    pub note: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReturnsSplitRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "RTO Qty")]
    #[tabled(rename = "RTO Qty", display_with = "display_units")]
    pub rto_qty: f64,
    #[serde(rename = "Return Qty")]
    #[tabled(rename = "Return Qty", display_with = "display_units")]
    pub return_qty: f64,
    #[serde(rename = "Total Returns")]
    #[tabled(rename = "Total", display_with = "display_units")]
    pub total_returns: f64,
    #[serde(rename = "RTO %")]
    #[tabled(rename = "RTO %", display_with = "display_ratio")]
    pub rto_pct: f64,
    #[serde(rename = "Return %")]
    #[tabled(rename = "Return %", display_with = "display_ratio")]
    pub return_pct: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReasonRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "Reason")]
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "UnitsReturned")]
    #[tabled(rename = "Units", display_with = "display_units")]
    pub units_returned: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "OrdersLookback")]
    #[tabled(rename = "Orders")]
    pub orders_lookback: u64,
    #[serde(rename = "Avg Daily Sales")]
    #[tabled(rename = "Avg/Day", display_with = "display_rate")]
    pub avg_daily_sales: f64,
    #[serde(rename = "Momentum")]
    #[tabled(skip)]
    pub momentum: f64,
    #[serde(rename = "Gross Forecast")]
    #[tabled(rename = "Gross", display_with = "display_units")]
    pub gross_forecast: f64,
    #[serde(rename = "Net Forecast")]
    #[tabled(rename = "Net", display_with = "display_units")]
    pub net_forecast: f64,
    #[serde(rename = "Safety Stock")]
    #[tabled(rename = "Safety", display_with = "display_units")]
    pub safety_stock: f64,
    #[serde(rename = "Total Required")]
    #[tabled(rename = "Required")]
    pub total_required: u64,
    #[serde(rename = "Lead Time (days)")]
    #[tabled(rename = "Lead Time")]
    pub leadtime_days: u32,
    #[serde(rename = "Service Level")]
    #[tabled(skip)]
    pub service_level: f64,
    #[serde(rename = "Z")]
    #[tabled(skip)]
    pub z_score: f64,
}

/// Units of one style's required stock assigned to one size.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SizeAllocationRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "Size")]
    #[tabled(rename = "Size")]
    pub size: String,
    #[serde(rename = "UnitsSold")]
    #[tabled(rename = "Sold")]
    pub units_sold: u64,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share", display_with = "display_ratio")]
    pub share: f64,
    #[serde(rename = "Allocated Units")]
    #[tabled(rename = "Allocated")]
    pub allocated_units: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AdRecoRow {
    #[serde(rename = "Style ID")]
    #[tabled(rename = "Style ID")]
    pub style_id: String,
    #[serde(rename = "StyleKey")]
    #[tabled(skip)]
    pub style_key: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: Status,
    #[serde(rename = "OrdersRecent")]
    #[tabled(rename = "Recent")]
    pub orders_recent: u64,
    #[serde(rename = "ReturnPctRecent")]
    #[tabled(rename = "Return%", display_with = "display_ratio")]
    pub return_pct_recent: f64,
    #[serde(rename = "MomentumPct")]
    #[tabled(rename = "Momentum", display_with = "display_ratio")]
    pub momentum_pct: f64,
    #[serde(rename = "GMV")]
    #[tabled(rename = "GMV", display_with = "display_money")]
    pub gmv: f64,
    #[serde(rename = "Recommendation")]
    #[tabled(rename = "Recommendation")]
    pub action: AdAction,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DailyOrders {
    #[serde(rename = "Day")]
    #[tabled(rename = "Day")]
    pub day: NaiveDate,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
}

#[derive(Debug, Serialize, Clone)]
pub struct ReasonCount {
    pub reason: String,
    pub units: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct KpiSummary {
    pub window_days: u32,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_orders: u64,
    pub total_gmv: f64,
    pub total_returns: f64,
    pub return_pct: f64,
    pub rto_qty: f64,
    pub return_qty: f64,
    pub rto_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_styles: Option<usize>,
    pub daily_orders: Vec<DailyOrders>,
    pub top_return_reasons: Vec<ReasonCount>,
}

fn display_date(d: &Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_default()
}

fn display_days(d: &Option<i64>) -> String {
    d.map(|d| d.to_string()).unwrap_or_default()
}

fn display_money(v: &f64) -> String {
    format_number(*v, 2)
}

fn display_units(v: &f64) -> String {
    format_number(*v, 0)
}

fn display_rate(v: &f64) -> String {
    format_number(*v, 2)
}

fn display_ratio(v: &f64) -> String {
    format_pct(*v)
}
