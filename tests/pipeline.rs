use chrono::NaiveDate;

use style_report::columns::{ColumnMapping, Role};
use style_report::importer::RawTable;
use style_report::master::zero_sale_styles;
use style_report::types::{AdAction, Status, WatchTag};
use style_report::watchlist::momentum;
use style_report::{Params, Report, ReportContext};

// today = 2024-06-30; recent window 05-31..06-30, previous 04-30..05-30.
const SALES: &str = "\
Order Date,Style ID,Final Price,Brand,Size
2024-03-22,OLD-1,500,Roadster,S
2024-06-20,OLD-1,500,Roadster,M
2024-06-21,old-1,500,Roadster,M
2024-06-22,OLD-1 ,500,Roadster,L
2024-06-25,NEW-1,500,HRX,
2024-06-26,NEW-1,500,HRX,
2024-01-10,DORM-1,300,HRX,XL
";

const RETURNS: &str = "\
Return Date,Style ID,Qty,Return Type,Reason
2024-06-25,OLD-1,1,RTO,
2024-06-26,OLD-1,1,Customer Return,Size issue
2024-02-01,DORM-1,1,Customer Return,Quality
";

const CATALOG: &str = "\
Style ID,Brand,First Updated
OLD-1,Roadster,2024-03-01
NEW-1,HRX,2024-06-20
CAT-1,HRX,2024-06-01
DORM-1,HRX,2023-12-01
";

fn table(csv: &str) -> RawTable {
    RawTable::from_reader(csv.as_bytes()).unwrap()
}

fn context() -> ReportContext {
    let mut ctx = ReportContext::new(Params {
        today: NaiveDate::from_ymd_opt(2024, 6, 30),
        ..Params::default()
    })
    .unwrap();
    ctx.load_sales(&table(SALES), None).unwrap();
    ctx.load_returns(&table(RETURNS), None).unwrap();
    ctx.load_catalog(&table(CATALOG), None).unwrap();
    ctx
}

fn run() -> Report {
    context().run()
}

#[test]
fn sales_headers_resolve_without_quantity() {
    let mut ctx = ReportContext::new(Params::default()).unwrap();
    let report = ctx.load_sales(&table(SALES), None).unwrap();
    assert_eq!(report.mapping.get(Role::Date), Some("Order Date"));
    assert_eq!(report.mapping.get(Role::Style), Some("Style ID"));
    assert_eq!(report.mapping.get(Role::Price), Some("Final Price"));
    assert_eq!(report.mapping.get(Role::Quantity), None);
    assert_eq!(report.mapping.get(Role::Size), Some("Size"));
    assert_eq!(report.kept_rows, 7);
}

#[test]
fn explicit_mapping_overrides_detection() {
    let mut ctx = ReportContext::new(Params::default()).unwrap();
    let csv = "When,Code,Order Date\n2024-06-01,A,garbage\n";
    let mapping = ColumnMapping::new()
        .with(Role::Date, "When")
        .with(Role::Style, "Code");
    let report = ctx.load_sales(&table(csv), Some(&mapping)).unwrap();
    assert_eq!(report.degraded_dates, 0);
    assert_eq!(ctx.sales[0].order_date, NaiveDate::from_ymd_opt(2024, 6, 1));

    let wrong = ColumnMapping::new()
        .with(Role::Date, "Nope")
        .with(Role::Style, "Code");
    assert!(ctx.load_sales(&table(csv), Some(&wrong)).is_err());
}

#[test]
fn catalog_defines_the_universe() {
    let report = run();
    let keys: Vec<&str> = report.master.iter().map(|m| m.style_key.as_str()).collect();
    assert_eq!(keys, ["old-1", "new-1", "cat-1", "dorm-1"]);

    let cat = &report.master[2];
    assert_eq!(cat.status, Status::CatalogOnly);
    assert_eq!(cat.orders, 0);
    assert_eq!(cat.first_order_date, None);

    let old = &report.master[0];
    assert_eq!(old.orders, 4);
    assert_eq!(old.gmv, 2000.0);
    assert_eq!(old.units_returned, 2.0);
    assert_eq!(old.return_pct, 0.5);
    assert_eq!(old.status, Status::Active);
    assert_eq!(report.master[1].status, Status::New);
}

#[test]
fn aged_style_restarting_is_started() {
    let report = run();
    let old = report
        .watchlist
        .iter()
        .find(|w| w.style_key == "old-1")
        .unwrap();
    assert_eq!(old.orders_recent, 3);
    assert_eq!(old.orders_previous, 0);
    assert_eq!(old.tag, WatchTag::Started);
    assert_eq!(old.momentum_pct, momentum(3, 0));

    let new = report
        .watchlist
        .iter()
        .find(|w| w.style_key == "new-1")
        .unwrap();
    assert_eq!(new.tag, WatchTag::New);
    assert!(new.is_new);
}

#[test]
fn forecast_skips_styles_without_recent_sales() {
    let report = run();
    let keys: Vec<&str> = report.forecast.iter().map(|f| f.style_key.as_str()).collect();
    assert_eq!(keys, ["old-1", "new-1"]);
    assert!(report.forecast.iter().all(|f| f.total_required > 0));
}

#[test]
fn returns_split_counts_recent_rto_and_customer_returns() {
    let report = run();
    assert_eq!(report.returns_split.len(), 1);
    let split = &report.returns_split[0];
    assert_eq!(split.style_key, "old-1");
    assert_eq!(split.rto_qty, 1.0);
    assert_eq!(split.return_qty, 1.0);
    assert_eq!(split.rto_pct, 0.5);

    assert_eq!(report.return_reasons.len(), 1);
    assert_eq!(report.return_reasons[0].reason, "Size issue");
}

#[test]
fn kpis_cover_the_trailing_window() {
    let report = run();
    assert_eq!(report.kpis.total_orders, 5);
    assert_eq!(report.kpis.total_returns, 2.0);
    assert_eq!(report.kpis.rto_qty, 1.0);
    assert_eq!(report.kpis.active_styles, Some(2));
}

#[test]
fn ads_follow_recent_signals() {
    let report = run();
    let action = |key: &str| {
        report
            .ads
            .iter()
            .find(|a| a.style_key == key)
            .map(|a| a.action)
            .unwrap()
    };
    assert_eq!(action("old-1"), AdAction::TrendingPush);
    // Listed 29 days ago and never sold.
    assert_eq!(action("cat-1"), AdAction::PushNewDiscovery);
    assert_eq!(action("dorm-1"), AdAction::Watch);
}

#[test]
fn unsold_listed_styles_count_as_zero_sale() {
    let report = run();
    let cat = &report.master[2];
    assert_eq!(cat.live_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    assert_eq!(cat.days_since_live, Some(29));
    let zero: Vec<String> = zero_sale_styles(&report.master, 14)
        .into_iter()
        .map(|r| r.style_key)
        .collect();
    assert_eq!(zero, ["cat-1"]);
}

#[test]
fn required_units_split_by_recent_sizes() {
    let report = run();
    let required = report
        .forecast
        .iter()
        .find(|f| f.style_key == "old-1")
        .map(|f| f.total_required)
        .unwrap();
    let sizes: Vec<(&str, u64)> = report
        .size_allocation
        .iter()
        .map(|r| (r.size.as_str(), r.allocated_units))
        .collect();
    // The March "S" sale is outside the 60-day size lookback.
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[0].0, "M");
    assert_eq!(sizes[1].0, "L");
    assert!(sizes[0].1 >= sizes[1].1);
    assert_eq!(sizes[0].1 + sizes[1].1, required);
}

#[test]
fn calendar_month_window_moves_the_kpis() {
    let mut ctx = context();
    ctx.params.set("window_mode", "calendar_months:1").unwrap();
    let report = ctx.run();
    // May 2024 had no orders in the fixture.
    assert_eq!(report.kpis.window_start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!(report.kpis.window_end, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
    assert_eq!(report.kpis.total_orders, 0);

    ctx.params
        .set("window_mode", "between_dates:2024-01-01,2024-03-31")
        .unwrap();
    assert_eq!(ctx.run().kpis.total_orders, 2);
}

#[test]
fn huge_windows_are_rejected_before_running() {
    let mut params = Params::default();
    params.set("report_window_days", "4000000000").unwrap();
    assert!(ReportContext::new(params).is_err());
}

#[test]
fn brand_filter_without_catalog_match_yields_no_styles() {
    let mut ctx = context();
    ctx.params.set("brand_filter", "ONE:Nike").unwrap();
    let report = ctx.run();
    assert!(report.master.is_empty());
    assert!(report.watchlist.is_empty());
    assert!(report.ads.is_empty());
}

#[test]
fn brand_filter_narrows_the_catalog() {
    let mut ctx = context();
    ctx.params.set("brand_filter", "ONE:Roadster").unwrap();
    let report = ctx.run();
    assert_eq!(report.master.len(), 1);
    assert_eq!(report.master[0].style_key, "old-1");
}
