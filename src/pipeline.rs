//! Caller-owned report context.
//!
//! Holds the parameters and whatever canonical tables have been loaded so
//! far. Each load replaces that table; each run recomputes every derived
//! table from scratch.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::ads::build_ads_reco;
use crate::columns::ColumnMapping;
use crate::config::Params;
use crate::error::Result;
use crate::forecast::build_forecast;
use crate::importer::{
    import_catalog, import_catalog_with, import_returns, import_returns_with, import_sales,
    import_sales_with, ImportOptions, ImportReport, RawTable,
};
use crate::kpi::summarize;
use crate::master::build_master_table;
use crate::returns_split::{build_returns_split, reason_breakdown};
use crate::size_split::build_size_allocation;
use crate::types::{
    AdRecoRow, CatalogRecord, ForecastRow, KpiSummary, MasterStyleRow, ReasonRow, ReturnRecord,
    ReturnsSplitRow, SalesRecord, SizeAllocationRow, WatchlistRow,
};
use crate::watchlist::build_watchlist;

#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub params: Params,
    pub sales: Vec<SalesRecord>,
    pub returns: Vec<ReturnRecord>,
    pub catalog: Vec<CatalogRecord>,
}

/// Every derived table of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub today: NaiveDate,
    pub kpis: KpiSummary,
    pub master: Vec<MasterStyleRow>,
    pub watchlist: Vec<WatchlistRow>,
    pub returns_split: Vec<ReturnsSplitRow>,
    pub return_reasons: Vec<ReasonRow>,
    pub forecast: Vec<ForecastRow>,
    pub size_allocation: Vec<SizeAllocationRow>,
    pub ads: Vec<AdRecoRow>,
}

impl ReportContext {
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    fn options(&self) -> ImportOptions {
        ImportOptions {
            strict_dates: self.params.strict_dates,
        }
    }

    /// Replace the sales table. `mapping` skips auto-detection when given.
    pub fn load_sales(
        &mut self,
        table: &RawTable,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        let import = match mapping {
            Some(m) => import_sales_with(table, m, self.options())?,
            None => import_sales(table, self.options())?,
        };
        self.sales = import.records;
        Ok(import.report)
    }

    pub fn load_returns(
        &mut self,
        table: &RawTable,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        let import = match mapping {
            Some(m) => import_returns_with(table, m, self.options())?,
            None => import_returns(table, self.options())?,
        };
        self.returns = import.records;
        Ok(import.report)
    }

    pub fn load_catalog(
        &mut self,
        table: &RawTable,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        let import = match mapping {
            Some(m) => import_catalog_with(table, m)?,
            None => import_catalog(table)?,
        };
        self.catalog = import.records;
        Ok(import.report)
    }

    pub fn load_sales_file(
        &mut self,
        path: &Path,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        self.load_sales(&RawTable::from_path(path)?, mapping)
    }

    pub fn load_returns_file(
        &mut self,
        path: &Path,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        self.load_returns(&RawTable::from_path(path)?, mapping)
    }

    pub fn load_catalog_file(
        &mut self,
        path: &Path,
        mapping: Option<&ColumnMapping>,
    ) -> Result<ImportReport> {
        self.load_catalog(&RawTable::from_path(path)?, mapping)
    }

    pub fn master_table(&self, today: NaiveDate) -> Vec<MasterStyleRow> {
        build_master_table(&self.sales, &self.returns, &self.catalog, &self.params, today)
    }

    pub fn kpis(&self, today: NaiveDate, master: Option<&[MasterStyleRow]>) -> KpiSummary {
        summarize(
            &self.sales,
            &self.returns,
            master,
            today,
            self.params.report_window(today),
        )
    }

    /// Run every stage in dependency order.
    pub fn run(&self) -> Report {
        let p = &self.params;
        let today = p.today();
        info!(
            %today,
            sales = self.sales.len(),
            returns = self.returns.len(),
            catalog = self.catalog.len(),
            "running report"
        );

        let master = self.master_table(today);
        let kpis = self.kpis(today, Some(&master));
        let watchlist = build_watchlist(&master, &self.sales, &self.returns, p, today);
        let returns_split =
            build_returns_split(&master, &self.returns, today, p.return_window_days);
        let return_reasons = reason_breakdown(&master, &self.returns, today, p.return_window_days);
        let forecast = build_forecast(&master, &watchlist, &self.sales, p, today);
        let size_allocation = build_size_allocation(&forecast, &self.sales, p, today);
        let ads = build_ads_reco(&master, &watchlist, p);

        Report {
            today,
            kpis,
            master,
            watchlist,
            returns_split,
            return_reasons,
            forecast,
            size_allocation,
            ads,
        }
    }
}
