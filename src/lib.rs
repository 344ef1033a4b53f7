//! Style-level sales analytics.
//!
//! Sales, returns and catalog CSV exports go in; per-style master,
//! watchlist, returns split, forecast, size allocation and ad recommendation
//! tables plus a KPI summary come out. Every stage is a pure function over the canonical
//! tables held by a [`pipeline::ReportContext`].

pub mod ads;
pub mod columns;
pub mod config;
pub mod error;
pub mod forecast;
pub mod importer;
pub mod kpi;
pub mod master;
pub mod output;
pub mod pipeline;
pub mod returns_split;
pub mod size_split;
pub mod style_key;
pub mod types;
pub mod util;
pub mod watchlist;

pub use config::Params;
pub use error::{ReportError, Result};
pub use pipeline::{Report, ReportContext};
