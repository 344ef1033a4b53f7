use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::Report;
use crate::util::format_int;

/// Serialize `rows` as CSV with a header row taken from the struct's serde names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    debug!(path = %path.display(), "json written");
    Ok(())
}

/// Write every table of `report` into `dir`; returns the files written.
pub fn write_report(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let files = [
        dir.join("master_styles.csv"),
        dir.join("watchlist.csv"),
        dir.join("returns_split.csv"),
        dir.join("return_reasons.csv"),
        dir.join("inventory_forecast.csv"),
        dir.join("size_allocation.csv"),
        dir.join("ads_reco.csv"),
        dir.join("kpi_summary.json"),
    ];
    write_csv(&files[0], &report.master)?;
    write_csv(&files[1], &report.watchlist)?;
    write_csv(&files[2], &report.returns_split)?;
    write_csv(&files[3], &report.return_reasons)?;
    write_csv(&files[4], &report.forecast)?;
    write_csv(&files[5], &report.size_allocation)?;
    write_csv(&files[6], &report.ads)?;
    write_json(&files[7], &report.kpis)?;
    info!(dir = %dir.display(), files = files.len(), "report written");
    Ok(files.to_vec())
}

/// Print the first `max_rows` rows of a table as Markdown, with a
/// "showing n of m" footer when rows were cut.
pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match note {
        Some(n) => println!("\n## {} ({})\n", title, n),
        None => println!("\n## {}\n", title),
    }
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let shown = rows.len().min(max_rows);
    let table = Table::new(rows[..shown].to_vec())
        .with(Style::markdown())
        .to_string();
    println!("{}", table);
    if shown < rows.len() {
        println!("(showing {} of {} rows)", format_int(shown), format_int(rows.len()));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use crate::importer::RawTable;
    use crate::pipeline::ReportContext;

    #[test]
    fn report_files_land_in_dir() {
        let dir = std::env::temp_dir().join(format!("style_report_out_{}", std::process::id()));
        let mut ctx = ReportContext::new(Params {
            today: chrono::NaiveDate::from_ymd_opt(2024, 6, 30),
            ..Params::default()
        })
        .unwrap();
        let csv = "Order Date,Style ID,Size\n2024-06-29,A,M\n";
        let sales = RawTable::from_reader(csv.as_bytes()).unwrap();
        ctx.load_sales(&sales, None).unwrap();
        let files = write_report(&dir, &ctx.run()).unwrap();
        assert_eq!(files.len(), 8);
        assert!(files.iter().all(|f| f.exists()));
        let master = std::fs::read_to_string(dir.join("master_styles.csv")).unwrap();
        assert!(master.starts_with("Style ID,StyleKey,Brand,FirstOrderDate"));
        assert!(master.contains("a,,2024-06-29"));
        let sizes = std::fs::read_to_string(dir.join("size_allocation.csv")).unwrap();
        assert!(sizes.starts_with("Style ID,StyleKey,Size,UnitsSold,Share,Allocated Units"));
        assert!(sizes.contains("A,a,M,1,1.0,"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
