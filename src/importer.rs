use crate::columns::{detect_columns, ColumnMapping, Role, TableKind};
use crate::error::{ReportError, Result};
use crate::style_key::normalize_style_key;
use crate::types::{CatalogRecord, ReturnRecord, SalesRecord};
use crate::util::{parse_date_lenient, parse_f64_safe};
use csv::ReaderBuilder;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header plus untyped string fields, exactly as read from the CSV file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            // Ragged rows are padded so every lookup by column index is safe.
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(RawTable { headers, rows })
    }

    pub fn from_path(path: &Path) -> Result<RawTable> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Fail on the first non-empty date that does not parse.
    pub strict_dates: bool,
}

/// What happened to the rows of one import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub table: TableKind,
    pub total_rows: usize,
    pub kept_rows: usize,
    pub degraded_dates: usize,
    pub degraded_numbers: usize,
    pub dropped_empty_keys: usize,
    pub mapping: ColumnMapping,
}

impl ImportReport {
    fn new(table: TableKind, total_rows: usize, mapping: ColumnMapping) -> Self {
        Self {
            table,
            total_rows,
            kept_rows: 0,
            degraded_dates: 0,
            degraded_numbers: 0,
            dropped_empty_keys: 0,
            mapping,
        }
    }

    fn log(&self) {
        info!(
            table = %self.table,
            total = self.total_rows,
            kept = self.kept_rows,
            degraded_dates = self.degraded_dates,
            degraded_numbers = self.degraded_numbers,
            dropped_empty_keys = self.dropped_empty_keys,
            "import finished"
        );
    }
}

#[derive(Debug, Clone)]
pub struct Import<T> {
    pub records: Vec<T>,
    pub report: ImportReport,
}

// Resolved column positions for one table.
struct Cols {
    by_role: Vec<(Role, usize)>,
}

impl Cols {
    fn resolve(table: &RawTable, mapping: &ColumnMapping) -> Cols {
        let by_role = mapping
            .iter()
            .filter_map(|(role, name)| table.column_index(name).map(|i| (role, i)))
            .collect();
        Cols { by_role }
    }

    fn get<'r>(&self, role: Role, row: &'r [String]) -> Option<&'r str> {
        self.by_role
            .iter()
            .find(|(r, _)| *r == role)
            .and_then(|(_, i)| row.get(*i))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn has(&self, role: Role) -> bool {
        self.by_role.iter().any(|(r, _)| *r == role)
    }
}

fn text(v: Option<&str>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// Lenient date with degradation bookkeeping; strict mode turns a bad value
// into an error instead.
fn read_date(
    raw: Option<&str>,
    row_no: usize,
    column: &str,
    opts: ImportOptions,
    report: &mut ImportReport,
) -> Result<Option<chrono::NaiveDate>> {
    let parsed = parse_date_lenient(raw);
    if parsed.is_none() {
        if let Some(value) = raw {
            if opts.strict_dates {
                return Err(ReportError::FieldParse {
                    table: report.table,
                    row: row_no,
                    column: column.to_string(),
                    value: value.to_string(),
                });
            }
            debug!(table = %report.table, row = row_no, value, "unparseable date kept as empty");
        }
        report.degraded_dates += 1;
    }
    Ok(parsed)
}

/// Import a sales export using the auto-detected mapping.
pub fn import_sales(table: &RawTable, opts: ImportOptions) -> Result<Import<SalesRecord>> {
    let mapping = detect_columns(TableKind::Sales, &table.headers)?;
    import_sales_with(table, &mapping, opts)
}

/// Import a sales export using a caller-confirmed mapping.
pub fn import_sales_with(
    table: &RawTable,
    mapping: &ColumnMapping,
    opts: ImportOptions,
) -> Result<Import<SalesRecord>> {
    mapping.validate(TableKind::Sales, &table.headers)?;
    let cols = Cols::resolve(table, mapping);
    let date_col = mapping.get(Role::Date).unwrap_or_default();
    let mut report = ImportReport::new(TableKind::Sales, table.len(), mapping.clone());
    let mut records = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 2;
        let style_raw = cols.get(Role::Style, row);
        let style_key = normalize_style_key(style_raw);
        if style_key.is_empty() {
            report.dropped_empty_keys += 1;
            continue;
        }
        let order_date =
            read_date(cols.get(Role::Date, row), row_no, date_col, opts, &mut report)?;

        // One row is one unit, so GMV is the row's price as-is.
        let net_gmv = if cols.has(Role::Price) {
            let raw = cols.get(Role::Price, row);
            parse_f64_safe(raw).unwrap_or_else(|| {
                report.degraded_numbers += 1;
                0.0
            })
        } else {
            0.0
        };

        records.push(SalesRecord {
            order_date,
            style_id: style_raw.unwrap_or_default().trim().to_string(),
            style_key,
            net_units: 1,
            net_gmv,
            brand: text(cols.get(Role::Brand, row)),
            size: text(cols.get(Role::Size, row)),
        });
    }

    report.kept_rows = records.len();
    report.log();
    Ok(Import { records, report })
}

/// Import a returns export using the auto-detected mapping.
pub fn import_returns(table: &RawTable, opts: ImportOptions) -> Result<Import<ReturnRecord>> {
    let mapping = detect_columns(TableKind::Returns, &table.headers)?;
    import_returns_with(table, &mapping, opts)
}

/// Import a returns export using a caller-confirmed mapping.
pub fn import_returns_with(
    table: &RawTable,
    mapping: &ColumnMapping,
    opts: ImportOptions,
) -> Result<Import<ReturnRecord>> {
    mapping.validate(TableKind::Returns, &table.headers)?;
    let cols = Cols::resolve(table, mapping);
    let date_col = mapping.get(Role::Date).unwrap_or_default();
    let mut report = ImportReport::new(TableKind::Returns, table.len(), mapping.clone());
    let mut records = Vec::with_capacity(table.len());

    for (i, row) in table.rows.iter().enumerate() {
        let row_no = i + 2;
        let style_raw = cols.get(Role::Style, row);
        let style_key = normalize_style_key(style_raw);
        if style_key.is_empty() {
            report.dropped_empty_keys += 1;
            continue;
        }
        let return_date =
            read_date(cols.get(Role::Date, row), row_no, date_col, opts, &mut report)?;

        let units_returned = if cols.has(Role::Quantity) {
            parse_f64_safe(cols.get(Role::Quantity, row)).unwrap_or_else(|| {
                report.degraded_numbers += 1;
                1.0
            })
        } else {
            1.0
        };

        records.push(ReturnRecord {
            return_date,
            style_id: style_raw.unwrap_or_default().trim().to_string(),
            style_key,
            units_returned,
            return_type: text(cols.get(Role::Type, row))
                .unwrap_or_else(|| "(Unknown)".to_string()),
            reason: text(cols.get(Role::Reason, row)),
        });
    }

    report.kept_rows = records.len();
    report.log();
    Ok(Import { records, report })
}

/// Import a catalog/listings export. A catalog without a recognizable style
/// column yields no records rather than an error.
pub fn import_catalog(table: &RawTable) -> Result<Import<CatalogRecord>> {
    let mapping = detect_columns(TableKind::Catalog, &table.headers)?;
    import_catalog_with(table, &mapping)
}

pub fn import_catalog_with(
    table: &RawTable,
    mapping: &ColumnMapping,
) -> Result<Import<CatalogRecord>> {
    mapping.validate(TableKind::Catalog, &table.headers)?;
    let cols = Cols::resolve(table, mapping);
    let mut report = ImportReport::new(TableKind::Catalog, table.len(), mapping.clone());
    let mut records = Vec::new();

    if cols.has(Role::Style) {
        for row in &table.rows {
            let style_raw = cols.get(Role::Style, row);
            let style_key = normalize_style_key(style_raw);
            if style_key.is_empty() {
                report.dropped_empty_keys += 1;
                continue;
            }
            let live_raw = cols.get(Role::Date, row);
            let live_date = parse_date_lenient(live_raw);
            if live_date.is_none() && live_raw.is_some() {
                report.degraded_dates += 1;
            }
            records.push(CatalogRecord {
                style_id: style_raw.unwrap_or_default().trim().to_string(),
                style_key,
                brand: text(cols.get(Role::Brand, row)),
                live_date,
            });
        }
    }

    report.kept_rows = records.len();
    report.log();
    Ok(Import { records, report })
}
