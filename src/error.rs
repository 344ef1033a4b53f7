//! Pipeline error types.
//!
//! Table-level failures abort one import or one report stage. Row-level
//! parse failures never show up here unless strict date parsing is on;
//! they degrade the field and are counted in the import report instead.

use thiserror::Error;

use crate::columns::{Role, TableKind};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{table} CSV must contain a {role} column (none of the headers matched)")]
    MissingRequiredColumn { table: TableKind, role: Role },

    #[error("{table} mapping binds {role} to '{column}', which is not a header of the file")]
    UnknownColumn {
        table: TableKind,
        role: Role,
        column: String,
    },

    #[error("{table} row {row}: cannot parse {column} value '{value}'")]
    FieldParse {
        table: TableKind,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
