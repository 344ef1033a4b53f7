//! Header auto-detection.
//!
//! Marketplace exports rename their columns from one month to the next, so
//! roles are found by keyword instead of by exact header. Detection is a
//! suggestion: callers that know better can hand an explicit
//! [`ColumnMapping`] to the importer.
//!
//! Resolution order, per table kind:
//! - roles are resolved one after another in [`TableKind::roles`] order;
//! - within a role, keywords are tried in list order (earlier = stronger)
//!   and for each keyword the headers are scanned left to right;
//! - a header bound to one role is never considered for another, and a role
//!   whose only candidates are taken stays unbound.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableKind {
    Sales,
    Returns,
    Catalog,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableKind::Sales => "Sales",
            TableKind::Returns => "Returns",
            TableKind::Catalog => "Catalog",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Date,
    Style,
    Quantity,
    Price,
    Type,
    Reason,
    Brand,
    Size,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Date => "date",
            Role::Style => "style",
            Role::Quantity => "quantity",
            Role::Price => "price",
            Role::Type => "type",
            Role::Reason => "reason",
            Role::Brand => "brand",
            Role::Size => "size",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "date" => Some(Role::Date),
            "style" => Some(Role::Style),
            "quantity" | "qty" => Some(Role::Quantity),
            "price" => Some(Role::Price),
            "type" => Some(Role::Type),
            "reason" => Some(Role::Reason),
            "brand" => Some(Role::Brand),
            "size" => Some(Role::Size),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STYLE_KEYWORDS: &[&str] = &[
    "style id", "style_id", "style code", "stylecode", "product id", "productid",
    "product code", "style", "sku",
];
const BRAND_KEYWORDS: &[&str] = &["brand name", "brand_name", "brand"];

const SALES_DATE: &[&str] = &[
    "created on", "order date", "order_date", "created_on", "created date",
    "order creation date", "date",
];
const SALES_PRICE: &[&str] = &[
    "final price", "selling price", "selling_price", "sale price", "net price",
    "unit price", "item price", "price", "gmv", "net amount", "item total",
];

const RETURNS_DATE: &[&str] = &[
    "return_registered_on", "return registered on", "return date", "return_date",
    "registered on", "registered_on", "created on", "created_on", "date",
];
const RETURNS_QTY: &[&str] = &[
    "qty returned", "quantity returned", "units returned", "return qty",
    "return quantity", "quantity", "qty", "units",
];
const RETURNS_TYPE: &[&str] = &[
    "return reason type", "return_type", "return type", "status", "type",
];
const RETURNS_REASON: &[&str] = &["sub reason", "return reason", "return_reason", "reason"];

const SALES_SIZE: &[&str] = &["size name", "size_name", "size", "variant"];

const CATALOG_DATE: &[&str] = &["first updated", "first_updated", "live date", "created"];

impl TableKind {
    /// Roles this table kind knows about, in resolution order.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            TableKind::Sales => &[
                Role::Date,
                Role::Style,
                Role::Price,
                Role::Brand,
                Role::Size,
            ],
            TableKind::Returns => &[
                Role::Date,
                Role::Style,
                Role::Quantity,
                Role::Type,
                Role::Reason,
            ],
            TableKind::Catalog => &[Role::Style, Role::Brand, Role::Date],
        }
    }

    /// Roles that must resolve for an import to proceed.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            TableKind::Sales | TableKind::Returns => &[Role::Date, Role::Style],
            TableKind::Catalog => &[],
        }
    }

    /// Ordered keyword list for `role`; empty when the role does not apply.
    pub fn keywords(&self, role: Role) -> &'static [&'static str] {
        match (self, role) {
            (TableKind::Sales, Role::Date) => SALES_DATE,
            (TableKind::Sales, Role::Style) => STYLE_KEYWORDS,
            (TableKind::Sales, Role::Price) => SALES_PRICE,
            (TableKind::Sales, Role::Brand) => BRAND_KEYWORDS,
            (TableKind::Sales, Role::Size) => SALES_SIZE,
            (TableKind::Returns, Role::Date) => RETURNS_DATE,
            (TableKind::Returns, Role::Style) => STYLE_KEYWORDS,
            (TableKind::Returns, Role::Quantity) => RETURNS_QTY,
            (TableKind::Returns, Role::Type) => RETURNS_TYPE,
            (TableKind::Returns, Role::Reason) => RETURNS_REASON,
            (TableKind::Catalog, Role::Style) => STYLE_KEYWORDS,
            (TableKind::Catalog, Role::Brand) => BRAND_KEYWORDS,
            (TableKind::Catalog, Role::Date) => CATALOG_DATE,
            _ => &[],
        }
    }
}

/// Role → header binding for one table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ColumnMapping {
    bindings: BTreeMap<Role, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `role` to `column`, replacing any earlier binding for the role.
    pub fn with(mut self, role: Role, column: impl Into<String>) -> Self {
        self.bindings.insert(role, column.into());
        self
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.bindings.get(&role).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.bindings.iter().map(|(r, c)| (*r, c.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Check a caller-supplied mapping against the actual headers.
    pub fn validate(&self, kind: TableKind, headers: &[String]) -> Result<()> {
        for (role, column) in self.iter() {
            if !headers.iter().any(|h| h == column) {
                return Err(ReportError::UnknownColumn {
                    table: kind,
                    role,
                    column: column.to_string(),
                });
            }
        }
        require(kind, self)
    }
}

/// Suggest a mapping for `headers` without failing on missing roles.
pub fn suggest_columns(kind: TableKind, headers: &[String]) -> ColumnMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut taken = vec![false; headers.len()];
    let mut mapping = ColumnMapping::new();

    for &role in kind.roles() {
        let hit = kind.keywords(role).iter().find_map(|kw| {
            lowered
                .iter()
                .enumerate()
                .find(|(i, h)| !taken[*i] && h.contains(kw))
                .map(|(i, _)| i)
        });
        if let Some(i) = hit {
            taken[i] = true;
            mapping.bindings.insert(role, headers[i].clone());
        }
    }
    mapping
}

/// Detect the mapping for `headers`, failing when a required role is unbound.
pub fn detect_columns(kind: TableKind, headers: &[String]) -> Result<ColumnMapping> {
    let mapping = suggest_columns(kind, headers);
    require(kind, &mapping)?;
    Ok(mapping)
}

fn require(kind: TableKind, mapping: &ColumnMapping) -> Result<()> {
    match kind
        .required_roles()
        .iter()
        .find(|r| mapping.get(**r).is_none())
    {
        Some(&role) => Err(ReportError::MissingRequiredColumn { table: kind, role }),
        None => Ok(()),
    }
}
