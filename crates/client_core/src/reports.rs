//! CSV exports of the backend collections.
//!
//! Absent optional fields render as empty cells, except where a dash is the
//! conventional placeholder (missing phone numbers, anonymous adjustments).

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use listing::{export_file_name, metrics::stock_value, number_cell, to_csv};
use shared::{
    error::ApiError,
    protocol::{InventoryRecord, Product, StockHistoryEntry, Supplier, User, Warehouse},
};
use tracing::info;

use crate::{backend::InventoryBackend, columns::timestamp_cell};

/// File stem used by the dashboards' own inventory export button.
pub const INVENTORY_LEVELS_STEM: &str = "inventory_levels";
pub const WAREHOUSE_INVENTORY_STEM: &str = "warehouse_inventory";

const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Products,
    Warehouses,
    Suppliers,
    Users,
    Inventory,
    StockHistory,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Products,
        ReportKind::Warehouses,
        ReportKind::Suppliers,
        ReportKind::Users,
        ReportKind::Inventory,
        ReportKind::StockHistory,
    ];

    pub fn stem(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Warehouses => "warehouses",
            Self::Suppliers => "suppliers",
            Self::Users => "users",
            Self::Inventory => "inventory",
            Self::StockHistory => "stock_history",
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            Self::Products => &["Name", "SKU", "Category", "Unit", "Price"],
            Self::Warehouses => &["Name", "Location"],
            Self::Suppliers => &["Name", "Contact", "Email", "Phone", "Payment Terms"],
            Self::Users => &["Name", "Email", "Role", "Phone"],
            Self::Inventory => &[
                "Product",
                "Warehouse",
                "Stock Level",
                "Unit Price",
                "Total Value",
            ],
            Self::StockHistory => &[
                "Time",
                "Type",
                "Product",
                "Warehouse",
                "Quantity",
                "Performed By",
            ],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.stem() == wanted)
            .ok_or_else(|| format!("unknown report '{}'", s.trim()))
    }
}

/// A rendered table ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub stem: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn to_csv(&self) -> String {
        to_csv(self.headers, &self.rows)
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        export_file_name(self.stem, date)
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn or_placeholder(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

fn report(kind: ReportKind, rows: Vec<Vec<String>>) -> Report {
    Report {
        stem: kind.stem(),
        headers: kind.headers(),
        rows,
    }
}

pub fn products_report(products: &[Product]) -> Report {
    let rows = products
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.sku.clone(),
                cell(&p.category),
                cell(&p.unit),
                p.price.map(number_cell).unwrap_or_default(),
            ]
        })
        .collect();
    report(ReportKind::Products, rows)
}

pub fn warehouses_report(warehouses: &[Warehouse]) -> Report {
    let rows = warehouses
        .iter()
        .map(|w| vec![w.name.clone(), cell(&w.location)])
        .collect();
    report(ReportKind::Warehouses, rows)
}

pub fn suppliers_report(suppliers: &[Supplier]) -> Report {
    let rows = suppliers
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                cell(&s.contact_person),
                cell(&s.email),
                cell(&s.phone),
                cell(&s.payment_terms),
            ]
        })
        .collect();
    report(ReportKind::Suppliers, rows)
}

pub fn users_report(users: &[User]) -> Report {
    let rows = users
        .iter()
        .map(|u| {
            vec![
                u.name.clone(),
                u.email.clone(),
                u.role.as_ref().map(|r| r.to_string()).unwrap_or_default(),
                or_placeholder(&u.phone_number),
            ]
        })
        .collect();
    report(ReportKind::Users, rows)
}

/// Missing stock and price count as zero here, so every row has a value.
pub fn inventory_report(inventory: &[InventoryRecord]) -> Report {
    let rows = inventory
        .iter()
        .map(|r| {
            vec![
                r.product_name().to_string(),
                r.warehouse_name().to_string(),
                r.stock_level.unwrap_or(0).to_string(),
                number_cell(r.unit_price().unwrap_or(0.0)),
                number_cell(stock_value(r)),
            ]
        })
        .collect();
    report(ReportKind::Inventory, rows)
}

/// Same table as [`inventory_report`] under the dashboards' file stem.
pub fn inventory_levels_report(inventory: &[InventoryRecord]) -> Report {
    Report {
        stem: INVENTORY_LEVELS_STEM,
        ..inventory_report(inventory)
    }
}

/// The warehouse details export: the inventory table again, under its own stem.
pub fn warehouse_inventory_report(inventory: &[InventoryRecord]) -> Report {
    Report {
        stem: WAREHOUSE_INVENTORY_STEM,
        ..inventory_report(inventory)
    }
}

pub fn history_report(history: &[StockHistoryEntry]) -> Report {
    let rows = history
        .iter()
        .map(|h| {
            vec![
                timestamp_cell(h.timestamp),
                h.adjustment_type.as_str().to_string(),
                h.product.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
                h.warehouse
                    .as_ref()
                    .map(|w| w.name.clone())
                    .unwrap_or_default(),
                h.adjustment_quantity
                    .map(|q| q.to_string())
                    .unwrap_or_default(),
                or_placeholder(&h.performed_by_email),
            ]
        })
        .collect();
    report(ReportKind::StockHistory, rows)
}

/// Fetches the collection behind `kind` and renders it.
pub async fn fetch_report(
    backend: &dyn InventoryBackend,
    kind: ReportKind,
) -> Result<Report, ApiError> {
    let report = match kind {
        ReportKind::Products => products_report(&backend.list_products().await?),
        ReportKind::Warehouses => warehouses_report(&backend.list_warehouses().await?),
        ReportKind::Suppliers => suppliers_report(&backend.list_suppliers().await?),
        ReportKind::Users => users_report(&backend.list_users().await?),
        ReportKind::Inventory => inventory_report(&backend.list_inventory().await?),
        ReportKind::StockHistory => history_report(&backend.stock_history().await?),
    };
    info!(report = %kind, rows = report.rows.len(), "report built");
    Ok(report)
}

#[cfg(test)]
#[path = "tests/reports_tests.rs"]
mod tests;
