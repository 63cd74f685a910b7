//! Sortable column tables for every record type the dashboards list.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use listing::{metrics::stock_value, number_cell, Accessors, ProductTotal};
use shared::protocol::{
    InventoryRecord, LowStockAlert, Product, StockHistoryEntry, Supplier, User, Warehouse,
};

fn text(value: &str) -> Cow<'_, str> {
    Cow::Borrowed(value)
}

fn optional(value: &Option<String>) -> Cow<'_, str> {
    Cow::Borrowed(value.as_deref().unwrap_or(""))
}

fn number<T: ToString>(value: Option<T>) -> Cow<'static, str> {
    value.map_or(Cow::Borrowed(""), |v| Cow::Owned(v.to_string()))
}

/// ISO-8601 without a zone, which orders the same as the instant it names.
pub fn timestamp_cell(value: Option<NaiveDateTime>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn users() -> Accessors<User> {
    Accessors::new("name", |u: &User| text(&u.name))
        .with("email", |u: &User| text(&u.email))
        .with("role", |u: &User| {
            Cow::Borrowed(u.role.as_ref().map_or("", |role| role.as_str()))
        })
        .with("phone", |u: &User| optional(&u.phone_number))
}

pub fn products() -> Accessors<Product> {
    Accessors::new("name", |p: &Product| text(&p.name))
        .with("sku", |p: &Product| text(&p.sku))
        .with("category", |p: &Product| optional(&p.category))
        .with("unit", |p: &Product| optional(&p.unit))
        .with("price", |p: &Product| number(p.price))
        .with("supplier", |p: &Product| {
            Cow::Borrowed(
                p.supplier
                    .as_ref()
                    .and_then(|s| s.name.as_deref())
                    .unwrap_or(""),
            )
        })
        .with("minStockLevel", |p: &Product| number(p.min_stock_level))
}

pub fn warehouses() -> Accessors<Warehouse> {
    Accessors::new("name", |w: &Warehouse| text(&w.name))
        .with("location", |w: &Warehouse| optional(&w.location))
}

pub fn suppliers() -> Accessors<Supplier> {
    Accessors::new("name", |s: &Supplier| text(&s.name))
        .with("contact", |s: &Supplier| optional(&s.contact_person))
        .with("email", |s: &Supplier| optional(&s.email))
        .with("phone", |s: &Supplier| optional(&s.phone))
        .with("paymentTerms", |s: &Supplier| optional(&s.payment_terms))
}

pub fn inventory() -> Accessors<InventoryRecord> {
    Accessors::new("product", |r: &InventoryRecord| text(r.product_name()))
        .with("warehouse", |r: &InventoryRecord| text(r.warehouse_name()))
        .with("stock", |r: &InventoryRecord| number(r.stock_level))
        .with("price", |r: &InventoryRecord| number(r.unit_price()))
        .with("value", |r: &InventoryRecord| {
            Cow::Owned(stock_value(r).to_string())
        })
}

pub fn history() -> Accessors<StockHistoryEntry> {
    Accessors::new("time", |h: &StockHistoryEntry| {
        Cow::Owned(timestamp_cell(h.timestamp))
    })
    .with("type", |h: &StockHistoryEntry| text(h.adjustment_type.as_str()))
    .with("product", |h: &StockHistoryEntry| {
        Cow::Borrowed(h.product.as_ref().map_or("", |p| p.name.as_str()))
    })
    .with("warehouse", |h: &StockHistoryEntry| {
        Cow::Borrowed(h.warehouse.as_ref().map_or("", |w| w.name.as_str()))
    })
    .with("quantity", |h: &StockHistoryEntry| {
        number(h.adjustment_quantity)
    })
    .with("performedBy", |h: &StockHistoryEntry| {
        optional(&h.performed_by_email)
    })
}

pub fn alerts() -> Accessors<LowStockAlert> {
    Accessors::new("product", |a: &LowStockAlert| {
        Cow::Borrowed(a.product.as_ref().map_or("", |p| p.name.as_str()))
    })
    .with("warehouse", |a: &LowStockAlert| {
        Cow::Borrowed(a.warehouse.as_ref().map_or("", |w| w.name.as_str()))
    })
    .with("currentStock", |a: &LowStockAlert| number(a.current_stock))
    .with("createdAt", |a: &LowStockAlert| {
        Cow::Owned(timestamp_cell(a.created_at))
    })
}

pub fn product_totals() -> Accessors<ProductTotal> {
    Accessors::new("total", |t: &ProductTotal| Cow::Owned(t.total.to_string()))
        .with("product", |t: &ProductTotal| text(&t.product.name))
        .with("sku", |t: &ProductTotal| text(&t.product.sku))
        .with("locations", |t: &ProductTotal| {
            Cow::Owned(t.locations.to_string())
        })
        .with("unitPrice", |t: &ProductTotal| Cow::Owned(number_cell(t.unit_price())))
        .with("value", |t: &ProductTotal| Cow::Owned(number_cell(t.value())))
}

#[cfg(test)]
#[path = "tests/columns_tests.rs"]
mod tests;
