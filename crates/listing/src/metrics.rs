use std::{collections::HashSet, str::FromStr};

use chrono::{Duration, NaiveDateTime};
use shared::{
    domain::{Role, StockAdjustmentType},
    protocol::{InventoryRecord, StockHistoryEntry, User},
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
pub const DEFAULT_CRITICAL_STOCK_THRESHOLD: i64 = 5;

/// Stock levels strictly below `low` count as low stock, strictly below
/// `critical` as critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockThresholds {
    pub low: i64,
    pub critical: i64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_STOCK_THRESHOLD,
            critical: DEFAULT_CRITICAL_STOCK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InventoryMetrics {
    pub total_units: i64,
    pub total_value: f64,
    pub low_stock: usize,
    pub critical: usize,
    pub warehouses: usize,
}

fn stock_of(record: &InventoryRecord) -> i64 {
    record.stock_level.unwrap_or(0)
}

/// Stock level times unit price, zero when either is missing or the product
/// is not finite.
pub fn stock_value(record: &InventoryRecord) -> f64 {
    let value = stock_of(record) as f64 * record.unit_price().unwrap_or(0.0);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn compute_derived_metrics(
    inventory: &[InventoryRecord],
    thresholds: StockThresholds,
) -> InventoryMetrics {
    let mut metrics = InventoryMetrics::default();
    let mut warehouses = HashSet::new();

    for record in inventory {
        let stock = stock_of(record);
        metrics.total_units = metrics.total_units.saturating_add(stock);
        metrics.total_value += stock_value(record);
        if stock < thresholds.low {
            metrics.low_stock += 1;
        }
        if stock < thresholds.critical {
            metrics.critical += 1;
        }
        if let Some(warehouse) = &record.warehouse {
            warehouses.insert(warehouse.id);
        }
    }

    if !metrics.total_value.is_finite() {
        metrics.total_value = 0.0;
    }
    metrics.warehouses = warehouses.len();
    metrics
}

/// Records below `threshold`, lowest stock first.
pub fn low_stock_items(inventory: &[InventoryRecord], threshold: i64) -> Vec<&InventoryRecord> {
    let mut items: Vec<&InventoryRecord> = inventory
        .iter()
        .filter(|record| stock_of(record) < threshold)
        .collect();
    items.sort_by_key(|record| stock_of(record));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleCounts {
    pub total: usize,
    pub admins: usize,
    pub managers: usize,
    pub employees: usize,
}

pub fn role_counts(users: &[User]) -> RoleCounts {
    users.iter().fold(
        RoleCounts {
            total: users.len(),
            ..RoleCounts::default()
        },
        |mut counts, user| {
            match user.role {
                Some(Role::Admin) => counts.admins += 1,
                Some(Role::Manager) => counts.managers += 1,
                Some(Role::Employee) => counts.employees += 1,
                _ => {}
            }
            counts
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl TimeRange {
    pub fn window(&self) -> Duration {
        match self {
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Quarter => Duration::days(90),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            other => Err(format!("unknown time range '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementSummary {
    pub stock_in: usize,
    pub stock_out: usize,
    pub total: usize,
}

/// Counts stock movements, optionally only those inside `range` before
/// `now`. Entries without a timestamp only count toward the unbounded
/// summary.
pub fn movement_summary(
    history: &[StockHistoryEntry],
    range: Option<TimeRange>,
    now: NaiveDateTime,
) -> MovementSummary {
    let since = range.map(|r| now - r.window());
    history
        .iter()
        .filter(|entry| match since {
            None => true,
            Some(since) => entry.timestamp.is_some_and(|ts| ts >= since),
        })
        .fold(MovementSummary::default(), |mut summary, entry| {
            summary.total += 1;
            match entry.adjustment_type {
                StockAdjustmentType::Add => summary.stock_in += 1,
                StockAdjustmentType::Remove => summary.stock_out += 1,
                StockAdjustmentType::Unknown => {}
            }
            summary
        })
}

/// History ordered newest first; entries without a timestamp go last.
pub fn newest_first(history: &[StockHistoryEntry]) -> Vec<StockHistoryEntry> {
    let mut entries = history.to_vec();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

#[cfg(test)]
#[path = "tests/metrics_tests.rs"]
mod tests;
