//! Derivations over collections already fetched from the backend: sorting,
//! pagination, grouping, inventory metrics, and CSV export.
//!
//! Every function here is pure. Inputs are borrowed and never reordered in
//! place; each call returns a fresh projection.

pub mod aggregate;
pub mod compare;
pub mod csv;
pub mod metrics;
pub mod page;
pub mod sort;

pub use aggregate::{aggregate_by_key, consolidate_by_product, Group, ProductTotal};
pub use compare::{compare_values, SortKey};
pub use csv::{export_file_name, number_cell, to_csv};
pub use metrics::{
    compute_derived_metrics, low_stock_items, movement_summary, newest_first, role_counts,
    InventoryMetrics, MovementSummary, RoleCounts, StockThresholds, TimeRange,
};
pub use page::{paginate, Page, PageSpec};
pub use sort::{sort, sort_refs, Accessors, SortDirection, SortSpec};
