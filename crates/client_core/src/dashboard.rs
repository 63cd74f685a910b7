use std::{future::Future, sync::Arc};

use chrono::NaiveDateTime;
use listing::{
    compute_derived_metrics, consolidate_by_product, low_stock_items, movement_summary,
    newest_first, role_counts, sort, InventoryMetrics, MovementSummary, ProductTotal, RoleCounts,
    SortSpec, StockThresholds, TimeRange,
};
use shared::{
    domain::{ProductId, Role, StockDirection, SupplierId, UserId, WarehouseId},
    error::ApiError,
    protocol::{
        InventoryRecord, LowStockAlert, NewUser, Product, ProductInput, ProductOption,
        StockHistoryEntry, Supplier, SupplierInput, User, Warehouse, WarehouseInput,
        WarehouseOption,
    },
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    alerts::SharedAlerts,
    backend::InventoryBackend,
    columns,
    guard::{guard, GuardDecision},
    reports::{inventory_levels_report, warehouse_inventory_report, Report},
    session::SessionManager,
    stock::{submit_adjustment, StockError, StockForm},
    view::{ApplyOutcome, ListView},
};

/// The admin overview flags stock below 20 rather than 10.
pub const ADMIN_LOW_STOCK_THRESHOLD: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{required} dashboard unavailable: {decision:?}")]
pub struct AccessDenied {
    pub required: Role,
    pub decision: GuardDecision,
}

/// Waits for session resolution, then admits the user only if the guard does.
pub async fn admit(session: &SessionManager, required: &Role) -> Result<User, AccessDenied> {
    let resolved = session.wait_until_resolved().await;
    let denied = |decision| AccessDenied {
        required: required.clone(),
        decision,
    };
    match guard(required, &resolved) {
        GuardDecision::Allow => resolved
            .user()
            .cloned()
            .ok_or_else(|| denied(GuardDecision::RedirectToLogin)),
        decision => {
            warn!(%required, ?decision, "dashboard access denied");
            Err(denied(decision))
        }
    }
}

async fn refresh<T, F>(view: &mut ListView<T>, fetch: F) -> ApplyOutcome
where
    F: Future<Output = Result<Vec<T>, ApiError>>,
{
    let ticket = view.begin_fetch();
    let result = fetch.await;
    view.apply(ticket, result)
}

pub struct AdminDashboard {
    backend: Arc<dyn InventoryBackend>,
    user: Option<User>,
    pub users: ListView<User>,
    pub warehouses: ListView<Warehouse>,
    pub products: ListView<Product>,
    pub history: ListView<StockHistoryEntry>,
    pub inventory: ListView<InventoryRecord>,
    pub alerts: SharedAlerts,
    pub thresholds: StockThresholds,
}

impl AdminDashboard {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self {
            backend,
            user: None,
            users: ListView::new(columns::users()),
            warehouses: ListView::new(columns::warehouses()),
            products: ListView::new(columns::products()),
            history: ListView::new(columns::history()),
            inventory: ListView::new(columns::inventory()),
            alerts: Arc::new(Mutex::new(ListView::new(columns::alerts()))),
            thresholds: StockThresholds {
                low: ADMIN_LOW_STOCK_THRESHOLD,
                ..StockThresholds::default()
            },
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Fetches every collection at once; each view is updated only after all
    /// requests have finished.
    pub async fn load(&mut self, session: &SessionManager) -> Result<(), AccessDenied> {
        let user = admit(session, &Role::Admin).await?;

        let backend = Arc::clone(&self.backend);
        let tickets = (
            self.users.begin_fetch(),
            self.warehouses.begin_fetch(),
            self.products.begin_fetch(),
            self.history.begin_fetch(),
            self.inventory.begin_fetch(),
        );
        let alerts_ticket = self.alerts.lock().await.begin_fetch();

        let (users, warehouses, products, history, inventory, alerts) = futures::join!(
            backend.list_users(),
            backend.list_warehouses(),
            backend.list_products(),
            backend.stock_history(),
            backend.list_inventory(),
            backend.active_alerts(),
        );

        self.users.apply(tickets.0, users);
        self.warehouses.apply(tickets.1, warehouses);
        self.products.apply(tickets.2, products);
        self.history.apply(tickets.3, history);
        self.inventory.apply(tickets.4, inventory);
        self.alerts.lock().await.apply(alerts_ticket, alerts);

        info!(
            user_id = %user.id,
            users = self.users.items().len(),
            products = self.products.items().len(),
            inventory = self.inventory.items().len(),
            "admin dashboard loaded"
        );
        self.user = Some(user);
        Ok(())
    }

    pub fn metrics(&self) -> InventoryMetrics {
        compute_derived_metrics(self.inventory.items(), self.thresholds)
    }

    pub fn role_counts(&self) -> RoleCounts {
        role_counts(self.users.items())
    }

    pub fn export_inventory(&self) -> Report {
        inventory_levels_report(self.inventory.items())
    }

    pub fn low_stock(&self) -> Vec<&InventoryRecord> {
        low_stock_items(self.inventory.items(), self.thresholds.low)
    }

    pub async fn active_alerts(&self) -> Vec<LowStockAlert> {
        self.alerts.lock().await.items().to_vec()
    }

    /// Creates an account from the admin panel, then reloads the user list.
    pub async fn add_user(&mut self, new_user: &NewUser) -> Result<User, ApiError> {
        let created = self.backend.signup(new_user).await?;
        refresh(&mut self.users, self.backend.list_users()).await;
        Ok(created)
    }

    pub async fn delete_user(&mut self, id: UserId) -> Result<(), ApiError> {
        self.backend.delete_user(id).await?;
        refresh(&mut self.users, self.backend.list_users()).await;
        Ok(())
    }

    pub async fn save_warehouse(
        &mut self,
        id: Option<WarehouseId>,
        input: &WarehouseInput,
    ) -> Result<Warehouse, ApiError> {
        let saved = match id {
            Some(id) => self.backend.update_warehouse(id, input).await?,
            None => self.backend.create_warehouse(input).await?,
        };
        refresh(&mut self.warehouses, self.backend.list_warehouses()).await;
        Ok(saved)
    }

    pub async fn delete_warehouse(&mut self, id: WarehouseId) -> Result<(), ApiError> {
        self.backend.delete_warehouse(id).await?;
        refresh(&mut self.warehouses, self.backend.list_warehouses()).await;
        Ok(())
    }

    pub async fn save_product(
        &mut self,
        id: Option<ProductId>,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let saved = match id {
            Some(id) => self.backend.update_product(id, input).await?,
            None => self.backend.create_product(input).await?,
        };
        refresh(&mut self.products, self.backend.list_products()).await;
        Ok(saved)
    }

    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), ApiError> {
        self.backend.delete_product(id).await?;
        refresh(&mut self.products, self.backend.list_products()).await;
        Ok(())
    }
}

/// The admin's cross-warehouse view: every catalog product with its stock
/// summed over all warehouses, priced, next to the raw per-warehouse rows.
pub struct WarehouseDetails {
    backend: Arc<dyn InventoryBackend>,
    pub warehouses: ListView<Warehouse>,
    pub products: ListView<Product>,
    pub inventory: ListView<InventoryRecord>,
}

impl WarehouseDetails {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self {
            backend,
            warehouses: ListView::new(columns::warehouses()),
            products: ListView::new(columns::products()),
            inventory: ListView::new(columns::inventory()),
        }
    }

    pub async fn load(&mut self, session: &SessionManager) -> Result<(), AccessDenied> {
        let user = admit(session, &Role::Admin).await?;

        let backend = Arc::clone(&self.backend);
        let tickets = (
            self.warehouses.begin_fetch(),
            self.products.begin_fetch(),
            self.inventory.begin_fetch(),
        );
        let (warehouses, products, inventory) = futures::join!(
            backend.list_warehouses(),
            backend.list_products(),
            backend.list_inventory(),
        );

        let outcomes = [
            self.warehouses.apply(tickets.0, warehouses),
            self.products.apply(tickets.1, products),
            self.inventory.apply(tickets.2, inventory),
        ];
        info!(user_id = %user.id, ?outcomes, "warehouse details loaded");
        Ok(())
    }

    /// Stocked products by descending total, then catalog products with no
    /// inventory rows at zero.
    pub fn consolidated(&self) -> Vec<ProductTotal> {
        let mut totals = consolidate_by_product(self.inventory.items());
        let unstocked: Vec<ProductTotal> = self
            .products
            .items()
            .iter()
            .filter(|product| totals.iter().all(|t| t.product_id() != product.id))
            .map(|product| ProductTotal {
                product: product.clone(),
                total: 0,
                locations: 0,
            })
            .collect();
        totals.extend(unstocked);
        totals
    }

    pub fn consolidated_sorted(&self, spec: &SortSpec) -> Vec<ProductTotal> {
        sort(&self.consolidated(), spec, &columns::product_totals())
    }

    pub fn total_value(&self) -> f64 {
        compute_derived_metrics(self.inventory.items(), StockThresholds::default()).total_value
    }

    pub fn export(&self) -> Report {
        warehouse_inventory_report(self.inventory.items())
    }
}

pub struct ManagerDashboard {
    backend: Arc<dyn InventoryBackend>,
    user: Option<User>,
    pub products: ListView<Product>,
    pub suppliers: ListView<Supplier>,
    pub inventory: ListView<InventoryRecord>,
    pub history: ListView<StockHistoryEntry>,
    pub thresholds: StockThresholds,
    pub time_range: TimeRange,
}

impl ManagerDashboard {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self {
            backend,
            user: None,
            products: ListView::new(columns::products()),
            suppliers: ListView::new(columns::suppliers()),
            inventory: ListView::new(columns::inventory()),
            history: ListView::new(columns::history()),
            thresholds: StockThresholds::default(),
            time_range: TimeRange::default(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub async fn load(&mut self, session: &SessionManager) -> Result<(), AccessDenied> {
        let user = admit(session, &Role::Manager).await?;

        let backend = Arc::clone(&self.backend);
        let tickets = (
            self.products.begin_fetch(),
            self.suppliers.begin_fetch(),
            self.inventory.begin_fetch(),
            self.history.begin_fetch(),
        );
        let (products, suppliers, inventory, history) = futures::join!(
            backend.list_products(),
            backend.list_suppliers(),
            backend.list_inventory(),
            backend.stock_history(),
        );

        let outcomes = [
            self.products.apply(tickets.0, products),
            self.suppliers.apply(tickets.1, suppliers),
            self.inventory.apply(tickets.2, inventory),
            self.history.apply(tickets.3, history),
        ];
        info!(user_id = %user.id, ?outcomes, "manager dashboard loaded");
        self.user = Some(user);
        Ok(())
    }

    pub fn metrics(&self) -> InventoryMetrics {
        compute_derived_metrics(self.inventory.items(), self.thresholds)
    }

    pub fn low_stock(&self) -> Vec<&InventoryRecord> {
        low_stock_items(self.inventory.items(), self.thresholds.low)
    }

    pub fn export_inventory(&self) -> Report {
        inventory_levels_report(self.inventory.items())
    }

    /// Cross-warehouse totals per product, largest first.
    pub fn consolidated(&self) -> Vec<ProductTotal> {
        consolidate_by_product(self.inventory.items())
    }

    pub fn movement(&self, now: NaiveDateTime) -> MovementSummary {
        movement_summary(self.history.items(), Some(self.time_range), now)
    }

    pub fn movement_all_time(&self, now: NaiveDateTime) -> MovementSummary {
        movement_summary(self.history.items(), None, now)
    }

    pub fn recent_history(&self, limit: usize) -> Vec<StockHistoryEntry> {
        let mut entries = newest_first(self.history.items());
        entries.truncate(limit);
        entries
    }

    pub async fn save_product(
        &mut self,
        id: Option<ProductId>,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let saved = match id {
            Some(id) => self.backend.update_product(id, input).await?,
            None => self.backend.create_product(input).await?,
        };
        refresh(&mut self.products, self.backend.list_products()).await;
        Ok(saved)
    }

    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), ApiError> {
        self.backend.delete_product(id).await?;
        refresh(&mut self.products, self.backend.list_products()).await;
        Ok(())
    }

    pub async fn save_supplier(
        &mut self,
        id: Option<SupplierId>,
        input: &SupplierInput,
    ) -> Result<Supplier, ApiError> {
        let saved = match id {
            Some(id) => self.backend.update_supplier(id, input).await?,
            None => self.backend.create_supplier(input).await?,
        };
        refresh(&mut self.suppliers, self.backend.list_suppliers()).await;
        Ok(saved)
    }

    pub async fn delete_supplier(&mut self, id: SupplierId) -> Result<(), ApiError> {
        self.backend.delete_supplier(id).await?;
        refresh(&mut self.suppliers, self.backend.list_suppliers()).await;
        Ok(())
    }
}

pub struct EmployeeDashboard {
    backend: Arc<dyn InventoryBackend>,
    user: Option<User>,
    pub inventory: ListView<InventoryRecord>,
    pub history: ListView<StockHistoryEntry>,
    pub product_options: Vec<ProductOption>,
    pub warehouse_options: Vec<WarehouseOption>,
    pub thresholds: StockThresholds,
}

impl EmployeeDashboard {
    pub fn new(backend: Arc<dyn InventoryBackend>) -> Self {
        Self {
            backend,
            user: None,
            inventory: ListView::new(columns::inventory()),
            history: ListView::new(columns::history()),
            product_options: Vec::new(),
            warehouse_options: Vec::new(),
            thresholds: StockThresholds::default(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub async fn load(&mut self, session: &SessionManager) -> Result<(), AccessDenied> {
        let user = admit(session, &Role::Employee).await?;

        let backend = Arc::clone(&self.backend);
        let tickets = (self.inventory.begin_fetch(), self.history.begin_fetch());
        let (inventory, product_options, warehouse_options, history) = futures::join!(
            backend.list_inventory(),
            backend.product_options(),
            backend.warehouse_options(),
            backend.stock_history(),
        );

        let outcomes = [
            self.inventory.apply(tickets.0, inventory),
            self.history.apply(tickets.1, history),
        ];
        match product_options {
            Ok(options) => self.product_options = options,
            Err(err) => warn!(code = ?err.code, "product options unavailable"),
        }
        match warehouse_options {
            Ok(options) => self.warehouse_options = options,
            Err(err) => warn!(code = ?err.code, "warehouse options unavailable"),
        }
        info!(user_id = %user.id, ?outcomes, "employee dashboard loaded");
        self.user = Some(user);
        Ok(())
    }

    pub fn metrics(&self) -> InventoryMetrics {
        compute_derived_metrics(self.inventory.items(), self.thresholds)
    }

    pub fn low_stock(&self) -> Vec<&InventoryRecord> {
        low_stock_items(self.inventory.items(), self.thresholds.low)
    }

    /// Records a stock-in or stock-out as the admitted user. On success the
    /// inventory and history are re-fetched together; on failure both are
    /// left exactly as they were.
    pub async fn adjust_stock(
        &mut self,
        direction: StockDirection,
        form: &StockForm,
    ) -> Result<&'static str, StockError> {
        let Some(user) = self.user.clone() else {
            return Err(StockError::Rejected {
                code: shared::error::ErrorCode::Unauthorized,
                status: None,
                message: "Please log in to record stock changes.".into(),
            });
        };

        let message = submit_adjustment(self.backend.as_ref(), &user, direction, form).await?;

        let backend = Arc::clone(&self.backend);
        let tickets = (self.inventory.begin_fetch(), self.history.begin_fetch());
        let (inventory, history) =
            futures::join!(backend.list_inventory(), backend.stock_history());
        self.inventory.apply(tickets.0, inventory);
        self.history.apply(tickets.1, history);
        Ok(message)
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
