//! Client side of the inventory system: a typed REST client for the
//! backend, the session that decides who is signed in, role-gated
//! navigation, and the dashboards built on top of them.
//!
//! Every view reads the session through [`session::SessionManager`]; nothing
//! fetches protected data before the session has resolved.

pub mod alerts;
pub mod backend;
pub mod columns;
pub mod credential_store;
pub mod dashboard;
pub mod guard;
pub mod reports;
pub mod session;
pub mod signup;
pub mod stock;
pub mod view;

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
mod mock_backend;

pub use alerts::{AlertEvent, AlertPoller, SharedAlerts, DEFAULT_ALERT_POLL_INTERVAL};
pub use backend::{BackendConfig, HttpBackend, InventoryBackend};
pub use credential_store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredential,
};
pub use dashboard::{
    admit, AccessDenied, AdminDashboard, EmployeeDashboard, ManagerDashboard, WarehouseDetails,
};
pub use guard::{guard, home_route, navigate, GuardDecision, Navigation, Route};
pub use reports::{fetch_report, Report, ReportKind};
pub use session::{Session, SessionManager};
pub use signup::{submit_signup, SignupError, SignupForm};
pub use stock::{submit_adjustment, StockError, StockForm};
pub use view::{ApplyOutcome, ListView, ViewPage};
