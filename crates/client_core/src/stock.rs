use shared::{
    domain::{ProductId, StockDirection, WarehouseId},
    error::{ApiError, ErrorCode},
    protocol::{StockAdjustmentRequest, User},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::InventoryBackend;

pub const INSUFFICIENT_STOCK_FALLBACK: &str = "Insufficient stock available.";
pub const INVALID_REQUEST_FALLBACK: &str = "Invalid request data.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Action failed. Please try again.";

/// Raw form input for a stock-in or stock-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockForm {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub quantity: String,
}

impl StockForm {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId, quantity: impl ToString) -> Self {
        Self {
            product_id: Some(product_id),
            warehouse_id: Some(warehouse_id),
            quantity: quantity.to_string(),
        }
    }

    /// Checks run before any request is sent, in this order.
    pub fn validate(&self) -> Result<(ProductId, WarehouseId, i64), StockError> {
        let (Some(product_id), Some(warehouse_id)) = (self.product_id, self.warehouse_id) else {
            return Err(StockError::MissingSelection);
        };
        let quantity = self
            .quantity
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or(StockError::InvalidQuantity)?;
        Ok((product_id, warehouse_id, quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("Please select product and warehouse.")]
    MissingSelection,
    #[error("Quantity must be a positive number.")]
    InvalidQuantity,
    #[error("{message}")]
    Rejected {
        code: ErrorCode,
        status: Option<u16>,
        message: String,
    },
}

impl StockError {
    fn rejected(err: &ApiError) -> Self {
        Self::Rejected {
            code: err.code,
            status: err.status,
            message: rejection_message(err),
        }
    }
}

/// Message shown when the backend refuses an adjustment. A 409 on stock-out
/// carries the backend's own explanation, which is shown verbatim.
pub fn rejection_message(err: &ApiError) -> String {
    match err.status {
        Some(409) => err.user_message_or(INSUFFICIENT_STOCK_FALLBACK),
        Some(400) => err.user_message_or(INVALID_REQUEST_FALLBACK),
        Some(status) if status >= 500 => SERVER_ERROR_MESSAGE.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

/// Validates and posts one adjustment on behalf of `performer`. Returns the
/// success message; the caller refreshes whatever it displays.
pub async fn submit_adjustment(
    backend: &dyn InventoryBackend,
    performer: &User,
    direction: StockDirection,
    form: &StockForm,
) -> Result<&'static str, StockError> {
    let (product_id, warehouse_id, quantity) = form.validate()?;
    let request = StockAdjustmentRequest {
        product_id,
        warehouse_id,
        quantity,
        performed_by_email: performer.email.clone(),
    };

    match backend.adjust_stock(direction, &request).await {
        Ok(()) => {
            info!(
                direction = direction.endpoint(),
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                quantity,
                "stock adjustment recorded"
            );
            Ok(direction.success_message())
        }
        Err(err) => {
            warn!(
                direction = direction.endpoint(),
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                code = ?err.code,
                "stock adjustment rejected"
            );
            Err(StockError::rejected(&err))
        }
    }
}

#[cfg(test)]
#[path = "tests/stock_tests.rs"]
mod tests;
