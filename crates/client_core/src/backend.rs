use std::{sync::RwLock, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ProductId, StockDirection, SupplierId, UserId, WarehouseId},
    error::ApiError,
    protocol::{
        InventoryRecord, LoginRequest, LoginResponse, LowStockAlert, NewUser, Product,
        ProductInput, ProductOption, StockAdjustmentRequest, StockHistoryEntry, Supplier,
        SupplierInput, User, UserUpdate, Warehouse, WarehouseInput, WarehouseOption,
    },
};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Every REST operation the client performs against the inventory backend.
///
/// The bearer token is the only mutable state an implementation carries; it
/// is attached to every request while set.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: Option<String>);

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn signup(&self, user: &NewUser) -> Result<User, ApiError>;
    async fn user_by_email(&self, email: &str) -> Result<User, ApiError>;
    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, ApiError>;
    async fn delete_user(&self, id: UserId) -> Result<(), ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;
    async fn product_options(&self) -> Result<Vec<ProductOption>, ApiError>;
    async fn create_product(&self, product: &ProductInput) -> Result<Product, ApiError>;
    async fn update_product(&self, id: ProductId, product: &ProductInput)
        -> Result<Product, ApiError>;
    async fn delete_product(&self, id: ProductId) -> Result<(), ApiError>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, ApiError>;
    async fn warehouse_options(&self) -> Result<Vec<WarehouseOption>, ApiError>;
    async fn create_warehouse(&self, warehouse: &WarehouseInput) -> Result<Warehouse, ApiError>;
    async fn update_warehouse(
        &self,
        id: WarehouseId,
        warehouse: &WarehouseInput,
    ) -> Result<Warehouse, ApiError>;
    async fn delete_warehouse(&self, id: WarehouseId) -> Result<(), ApiError>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, ApiError>;
    async fn create_supplier(&self, supplier: &SupplierInput) -> Result<Supplier, ApiError>;
    async fn update_supplier(
        &self,
        id: SupplierId,
        supplier: &SupplierInput,
    ) -> Result<Supplier, ApiError>;
    async fn delete_supplier(&self, id: SupplierId) -> Result<(), ApiError>;

    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>, ApiError>;
    async fn stock_history(&self) -> Result<Vec<StockHistoryEntry>, ApiError>;
    async fn active_alerts(&self) -> Result<Vec<LowStockAlert>, ApiError>;
    async fn adjust_stock(
        &self,
        direction: StockDirection,
        request: &StockAdjustmentRequest,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct HttpBackend {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("api base url '{base_url}' cannot carry a path"));
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::transport(format!("cannot build a path on '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        let builder = self.http.request(method, url);
        Ok(match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build().map_err(transport_error)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "backend request");

        let response = self.http.execute(request).await.map_err(|err| {
            warn!(%method, %path, error = %err, "backend unreachable");
            transport_error(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), &body);
        warn!(
            %method,
            %path,
            status = status.as_u16(),
            code = ?error.code,
            message = error.message.as_deref().unwrap_or(""),
            "backend request failed"
        );
        Err(error)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, segments)?).await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.request(method, segments)?.json(body))
            .await?;
        decode(response).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, segments)?).await?;
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::transport("request timed out")
    } else {
        ApiError::transport(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::decode(err.to_string()))
}

#[async_trait]
impl InventoryBackend for HttpBackend {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.send_json(Method::POST, &["api", "users", "login"], request)
            .await
    }

    async fn signup(&self, user: &NewUser) -> Result<User, ApiError> {
        self.send_json(Method::POST, &["api", "users"], user).await
    }

    async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        self.get_json(&["api", "users", "email", email]).await
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, ApiError> {
        let id = id.to_string();
        self.send_json(Method::PUT, &["api", "users", &id], update)
            .await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.delete(&["api", "users", &id.to_string()]).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json(&["api", "users"]).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json(&["api", "products"]).await
    }

    async fn product_options(&self) -> Result<Vec<ProductOption>, ApiError> {
        self.get_json(&["api", "products", "dropdown"]).await
    }

    async fn create_product(&self, product: &ProductInput) -> Result<Product, ApiError> {
        self.send_json(Method::POST, &["api", "products"], product)
            .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &ProductInput,
    ) -> Result<Product, ApiError> {
        let id = id.to_string();
        self.send_json(Method::PUT, &["api", "products", &id], product)
            .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&["api", "products", &id.to_string()]).await
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, ApiError> {
        self.get_json(&["api", "warehouses"]).await
    }

    async fn warehouse_options(&self) -> Result<Vec<WarehouseOption>, ApiError> {
        self.get_json(&["api", "warehouses", "dropdown"]).await
    }

    async fn create_warehouse(&self, warehouse: &WarehouseInput) -> Result<Warehouse, ApiError> {
        self.send_json(Method::POST, &["api", "warehouses"], warehouse)
            .await
    }

    async fn update_warehouse(
        &self,
        id: WarehouseId,
        warehouse: &WarehouseInput,
    ) -> Result<Warehouse, ApiError> {
        let id = id.to_string();
        self.send_json(Method::PUT, &["api", "warehouses", &id], warehouse)
            .await
    }

    async fn delete_warehouse(&self, id: WarehouseId) -> Result<(), ApiError> {
        self.delete(&["api", "warehouses", &id.to_string()]).await
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, ApiError> {
        self.get_json(&["api", "suppliers"]).await
    }

    async fn create_supplier(&self, supplier: &SupplierInput) -> Result<Supplier, ApiError> {
        self.send_json(Method::POST, &["api", "suppliers"], supplier)
            .await
    }

    async fn update_supplier(
        &self,
        id: SupplierId,
        supplier: &SupplierInput,
    ) -> Result<Supplier, ApiError> {
        let id = id.to_string();
        self.send_json(Method::PUT, &["api", "suppliers", &id], supplier)
            .await
    }

    async fn delete_supplier(&self, id: SupplierId) -> Result<(), ApiError> {
        self.delete(&["api", "suppliers", &id.to_string()]).await
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>, ApiError> {
        self.get_json(&["api", "inventory"]).await
    }

    async fn stock_history(&self) -> Result<Vec<StockHistoryEntry>, ApiError> {
        self.get_json(&["api", "inventory", "history"]).await
    }

    async fn active_alerts(&self) -> Result<Vec<LowStockAlert>, ApiError> {
        self.get_json(&["api", "alerts", "active"]).await
    }

    async fn adjust_stock(
        &self,
        direction: StockDirection,
        request: &StockAdjustmentRequest,
    ) -> Result<(), ApiError> {
        // The body is either the updated record or a plain confirmation; neither is used.
        self.send(
            self.request(Method::POST, &["api", "inventory", direction.endpoint()])?
                .json(request),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
