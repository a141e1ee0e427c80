use super::log_failure;
use crate::error::Result;
use crate::http_client::Gateway;
use crate::models::Sale;

/// Client for `/sales`
#[derive(Clone)]
pub struct SaleService {
    gateway: Gateway,
}

impl SaleService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    async fn list_at(&self, operation: &str, path: &str) -> Result<Vec<Sale>> {
        log_failure(operation, self.gateway.get_json(path).await)
    }

    pub async fn list(&self) -> Result<Vec<Sale>> {
        self.list_at("list sales", "/sales").await
    }

    /// Sales, newest first
    pub async fn order_by_desc(&self) -> Result<Vec<Sale>> {
        self.list_at("list sales by date", "/sales/orderByDesc").await
    }

    /// Most recent sales
    pub async fn latest(&self) -> Result<Vec<Sale>> {
        self.list_at("list latest sales", "/sales/latest").await
    }

    pub async fn today(&self) -> Result<Vec<Sale>> {
        self.list_at("list today's sales", "/sales/today").await
    }

    pub async fn current_month(&self) -> Result<Vec<Sale>> {
        self.list_at("list this month's sales", "/sales/current-month")
            .await
    }

    pub async fn by_id(&self, id: i64) -> Result<Sale> {
        let path = format!("/sales/{}", id);
        log_failure("get sale", self.gateway.get_json(&path).await)
    }

    pub async fn create(&self, sale: &Sale) -> Result<Sale> {
        log_failure("create sale", self.gateway.post_json("/sales", sale).await)
    }

    pub async fn update(&self, id: i64, sale: &Sale) -> Result<Sale> {
        let path = format!("/sales/{}", id);
        log_failure("update sale", self.gateway.put_json(&path, sale).await)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let path = format!("/sales/{}", id);
        log_failure("delete sale", self.gateway.delete(&path).await)
    }
}
