use super::log_failure;
use crate::error::Result;
use crate::http_client::Gateway;
use crate::models::Supplier;

#[derive(Clone)]
pub struct SupplierService {
    gateway: Gateway,
}

impl SupplierService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Supplier>> {
        log_failure("list suppliers", self.gateway.get_json("/suppliers").await)
    }

    pub async fn by_id(&self, id: i64) -> Result<Supplier> {
        let path = format!("/suppliers/{}", id);
        log_failure("get supplier", self.gateway.get_json(&path).await)
    }

    pub async fn create(&self, supplier: &Supplier) -> Result<Supplier> {
        log_failure(
            "create supplier",
            self.gateway.post_json("/suppliers", supplier).await,
        )
    }

    pub async fn update(&self, id: i64, supplier: &Supplier) -> Result<Supplier> {
        let path = format!("/suppliers/{}", id);
        log_failure("update supplier", self.gateway.put_json(&path, supplier).await)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let path = format!("/suppliers/{}", id);
        log_failure("delete supplier", self.gateway.delete(&path).await)
    }
}
