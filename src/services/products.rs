use super::log_failure;
use crate::error::Result;
use crate::http_client::Gateway;
use crate::models::Product;

#[derive(Clone)]
pub struct ProductService {
    gateway: Gateway,
}

impl ProductService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        log_failure("list products", self.gateway.get_json("/products").await)
    }

    pub async fn by_barcode(&self, barcode: i64) -> Result<Product> {
        let path = format!("/products/barcode/{}", barcode);
        log_failure("get product by barcode", self.gateway.get_json(&path).await)
    }

    pub async fn by_id(&self, id: i64) -> Result<Product> {
        let path = format!("/products/{}", id);
        log_failure("get product", self.gateway.get_json(&path).await)
    }

    pub async fn create(&self, product: &Product) -> Result<Product> {
        log_failure(
            "create product",
            self.gateway.post_json("/products", product).await,
        )
    }

    pub async fn update(&self, id: i64, product: &Product) -> Result<Product> {
        let path = format!("/products/{}", id);
        log_failure("update product", self.gateway.put_json(&path, product).await)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let path = format!("/products/{}", id);
        log_failure("delete product", self.gateway.delete(&path).await)
    }
}
