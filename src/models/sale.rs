use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::Product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub product: Product,
    pub quantity_sold: i32,
    #[serde(default)]
    pub selling_price: f64,
    #[serde(default)]
    pub purchase_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub sale_items: Vec<SaleItem>,
    /// Set by the server when the sale is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<DateTime<FixedOffset>>,
    pub total_price: f64,
    #[serde(default)]
    pub net_profit: f64,
    #[serde(default)]
    pub discount: f64,
    pub payment_methods: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_products: Option<i64>,
}
