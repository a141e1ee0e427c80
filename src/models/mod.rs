// Data models for the backend API

pub mod product;
pub mod sale;
pub mod supplier;
pub mod user;

pub use product::Product;
pub use sale::{Sale, SaleItem};
pub use supplier::Supplier;
pub use user::NewUser;
