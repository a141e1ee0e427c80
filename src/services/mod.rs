// Typed clients for the backend resources
// Every call goes through the gateway so it carries the session's credential

mod products;
mod sales;
mod suppliers;
mod users;

pub use products::ProductService;
pub use sales::SaleService;
pub use suppliers::SupplierService;
pub use users::UserService;

/// Log a failed call and hand the error back
fn log_failure<T>(operation: &str, result: crate::error::Result<T>) -> crate::error::Result<T> {
    if let Err(ref e) = result {
        tracing::error!(operation = operation, error = %e, "Backend call failed");
    }
    result
}
