// ERP Client - Library root

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod routes;
pub mod services;

pub use app::App;
