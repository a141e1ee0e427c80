// Application wiring
// Builds the session, gateway, guard and services that share one store

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::auth::{AuthApi, SessionManager, SessionStore};
use crate::config::Config;
use crate::http_client::Gateway;
use crate::routes::{Navigation, NavigationGuard, DASHBOARD_ROUTE};
use crate::services::{ProductService, SaleService, SupplierService, UserService};

/// Everything a front end needs, wired to a single session
#[derive(Clone)]
pub struct App {
    pub session: SessionManager,
    pub gateway: Gateway,
    pub guard: NavigationGuard,
    pub products: ProductService,
    pub sales: SaleService,
    pub suppliers: SupplierService,
    pub users: UserService,
}

impl App {
    /// Build the application around a fresh in-memory session
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_store(config, SessionStore::in_memory())
    }

    /// Build the application around an existing session store
    pub fn with_store(config: &Config, store: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.http_connect_timeout))
            .timeout(Duration::from_secs(config.http_request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let session = SessionManager::new(
            store,
            AuthApi::new(client.clone(), config.base_url.clone()),
            Navigation::new(DASHBOARD_ROUTE),
            config.renewal_margin(),
        );
        let gateway = Gateway::with_client(client, config.base_url.clone(), session.clone());

        Ok(Self {
            guard: NavigationGuard::new(session.clone()),
            products: ProductService::new(gateway.clone()),
            sales: SaleService::new(gateway.clone()),
            suppliers: SupplierService::new(gateway.clone()),
            users: UserService::new(gateway.clone()),
            session,
            gateway,
        })
    }
}
