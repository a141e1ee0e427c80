use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;

/// ERP Client - session-aware command line client for the ERP backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Backend base URL
    #[arg(
        short = 'b',
        long,
        env = "ERP_BASE_URL",
        default_value = "http://localhost:8080/api"
    )]
    pub base_url: String,

    /// Username to log in with
    #[arg(short = 'u', long, env = "ERP_USERNAME")]
    pub username: Option<String>,

    /// Password to log in with (prompted when missing)
    #[arg(short = 'p', long, env = "ERP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seconds before expiry at which the access token is renewed
    #[arg(long, env = "TOKEN_RENEWAL_MARGIN", default_value = "120")]
    pub renewal_margin: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "60")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in and print the user, role and access token expiry
    Login,

    /// Run the navigation guard for a route and print where it lands
    Navigate { path: String },

    /// List products, or look one up by barcode
    Products {
        #[arg(long)]
        barcode: Option<i64>,
    },

    /// List sales
    Sales {
        #[arg(long, value_enum, default_value = "all")]
        view: SalesView,
    },

    /// List suppliers
    Suppliers,

    /// Register a new user (admin only); the new password is prompted
    Register { username: String, role: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum SalesView {
    All,
    Desc,
    Latest,
    Today,
    Month,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Backend
    pub base_url: String,

    // Credentials
    pub username: Option<String>,
    pub password: Option<String>,

    // Session
    pub token_renewal_margin: u64,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args), command))
    }

    /// Build configuration from parsed arguments
    pub fn from_args(args: CliArgs) -> Self {
        Config {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            username: args.username,
            password: args.password,
            token_renewal_margin: args.renewal_margin,
            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            http_request_timeout: args.http_timeout,
            log_level: args.log_level,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("ERP_BASE_URL is not a valid URL: {}", self.base_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("ERP_BASE_URL must use http or https: {}", self.base_url);
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }

    pub fn renewal_margin(&self) -> Duration {
        Duration::from_secs(self.token_renewal_margin)
    }
}
