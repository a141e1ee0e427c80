use anyhow::{Context, Result};
use dialoguer::Password;

use erp_client::config::{Command, Config, SalesView};
use erp_client::routes::NavigationOutcome;
use erp_client::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(base_url = %config.base_url, "ERP client starting");

    // Sessions live in memory, so every invocation starts with a login
    let app = App::new(&config)?;
    login(&app, &config).await?;

    run(&app, command).await?;

    app.session.logout();
    Ok(())
}

/// Log in with the configured username, prompting for the password if needed
async fn login(app: &App, config: &Config) -> Result<()> {
    let username = config
        .username
        .clone()
        .context("ERP_USERNAME is required (use -u or set ERP_USERNAME env var)")?;

    let password = match config.password.clone() {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!("Password for {}", username))
            .interact()
            .context("Failed to read password")?,
    };

    app.session
        .login(&username, &password)
        .await
        .context("Login failed")?;
    Ok(())
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login => {
            println!(
                "logged in as {} ({})",
                app.session.username().unwrap_or_default(),
                app.session.role().unwrap_or_default()
            );
            if let Some(expires_at_ms) = app.session.store().expires_at_ms() {
                if let Some(expiry) = chrono::DateTime::from_timestamp_millis(expires_at_ms) {
                    println!("access token expires at {}", expiry.to_rfc3339());
                }
            }
        }

        Command::Navigate { path } => match app.guard.navigate(&path).await {
            NavigationOutcome::Arrived(route) => println!("{}", route),
            NavigationOutcome::Cancelled => {
                println!("navigation cancelled, now at {}", app.session.navigation().current())
            }
        },

        Command::Products { barcode } => {
            let products = match barcode {
                Some(barcode) => vec![app.products.by_barcode(barcode).await?],
                None => app.products.list().await?,
            };
            print_json(&products)?;
        }

        Command::Sales { view } => {
            let sales = match view {
                SalesView::All => app.sales.list().await?,
                SalesView::Desc => app.sales.order_by_desc().await?,
                SalesView::Latest => app.sales.latest().await?,
                SalesView::Today => app.sales.today().await?,
                SalesView::Month => app.sales.current_month().await?,
            };
            print_json(&sales)?;
        }

        Command::Suppliers => print_json(&app.suppliers.list().await?)?,

        Command::Register { username, role } => {
            let password = Password::new()
                .with_prompt(format!("New password for {}", username))
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()
                .context("Failed to read new password")?;
            let message = app.users.register(&username, &password, &role).await?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
