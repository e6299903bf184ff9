use bus_reservation_system::app::{self, AppServices};
use bus_reservation_system::clients::email::EmailJsMailer;
use bus_reservation_system::clients::object_storage::HttpObjectStorage;
use bus_reservation_system::config::AppConfig;
use bus_reservation_system::db::Database;
use bus_reservation_system::store::MySqlStore;
use dotenv::dotenv;
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level);

    // Connect to the database
    let database = Database::new(&config).await?;
    info!(max_connections = config.database_max_connections, "Database pool ready");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let storage =
        HttpObjectStorage::new(http.clone(), &config.storage_url, &config.storage_api_key)?;
    let mailer = EmailJsMailer::new(http, config.email.clone());

    let services = AppServices::new(
        Arc::new(MySqlStore::new(database.get_pool().clone())),
        Arc::new(storage),
        Arc::new(mailer),
    );
    services.reservations.invoices().ensure_invoice_bucket().await;

    app::build(services).launch().await?;
    Ok(())
}
