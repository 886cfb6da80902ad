use library_lending::{
    adapters::{
        mock::NotificationService as MockNotificationService,
        postgres::{PostgresBookStore, PostgresLoanStore},
        smtp::SmtpNotificationService,
    },
    api::{handlers::AppState, router::create_router},
    application::{catalog::CatalogDependencies, loan::LendingDependencies},
    config::Config,
    ports::NotificationService,
    scheduler::run_overdue_notifications,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().inspect_err(|err| {
        tracing::error!(error = %err, "invalid configuration");
    })?;

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    // Initialize adapters
    let book_store = Arc::new(PostgresBookStore::new(pool.clone()));
    let loan_store = Arc::new(PostgresLoanStore::new(pool));

    let notifier: Arc<dyn NotificationService> = if config.mail_enabled {
        Arc::new(SmtpNotificationService::new(config.smtp.clone()))
    } else {
        tracing::warn!("mail disabled, overdue notices will only be logged");
        Arc::new(MockNotificationService::log_only())
    };

    // Create service dependencies
    let catalog = CatalogDependencies {
        book_store: book_store.clone(),
    };
    let lending = LendingDependencies {
        book_store,
        loan_store,
    };

    // Overdue notification batch
    tokio::spawn(run_overdue_notifications(
        lending.clone(),
        notifier,
        config.overdue_notice(),
        config.overdue.check_interval_secs,
    ));

    // Create application state
    let app_state = Arc::new(AppState { catalog, lending });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
