use filmbase::{
    AppState, bootstrap_admin,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, connects the repository, provisions
/// the optional admin account and serves the API.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("FATAL: invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    // 2. Logging: RUST_LOG wins, otherwise crate-level defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "filmbase=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Repository: Postgres when a database is configured, otherwise in-memory.
    let repo: RepositoryState = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL / DB_HOST.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to apply database migrations.");

            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!("No database configured, using the in-memory repository");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 4. Optional admin account
    if let Some((username, password)) = &config.admin {
        bootstrap_admin(&repo, username, password)
            .await
            .expect("FATAL: Failed to provision the admin account.");
    }

    // 5. Router and Server Startup
    let listen_addr = config.listen_addr.clone();
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(&listen_addr)
        .await
        .expect("FATAL: Failed to bind HTTP listener. Check HTTP_SERVER_ADDRESS.");

    tracing::info!("Listening on {listen_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{listen_addr}/swagger-ui");

    axum::serve(listener, app).await.expect("HTTP server terminated");
}
