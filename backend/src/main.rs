use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_backend::{
    app::build_router,
    config::Config,
    db::{connection::create_pool, seed::seed_catalog},
    repositories::InMemoryStore,
    state::{AppState, Repositories},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_database_url(&config.database_url),
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        app_env = %config.app_env,
        "Loaded configuration from environment/.env"
    );
    if config.is_production() && config.jwt_secret == Config::default().jwt_secret {
        tracing::warn!("JWT_SECRET is still the default value in production");
    }

    let repositories = if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        Repositories::in_memory(InMemoryStore::with_default_catalog())
    } else {
        let pool = create_pool(&config.database_url, config.database_max_connections).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        if config.seed_catalog {
            seed_catalog(&pool).await?;
        }
        Repositories::postgres(pool)
    };

    let port = config.port;
    let app = build_router(AppState::new(config, repositories));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
