use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stockroom::config::Config;
use stockroom::services::AuthService;
use stockroom::{create_app, store, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!("Starting Stockroom in {} mode", config.environment);

    let db = store::connect(&config.database)
        .await
        .context("Failed to open database")?;
    store::init(&db).await.context("Failed to initialize schema")?;

    AuthService::new(db.clone(), config.auth.bcrypt_cost)
        .bootstrap_admin(config.auth.bootstrap_password.as_deref())
        .await
        .context("Failed to bootstrap admin account")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db, config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
