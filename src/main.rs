use mun_badge::{ Config, Result };
use std::sync::Arc;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "mun_badge=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| mun_badge::AppError::Config(e.to_string()))?;

    tracing::info!(
        "Starting mun-badge for {} ({}x{} badges, error correction {})",
        config.base_url,
        config.badge.canvas_width,
        config.badge.canvas_height,
        config.badge.error_correction
    );

    // Resolve the label font once for the whole process
    let font = mun_badge::badge::shared_label_font(&config.badge)?;

    let store = Arc::new(
        mun_badge::storage::LocalDirStore::new(config.storage_dir.clone(), config.public_url.clone())
    );
    tracing::info!("Storing badges in {}", config.storage_dir.display());

    let badge_service = Arc::new(
        mun_badge::services::BadgeService::new(
            config.badge.clone(),
            config.base_url.clone(),
            font,
            store
        )?
    );

    let app = mun_badge::api::router(mun_badge::api::AppState::new(badge_service));

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| mun_badge::AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| mun_badge::AppError::Internal(e.to_string()))?;

    Ok(())
}
