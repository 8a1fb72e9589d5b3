use std::time::Duration;

use clap::Parser;
use quizzery::{config::Config, db::Db, storage::Storage, AppState};

/// Expired sessions are purged this often.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "quizzery=debug,tower_http=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let config = Config::parse();

    let db = Db::new(&config.database_url).await?;
    if let Some(password) = &config.admin_password {
        db.ensure_admin(password).await?;
    }

    let storage = Storage::from_config(config.cloudinary_url.as_deref(), &config.uploads_dir)?;

    let purge_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_db.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("purged {n} expired sessions"),
                Err(e) => tracing::warn!("could not purge expired sessions: {e}"),
            }
        }
    });

    let address = config.address.parse::<std::net::SocketAddr>()?;
    let routes = quizzery::router(AppState::new(db, storage, config));

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on {address}");
    axum::serve(listener, routes).await?;

    Ok(())
}
