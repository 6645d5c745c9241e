use std::time::Duration;

mod app;
mod auth;
mod config;
mod email;
mod response;
mod state;
mod users;

use crate::auth::otp::OtpCode;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "walletcore=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    // Periodic sweep of expired one-time codes, any purpose, used or not.
    {
        let db = state.db.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(15 * 60));
            loop {
                interval.tick().await;
                match OtpCode::cleanup_expired(&db).await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!(count, "expired otp codes removed"),
                    Err(e) => tracing::warn!(error = %e, "otp cleanup failed"),
                }
            }
        });
    }

    let app = app::build_app(state);
    app::serve(app).await
}
