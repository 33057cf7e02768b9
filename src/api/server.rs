use axum::{routing::any, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::api::clock::ClockSetter;
use crate::api::handlers;

/// Default listen address of the time server.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[derive(Clone)]
pub struct AppState {
    pub clock: Arc<dyn ClockSetter>,
}

/// HTTP endpoint letting test harnesses move the host clock.
#[derive(Clone)]
pub struct TimeServer {
    pub listen: String,
    pub clock: Arc<dyn ClockSetter>,
}

impl TimeServer {
    pub fn new(listen: impl Into<String>, clock: Arc<dyn ClockSetter>) -> Self {
        Self { listen: listen.into(), clock }
    }

    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/", any(handlers::change_time_root))
            .route("/*timestamp", any(handlers::change_time))
            .with_state(AppState { clock: Arc::clone(&self.clock) })
            .layer(TraceLayer::new_for_http())
    }

    /// 先关闭 NTP, 再开始监听. Failing to disable NTP aborts startup.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        self.clock
            .disable_ntp()
            .await
            .map_err(|e| anyhow::anyhow!("Refusing to start: could not disable NTP: {}", e))?;

        let app = self.create_router();
        tracing::info!("Time server listening on {}", self.listen);
        let listener = TcpListener::bind(&self.listen).await?;
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
