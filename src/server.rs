//! # Push Server
//!
//! An `axum` server receiving Pub/Sub push deliveries of Cloud Deploy
//! operation messages. Each delivery is relayed to the chat backend and
//! then acknowledged, whether or not the notification went through.

use crate::core::ChatAdapter;
use crate::event::PushRequest;
use crate::notification::dispatch::{relay_event, Outcome};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[derive(Clone)]
struct AppState {
    adapter: Arc<dyn ChatAdapter>,
    channel: Arc<str>,
}

/// Serves push deliveries until the shutdown future resolves.
pub struct PushServer {
    listener: TcpListener,
    state: AppState,
}

impl PushServer {
    /// Creates a new `PushServer` on an already bound listener.
    pub fn new(listener: TcpListener, adapter: Arc<dyn ChatAdapter>, channel: &str) -> Self {
        Self {
            listener,
            state: AppState {
                adapter,
                channel: Arc::from(channel),
            },
        }
    }

    fn routes(state: AppState) -> Router {
        Router::new()
            .route("/", post(handle_push))
            .route("/healthz", get(|| async { "ok" }))
            .with_state(state)
    }

    /// Runs the server until `shutdown` completes.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
        let addr = self.listener.local_addr()?;
        info!(%addr, "Push server listening");
        axum::serve(self.listener, Self::routes(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;
        debug!("Push server finished");
        Ok(())
    }
}

async fn handle_push(State(state): State<AppState>, Json(push): Json<PushRequest>) -> StatusCode {
    debug!(
        message_id = push.message.message_id.as_deref().unwrap_or_default(),
        subscription = %push.subscription,
        "Push delivery received"
    );
    let outcome = relay_event(state.adapter.as_ref(), &state.channel, &push.message.attributes).await;
    if let Outcome::Failed(reason) = outcome {
        debug!(%reason, "Acknowledging push despite delivery failure");
    }
    StatusCode::NO_CONTENT
}
