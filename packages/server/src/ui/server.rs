//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::usecase::{
    AuthenticateSessionUseCase, CallSignalingUseCase, ConnectUserUseCase, DisconnectUserUseCase,
    GetPresenceUseCase, RelayMessageUseCase,
};

use super::{
    handler::{get_online_users, get_user_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Real-time relay server (presence, call signaling, chat relay)
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     authenticate_session_usecase,
///     connect_user_usecase,
///     disconnect_user_usecase,
///     call_signaling_usecase,
///     relay_message_usecase,
///     get_presence_usecase,
/// )
/// .with_cors_origin(config.client_origin.clone());
/// server.run(config.host, config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Browser origin allowed to call the HTTP API with credentials
    cors_origin: Option<HeaderValue>,
}

impl Server {
    pub fn new(
        authenticate_session_usecase: Arc<AuthenticateSessionUseCase>,
        connect_user_usecase: Arc<ConnectUserUseCase>,
        disconnect_user_usecase: Arc<DisconnectUserUseCase>,
        call_signaling_usecase: Arc<CallSignalingUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        get_presence_usecase: Arc<GetPresenceUseCase>,
    ) -> Self {
        let state = Arc::new(AppState {
            authenticate_session_usecase,
            connect_user_usecase,
            disconnect_user_usecase,
            call_signaling_usecase,
            relay_message_usecase,
            get_presence_usecase,
        });
        Self {
            state,
            cors_origin: None,
        }
    }

    pub fn with_cors_origin(mut self, origin: HeaderValue) -> Self {
        self.cors_origin = Some(origin);
        self
    }

    /// Builds the router with all endpoints and layers.
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/presence", get(get_online_users))
            .route("/api/presence/{user_id}", get(get_user_presence))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if let Some(origin) = &self.cors_origin {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(origin.clone())
                    .allow_methods([Method::GET])
                    .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                    .allow_credentials(true),
            );
        }

        app
    }

    /// Run the relay server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws?userId=<id>&token=<jwt>", bind_addr);
        self.serve(listener).await?;
        Ok(())
    }

    /// Serves on an already bound listener until the shutdown signal arrives.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!("Relay server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
