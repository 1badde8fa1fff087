//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use dropzone_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryHistoryBuffer, InMemoryPresenceTracker},
    },
    usecase::{
        GetHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase, PresenceSweeper,
        RoomSessionManager, RoomStores, SessionSettings,
    },
};

use super::{
    handler::{
        get_history, get_room_detail, get_rooms, health_check, publish_file, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Room messaging server
///
/// Wires the in-memory stores, the WebSocket message pusher and the use cases
/// together, and serves them over axum.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default());
/// server.run("127.0.0.1".to_string(), 8000).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    sweeper: PresenceSweeper,
}

impl Server {
    /// Create a new Server from an already validated configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`Server::new`] with an explicit wall clock
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // Initialize dependencies in order:
        // 1. Stores
        // 2. MessagePusher
        // 3. UseCases
        // 4. AppState
        let stores = RoomStores {
            registry: Arc::new(InMemoryConnectionRegistry::new()),
            presence: Arc::new(InMemoryPresenceTracker::new()),
            history: Arc::new(InMemoryHistoryBuffer::new(config.history_limit)),
        };
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        let session_manager = Arc::new(RoomSessionManager::new(
            stores.clone(),
            message_pusher,
            config.room_directory(),
            clock,
            SessionSettings {
                replay_limit: config.history_limit,
                typing_timeout: config.typing_timeout,
            },
        ));
        let sweeper = PresenceSweeper::new(session_manager.clone(), config.typing_sweep_interval);

        let app_state = Arc::new(AppState {
            session_manager,
            get_history_usecase: Arc::new(GetHistoryUseCase::new(
                stores.history.clone(),
                config.history_limit,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(stores.registry.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(stores)),
            outbound_queue_capacity: config.outbound_queue_capacity,
        });

        Self { app_state, sweeper }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_code}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_code}", get(get_room_detail))
            .route("/api/rooms/{room_code}/history", get(get_history))
            .route("/api/rooms/{room_code}/files", post(publish_file))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{room_code}}?username={{name}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The presence sweeper runs for as long as the server does.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweeper = self.sweeper.spawn();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();
        result
    }
}
