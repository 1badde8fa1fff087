//! DropZone room messaging server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin dropzone-server
//! cargo run --bin dropzone-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin dropzone-server -- --room-policy registered --room MATH-101 --room CS-50
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use dropzone_server::{
    config::{
        DEFAULT_HISTORY_LIMIT, DEFAULT_OUTBOUND_QUEUE_CAPACITY, RoomPolicy, ServerConfig,
    },
    domain::RoomCode,
    ui::Server,
};
use dropzone_shared::logger::setup_logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Any room code is accepted; rooms are created on first join
    Open,
    /// Only the rooms given with `--room` may be joined
    Registered,
}

#[derive(Parser, Debug)]
#[command(name = "dropzone-server")]
#[command(about = "Real-time room messaging and presence server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8000")]
    port: u16,

    /// Max history entries kept and replayed per room
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,

    /// Typing indicator lifetime without a refresh, in milliseconds
    #[arg(long, default_value = "1500")]
    typing_timeout_ms: u64,

    /// Interval between typing expiry sweeps, in milliseconds
    #[arg(long, default_value = "500")]
    typing_sweep_interval_ms: u64,

    /// Bound of each connection's outbound queue
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_QUEUE_CAPACITY)]
    outbound_queue_capacity: usize,

    /// How unknown room codes are treated on join
    #[arg(long, value_enum, default_value = "open")]
    room_policy: PolicyArg,

    /// Room code admitted under the registered policy (repeatable)
    #[arg(long = "room")]
    rooms: Vec<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn to_config(&self) -> Result<ServerConfig, String> {
        let room_policy = match self.room_policy {
            PolicyArg::Open => RoomPolicy::Open,
            PolicyArg::Registered => RoomPolicy::Registered(
                self.rooms
                    .iter()
                    .map(|code| {
                        RoomCode::try_from(code.clone())
                            .map_err(|e| format!("invalid --room '{}': {}", code, e))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        let config = ServerConfig {
            history_limit: self.history_limit,
            typing_timeout: Duration::from_millis(self.typing_timeout_ms),
            typing_sweep_interval: Duration::from_millis(self.typing_sweep_interval_ms),
            outbound_queue_capacity: self.outbound_queue_capacity,
            room_policy,
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Starting with {:?}", config);

    let server = Server::new(config);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
