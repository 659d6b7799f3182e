//! swapHere call client.
//!
//! Connects to the relay with a session token, then calls, answers and chats
//! from the terminal. The video conference link is printed when a call starts.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//! An expired or rejected token ends the client instead.
//!
//! Run with:
//! ```not_rust
//! export JWT_SECRET=dev
//! TOKEN=$(cargo run --bin swaphere-server -- issue-token -u u1)
//! cargo run --bin swaphere-client -- --user-id u1 --name Ada --token "$TOKEN"
//! ```

use clap::Parser;

use swaphere_client::{call::HeadlessWidget, config::ClientConfig};
use swaphere_server::domain::UserId;
use swaphere_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "swaphere-client")]
#[command(about = "Terminal client for swapHere calls and chat", long_about = None)]
struct Args {
    /// Platform user ID to connect as
    #[arg(short = 'u', long)]
    user_id: String,

    /// Display name shown to the people you call (defaults to the user ID)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Email passed to the video widget
    #[arg(long)]
    email: Option<String>,

    /// Session token issued for this user
    #[arg(short = 't', long, env = "SWAPHERE_TOKEN")]
    token: String,

    /// Relay WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:5000/ws")]
    url: String,

    /// Video conference host
    #[arg(long, default_value = HeadlessWidget::DEFAULT_BASE_URL)]
    widget_url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let user_id = match UserId::new(args.user_id) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::error!("Invalid user ID: {}", e);
            std::process::exit(1);
        }
    };
    let config = ClientConfig {
        url: args.url,
        display_name: args.name.unwrap_or_else(|| user_id.to_string()),
        user_id,
        email: args.email,
        token: args.token,
        widget_base_url: args.widget_url,
    };

    if let Err(e) = swaphere_client::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
