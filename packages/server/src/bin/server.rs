//! swapHere relay server.
//!
//! Tracks which users are online, relays call signaling between two users and
//! relays chat messages tagged with their room id.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev cargo run --bin swaphere-server
//! JWT_SECRET=dev cargo run --bin swaphere-server -- --port 5000 --users-file users.json
//! JWT_SECRET=dev cargo run --bin swaphere-server -- issue-token --user-id alice
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Args, Parser, Subcommand};

use swaphere_server::{
    config::ServerConfig,
    domain::{UserDirectory, UserId},
    infrastructure::{
        auth::JwtTokenVerifier,
        directory::{InMemoryUserDirectory, OpenUserDirectory},
        message_pusher::WebSocketMessagePusher,
        registry::InMemoryConnectionRegistry,
    },
    ui::Server,
    usecase::{
        AuthenticateSessionUseCase, CallSignalingUseCase, ConnectUserUseCase,
        DisconnectUserUseCase, GetPresenceUseCase, RelayMessageUseCase,
    },
};
use swaphere_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "swaphere-server")]
#[command(about = "Presence, call signaling and chat relay server", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay server (default)
    Serve(ServeArgs),
    /// Print a session token for local development
    IssueToken(IssueTokenArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "SWAPHERE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "SWAPHERE_PORT", default_value = "5000")]
    port: u16,

    /// Shared HS256 secret used to verify session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Web client origin allowed by CORS
    #[arg(long, env = "CLIENT_URL", default_value = "http://localhost:3000")]
    client_url: String,

    /// JSON array of user profiles; without it any valid user id is admitted
    #[arg(long, env = "SWAPHERE_USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Tell the caller when a signal could not reach the peer
    #[arg(long, env = "SWAPHERE_NOTIFY_UNREACHABLE")]
    notify_unreachable: bool,
}

#[derive(Args, Debug)]
struct IssueTokenArgs {
    /// User the token is issued for
    #[arg(short = 'u', long)]
    user_id: String,

    /// Validity in hours
    #[arg(long, default_value_t = 168)]
    ttl_hours: u64,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::IssueToken(args)) => issue_token(args),
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    };

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn issue_token(args: IssueTokenArgs) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = UserId::new(args.user_id)?;
    let verifier = JwtTokenVerifier::new(args.jwt_secret.as_bytes());
    let token = verifier.issue(&user_id, Duration::from_secs(args.ttl_hours * 3600))?;
    println!("{}", token);
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::new(
        args.host,
        args.port,
        args.jwt_secret.unwrap_or_default(),
        &args.client_url,
        args.users_file,
        args.notify_unreachable,
    )?;

    // Initialize dependencies in order:
    // 1. Registry, pusher and auth ports
    // 2. UseCases
    // 3. Server

    // 1. Ports
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));
    let verifier = Arc::new(JwtTokenVerifier::new(config.jwt_secret.as_bytes()));
    let directory: Arc<dyn UserDirectory> = match &config.users_file {
        Some(path) => {
            let directory = InMemoryUserDirectory::from_json_file(path)?;
            tracing::info!("Loaded {} users from {}", directory.len(), path.display());
            Arc::new(directory)
        }
        None => {
            tracing::warn!("No users file configured: any valid user id is admitted");
            Arc::new(OpenUserDirectory)
        }
    };

    // 2. UseCases
    let authenticate_session_usecase =
        Arc::new(AuthenticateSessionUseCase::new(verifier, directory));
    let connect_user_usecase = Arc::new(ConnectUserUseCase::new(registry.clone()));
    let disconnect_user_usecase = Arc::new(DisconnectUserUseCase::new(registry.clone()));
    let call_signaling_usecase = Arc::new(CallSignalingUseCase::new(
        message_pusher.clone(),
        config.notify_unreachable,
    ));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(message_pusher));
    let get_presence_usecase = Arc::new(GetPresenceUseCase::new(registry));

    // 3. Server
    tracing::info!("Starting relay on {}", config.bind_addr());
    let server = Server::new(
        authenticate_session_usecase,
        connect_user_usecase,
        disconnect_user_usecase,
        call_signaling_usecase,
        relay_message_usecase,
        get_presence_usecase,
    )
    .with_cors_origin(config.client_origin.clone());

    server.run(config.host, config.port).await
}
