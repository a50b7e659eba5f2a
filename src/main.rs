//! Telemetry relay binary
//!
//! ```text
//! telemetry-relay serve [--bind 0.0.0.0:8080] [--history 20] ...
//! telemetry-relay publish --url http://localhost:8080 --voltage 4.1 ...
//! telemetry-relay reset --url http://localhost:8080
//! ```
//!
//! Every option can also be set through the environment variable shown in
//! `--help`.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};

use telemetry_relay::hub::HubConfig;
use telemetry_relay::server::auth::{DEFAULT_PASSWORD, DEFAULT_USERNAME};
use telemetry_relay::{Credentials, Event, RelayServer, ServerConfig, TelemetryPublisher};

#[derive(Parser)]
#[command(name = "telemetry-relay")]
#[command(about = "Battery telemetry relay: webhook ingest with WebSocket fan-out")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay server
    Serve(ServeArgs),
    /// Post a single reading to a running relay
    Publish(PublishArgs),
    /// Clear a running relay's history
    Reset(RemoteArgs),
}

#[derive(Args)]
struct AuthArgs {
    /// Basic-auth username
    #[arg(long, env = "MOJO_AUTH_USER", default_value = DEFAULT_USERNAME)]
    user: String,

    /// Basic-auth password
    #[arg(long, env = "MOJO_AUTH_PASS", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pass: String,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind to (`localhost`, `host:port` or `ip:port`)
    #[arg(long, env = "RELAY_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Number of readings replayed to new subscribers
    #[arg(long, env = "RELAY_HISTORY_CAPACITY", default_value_t = 20)]
    history: usize,

    /// Seconds between liveness probes
    #[arg(long, env = "RELAY_PING_INTERVAL_SECS", default_value_t = 54)]
    ping_interval: u64,

    /// Seconds of silence before a subscriber is dropped
    #[arg(long, env = "RELAY_READ_TIMEOUT_SECS", default_value_t = 60)]
    read_timeout: u64,

    /// Seconds any single write to a subscriber may take
    #[arg(long, env = "RELAY_WRITE_TIMEOUT_SECS", default_value_t = 10)]
    write_timeout: u64,

    /// Serve producer endpoints without authentication
    #[arg(long, env = "RELAY_NO_AUTH")]
    no_auth: bool,

    #[command(flatten)]
    auth: AuthArgs,
}

#[derive(Args)]
struct RemoteArgs {
    /// Relay base URL
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(flatten)]
    auth: AuthArgs,
}

#[derive(Args)]
struct PublishArgs {
    #[command(flatten)]
    remote: RemoteArgs,

    /// Reading timestamp (defaults to now, epoch seconds)
    #[arg(long)]
    timestamp: Option<i64>,

    /// Accumulated charge in mAh
    #[arg(long, default_value_t = 0.0)]
    milliamp_hours: f64,

    /// Battery voltage
    #[arg(long)]
    voltage: f64,

    /// Temperature in degrees Celsius
    #[arg(long, default_value_t = 25.0)]
    temperature: f64,

    /// Battery chemistry label
    #[arg(long, default_value = "lipo")]
    battery_chemistry: String,

    /// Flag USB power loss
    #[arg(long)]
    usb_alert: bool,
}

/// Parse a bind address string into a SocketAddr
///
/// Supports formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "0.0.0.0:8080" -> 0.0.0.0:8080
/// - "127.0.0.1" -> 127.0.0.1:8080
fn parse_bind_addr(s: &str) -> Result<SocketAddr, String> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let with_port = if s.contains(':') {
        s.to_string()
    } else {
        format!("{}:8080", s)
    };

    with_port
        .to_socket_addrs()
        .map_err(|e| format!("Invalid address '{}': {}", s, e))?
        .find(|addr| addr.is_ipv4())
        .ok_or_else(|| format!("Could not resolve '{}' to an IPv4 address", s))
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = parse_bind_addr(&args.bind)?;

    let hub = HubConfig::default()
        .history_capacity(args.history)
        .ping_interval(Duration::from_secs(args.ping_interval))
        .read_timeout(Duration::from_secs(args.read_timeout))
        .write_timeout(Duration::from_secs(args.write_timeout));

    let mut config = ServerConfig::with_addr(bind_addr).hub(hub);
    config = if args.no_auth {
        config.disable_auth()
    } else {
        config.credentials(Credentials::new(args.auth.user, args.auth.pass))
    };

    let server = RelayServer::new(config)?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

fn publisher(remote: RemoteArgs) -> TelemetryPublisher {
    TelemetryPublisher::new(remote.url).with_basic_auth(remote.auth.user, remote.auth.pass)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telemetry_relay=debug".parse()?),
        )
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Publish(args) => {
            let event = Event::new(
                args.timestamp.unwrap_or_else(now_secs),
                args.milliamp_hours,
                args.voltage,
                args.temperature,
                args.battery_chemistry,
                args.usb_alert,
            );
            publisher(args.remote).publish(&event).await?;
            println!("Published reading at {}", event.timestamp);
        }
        Command::Reset(args) => {
            publisher(args).reset().await?;
            println!("History cleared");
        }
    }

    Ok(())
}
