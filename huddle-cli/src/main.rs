use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use huddle::client::peer::WebRtcPeerFactory;
use huddle::client::transport::WsConnector;
use huddle::client::{
    ClientConfig, ClientEvent, GlarePolicy, IdentityStore, MediaReadiness, SignalingClient,
    create_session, session_endpoint,
};
use huddle::server::{ServerConfig, SessionManager, serve};
use huddle::{MemberId, SessionId};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Multi-party WebRTC signaling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session registry.
    Serve(ServerConfig),

    /// Create a session on a running registry.
    Create {
        /// Host identity; defaults to the persisted member id.
        #[arg(long)]
        host: Option<String>,

        #[arg(long, env = "HUDDLE_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },

    /// Join a session as a receive-only participant until Ctrl-C.
    Join(JoinArgs),
}

#[derive(clap::Args)]
struct JoinArgs {
    #[arg(long)]
    session: String,

    #[arg(long, env = "HUDDLE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Member identity; defaults to the persisted member id.
    #[arg(long)]
    member: Option<String>,

    /// Gather host candidates only.
    #[arg(long)]
    no_stun: bool,

    #[arg(long, value_enum, default_value_t = Glare::Ignore)]
    glare: Glare,

    #[arg(long, default_value_t = 5)]
    reconnect_attempts: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Glare {
    Ignore,
    LowerIdentity,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve(config) => run_serve(config).await,
        Commands::Create { host, server } => run_create(host, &server).await,
        Commands::Join(args) => run_join(args).await,
    }
}

async fn run_serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    let manager = SessionManager::new(config.registry());

    println!("{} {}", "📡 Huddle registry on".green().bold(), config.bind);

    tokio::select! {
        res = serve(listener, manager) => res,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Shutting down".yellow());
            Ok(())
        }
    }
}

async fn run_create(host: Option<String>, server: &str) -> Result<()> {
    let host = resolve_member(host)?;
    let session = create_session(server, &host)
        .await
        .context("Failed to create a session")?;

    println!("{}", "✨ Session created".green().bold());
    println!("   id:       {}", session);
    println!("   endpoint: {}", session_endpoint(server, &session));
    Ok(())
}

async fn run_join(args: JoinArgs) -> Result<()> {
    let local = resolve_member(args.member)?;
    let session = SessionId::parse(args.session).context("Session id must not be empty")?;

    let mut config = ClientConfig::default();
    if args.no_stun {
        config.ice_servers.clear();
    }
    config.glare = match args.glare {
        Glare::Ignore => GlarePolicy::IgnoreDuplicate,
        Glare::LowerIdentity => GlarePolicy::LowerIdentityOffers,
    };
    config.reconnect.max_attempts = args.reconnect_attempts;

    let factory = WebRtcPeerFactory::new(&config.ice_servers)
        .context("Failed to set up the WebRTC stack")?;
    let connector = WsConnector::new(session_endpoint(&args.server, &session));

    println!(
        "{} {} as {}",
        "🚀 Joining".cyan().bold(),
        session,
        local.to_string().bold()
    );

    let (handle, mut events) = SignalingClient::spawn(
        config,
        local,
        session,
        Arc::new(connector),
        Arc::new(factory),
        MediaReadiness::always_ready(),
    );

    let mut leaving = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event);

                match event {
                    ClientEvent::Left => break,
                    ClientEvent::SessionNotFound { session } => bail!("Session {} does not exist", session),
                    ClientEvent::SessionUnavailable { attempts } => {
                        bail!("Registry unreachable after {} attempts", attempts)
                    }
                    ClientEvent::InvalidRequest { reason } => bail!("Join rejected: {}", reason),
                    _ => {}
                }
            }

            _ = tokio::signal::ctrl_c(), if !leaving => {
                println!("{}", "Leaving...".yellow());
                leaving = true;
                handle.leave().await;
            }
        }
    }

    Ok(())
}

fn resolve_member(explicit: Option<String>) -> Result<MemberId> {
    if let Some(name) = explicit {
        return MemberId::parse(name).context("Member id must not be empty");
    }
    let store = IdentityStore::resolve()?;
    store
        .load_or_create()
        .with_context(|| format!("Failed to load identity from {}", store.path().display()))
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Joined { reconnect: false } => println!("{}", "✅ Joined".green()),
        ClientEvent::Joined { reconnect: true } => println!("{}", "✅ Rejoined".green()),
        ClientEvent::Reconnecting { attempt, delay } => {
            println!("{} attempt {} in {:?}", "🔄 Reconnecting".yellow(), attempt, delay)
        }
        ClientEvent::PeerConnected { member } => println!("{} {}", "🤝 Connected to".green(), member),
        ClientEvent::PeerFailed { member, error } => {
            println!("{} {}: {}", "⚠️  Lost".red(), member, error)
        }
        ClientEvent::PeerClosed { member } => println!("{} {}", "👋 Closed".dimmed(), member),
        ClientEvent::RemoteTrack {
            member,
            track_id,
            stream_id,
        } => println!("{} {} ({} / {})", "🎥 Track from".cyan(), member, stream_id, track_id),
        ClientEvent::SessionNotFound { session } => {
            println!("{} {}", "❌ No such session".red().bold(), session)
        }
        ClientEvent::SessionUnavailable { attempts } => {
            println!("{} after {} attempts", "❌ Registry unavailable".red().bold(), attempts)
        }
        ClientEvent::InvalidRequest { reason } => {
            println!("{} {}", "❌ Rejected:".red().bold(), reason)
        }
        ClientEvent::Left => println!("{}", "Left the session".dimmed()),
    }
}
