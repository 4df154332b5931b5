//! Tripboard CLI
//!
//! Terminal front end for the trip's social sidebar:
//! - read and post chat messages
//! - list, join, and leave event RSVPs
//! - watch a live view of both
//!
//! The same operations back the web UI; the CLI exists so the store can
//! be driven without a browser.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripboard::config::{generate_default_config, Config};
use tripboard::feed::{AttendeeFeed, MessageFeed};
use tripboard::identity::Session;
use tripboard::notify::{rsvp_topic, ChangeBus, CHAT_TOPIC};
use tripboard::poll::{PollConfig, Poller};
use tripboard::store::{ChatMessage, SocialClient};

#[derive(Parser)]
#[command(name = "tripboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Anonymous chat and RSVPs for the trip site")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat log operations
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// RSVP operations
    Rsvp {
        #[command(subcommand)]
        command: RsvpCommands,
    },

    /// Watch the chat log (and optionally one event) live
    Watch {
        /// Event to watch attendees for
        #[arg(short, long)]
        event: Option<String>,
    },

    /// Show mode, identity, and profile location
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Print the chat log, oldest first
    List,
    /// Post a message under this profile's identity
    Send {
        /// Message text (1..=500 characters)
        text: String,
    },
}

#[derive(Subcommand)]
pub enum RsvpCommands {
    /// List an event's attendees
    List { event: String },
    /// RSVP to an event
    Join {
        event: String,
        /// Display name (default: this profile's identity)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Retract this profile's RSVP
    Leave { event: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config);

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)?;
                println!("Wrote config to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let session = Session::load_or_create(&config.storage.data_dir);
    let bus = Arc::new(ChangeBus::default());
    let client = Arc::new(SocialClient::with_profile(
        config.remote_config(),
        &config.storage.data_dir,
        Arc::clone(&bus),
        session,
    ));

    match cli.command {
        Commands::Chat { command } => match command {
            ChatCommands::List => {
                let messages = client.list_messages().await?;
                if messages.is_empty() {
                    println!("(no messages yet)");
                }
                for message in messages {
                    print_message(&message);
                }
            }
            ChatCommands::Send { text } => match client.post_message(&text).await? {
                Some(message) => print_message(&message),
                None => {
                    eprintln!("Not confirmed - the server did not accept the message. Try again.");
                    std::process::exit(1);
                }
            },
        },

        Commands::Rsvp { command } => match command {
            RsvpCommands::List { event } => {
                let attendees = client.list_attendees(&event).await?;
                let mine = client.my_rsvp_id(&event).await?;
                println!("{} going to {}", attendees.len(), event);
                for attendee in attendees {
                    let marker = if mine.as_deref() == Some(attendee.visitor_id.as_str()) {
                        " (you)"
                    } else {
                        ""
                    };
                    println!("  {}{}", attendee.name, marker);
                }
            }
            RsvpCommands::Join { event, name } => {
                match client.add_rsvp(&event, name.as_deref()).await? {
                    Some(entry) => println!("{} is going to {}", entry.name, event),
                    None => {
                        eprintln!("Not confirmed - the server did not accept the RSVP. Try again.");
                        std::process::exit(1);
                    }
                }
            }
            RsvpCommands::Leave { event } => {
                if client.remove_rsvp(&event).await? {
                    println!("Left {}", event);
                } else {
                    eprintln!("Not confirmed - the server did not accept the removal. Try again.");
                    std::process::exit(1);
                }
            }
        },

        Commands::Watch { event } => watch(client, bus, &config, event).await?,

        Commands::Status => {
            let identity = client.session().identity();
            println!(
                "Mode:     {}",
                if client.is_configured() {
                    "remote"
                } else {
                    "local"
                }
            );
            println!("Identity: {} {}", identity.display_name, identity.color);
            println!("Profile:  {}", config.storage.data_dir);
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Live view: initial load, then bus watchers in local mode or the
/// poller in remote mode, printed until Ctrl-C.
async fn watch(
    client: Arc<SocialClient>,
    bus: Arc<ChangeBus>,
    config: &Config,
    event: Option<String>,
) -> anyhow::Result<()> {
    let messages = MessageFeed::new();
    messages.replace(client.list_messages().await?).await;

    let attendees = match &event {
        Some(event_id) => {
            let feed = AttendeeFeed::new(event_id.clone());
            feed.replace(client.list_attendees(event_id).await?).await;
            Some(feed)
        }
        None => None,
    };

    // Local mode: merge bus events. Remote mode: poll.
    let _watchers = if client.is_configured() {
        None
    } else {
        let mut handles = vec![messages.spawn_watcher(bus.subscribe(CHAT_TOPIC))];
        if let Some(feed) = &attendees {
            handles.push(feed.spawn_watcher(bus.subscribe(&rsvp_topic(feed.event_id()))));
        }
        Some(handles)
    };
    let _poller = if client.is_configured() {
        Some(Poller::spawn(
            Arc::clone(&client),
            Some(messages.clone()),
            attendees.iter().cloned().collect(),
            PollConfig {
                messages_secs: config.poll.messages_secs,
                attendees_secs: config.poll.attendees_secs,
            },
        ))
    } else {
        None
    };

    for message in messages.snapshot().await {
        print_message(&message);
    }
    if let Some(feed) = &attendees {
        println!("-- {} going to {}", feed.snapshot().await.len(), feed.event_id());
    }
    println!("-- watching (Ctrl-C to stop) --");

    let mut seen = messages.snapshot().await.len();
    let mut attendee_count = match &attendees {
        Some(feed) => feed.snapshot().await.len(),
        None => 0,
    };
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = messages.snapshot().await;
                // The log is bounded, so under heavy churn the count can
                // stand still while contents rotate; good enough for a
                // terminal tail.
                if snapshot.len() > seen {
                    for message in &snapshot[seen..] {
                        print_message(message);
                    }
                }
                seen = snapshot.len();

                if let Some(feed) = &attendees {
                    let count = feed.snapshot().await.len();
                    if count != attendee_count {
                        println!("-- {} going to {}", count, feed.event_id());
                        attendee_count = count;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    let when = chrono::DateTime::from_timestamp_millis(message.timestamp)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    println!("[{}] {}: {}", when, message.author, message.text);
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("tripboard={}", config.logging.level))
        });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
