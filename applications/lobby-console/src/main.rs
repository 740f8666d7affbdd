/// Lobby Console - interactive host for a lobby session
use clap::Parser;
use lobby_console::command::{self, Input, HELP};
use lobby_console::config::ConsoleConfig;
use lobby_core::types::{TrackId, TransportState, UserId};
use lobby_playback::memory::{InMemoryLikedStore, InMemoryPlayLog, LoopbackChannel};
use lobby_playback::{Collaborators, LobbySession, SessionEvent, SessionHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for the session to publish after a command
const VIEW_WAIT: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "lobby-console")]
#[command(about = "Drive a Lobby Player session from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signed-in user id (overrides `user.id` and LOBBY_USER__ID)
    #[arg(short, long)]
    user: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long)]
    log_filter: Option<String>,

    /// Do not feed lobby broadcasts back into the session
    #[arg(long)]
    detached: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(user) = cli.user {
        config.user.id = Some(user);
    }
    if let Some(filter) = cli.log_filter {
        config.logging.filter = filter;
    }

    // Initialize tracing (stderr keeps stdout for the player)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    config.validate()?;

    let channel = Arc::new(LoopbackChannel::new(TransportState::with_volume(
        config.session.initial_volume,
    )));
    let collaborators = Collaborators {
        channel: channel.clone(),
        liked_store: Arc::new(InMemoryLikedStore::new()),
        play_log: Arc::new(InMemoryPlayLog::new()),
    };

    let user = config.user.id.clone().map(UserId::new);
    let (session, mut diagnostics) = LobbySession::new(config.session.clone(), user, collaborators)?;
    let session_id = session.id();
    let (mut handle, session_task) = session.spawn();
    tracing::info!(%session_id, "Lobby console ready");

    let echo = if cli.detached {
        None
    } else {
        let mut updates = channel.subscribe();
        let remote = handle.clone();
        Some(tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(state) => {
                        if remote.send(SessionEvent::Remote(state)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Broadcast receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    };

    tokio::spawn(async move {
        while let Some(diagnostic) = diagnostics.recv().await {
            eprintln!("! {}", diagnostic);
        }
    });

    println!("{}", HELP);
    println!("{}", handle.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match command::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let event = match input {
            Input::Session(command) => SessionEvent::Command(command),
            Input::SetUser(user) => SessionEvent::SetUser(user),
            Input::Lock(disabled) => SessionEvent::SetControlsDisabled(disabled),
            Input::MediaReady => match current_track(&handle) {
                Some(track_id) => SessionEvent::MediaReady(track_id),
                None => continue,
            },
            Input::MediaFailed => match current_track(&handle) {
                Some(track_id) => SessionEvent::MediaFailed(track_id),
                None => continue,
            },
            Input::Status => {
                println!("{}", handle.view());
                continue;
            }
            Input::Queue => {
                print_queue(&handle);
                continue;
            }
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Quit => break,
        };

        handle.send(event).await?;
        if tokio::time::timeout(VIEW_WAIT, handle.changed()).await.is_ok() {
            println!("{}", handle.view());
        }
    }

    // The echo task holds a handle; stop it so the session can wind down
    if let Some(echo) = echo {
        echo.abort();
    }
    drop(handle);
    session_task.await?;

    tracing::info!(%session_id, "Lobby console stopped");
    Ok(())
}

fn current_track(handle: &SessionHandle) -> Option<TrackId> {
    let track_id = handle.view().track_id;
    if track_id.is_none() {
        println!("No track loaded");
    }
    track_id
}

fn print_queue(handle: &SessionHandle) {
    let view = handle.view();
    if view.queue.is_empty() {
        println!("Queue is empty");
        return;
    }
    for (position, row) in view.queue.iter().enumerate() {
        println!("{:>3}. {} - {}", position + 1, row.title, row.artist);
    }
}
