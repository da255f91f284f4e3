use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
#[cfg(feature = "microphone")]
use huddle::client::SystemCapture;
#[cfg(not(feature = "microphone"))]
use huddle::client::SilentCapture;
use huddle::client::{
    CaptureDevice, ClientConfig, ReconnectPolicy, RemoteStream, SessionHandle, SessionNotice,
    connect_webrtc,
};
use huddle::model::{IceServerConfig, Room};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Join a voice chat room from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and stay until Ctrl-C.
    Join(JoinArgs),
}

#[derive(clap::Args, Default)]
struct JoinArgs {
    /// Room name or page path, e.g. `lobby` or `/lobby`. Prompted for when omitted.
    room: Option<String>,

    /// Signaling relay base URL.
    #[arg(long)]
    server: Option<String>,

    /// STUN server, may be repeated. Replaces the default list.
    #[arg(long = "stun")]
    stun: Vec<String>,

    /// Reconnect to the relay up to N times after a drop.
    #[arg(long, value_name = "N")]
    reconnect: Option<u32>,

    /// Delay between reconnect attempts.
    #[arg(long, default_value_t = 1000)]
    reconnect_delay_ms: u64,

    /// Mix a test tone into the outbound stream.
    #[arg(long)]
    tone: bool,

    /// Log filter used when HUDDLE_LOG is not set.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("HUDDLE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn build_config(args: &JoinArgs) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(server) = &args.server {
        config = config.with_signaling_url(server.clone());
    }
    if !args.stun.is_empty() {
        config.ice_servers = vec![IceServerConfig {
            urls: args.stun.clone(),
            username: None,
            credential: None,
        }];
    }
    if let Some(max_attempts) = args.reconnect {
        config.reconnect = ReconnectPolicy::Fixed {
            max_attempts,
            delay: Duration::from_millis(args.reconnect_delay_ms),
        };
    }
    config.test_tone = args.tone;
    config
}

fn prompt_room() -> Result<String> {
    let room: String = Input::new()
        .with_prompt("Room")
        .default("lobby".to_owned())
        .interact_text()
        .context("Failed to read room name")?;
    Ok(room)
}

async fn run(cli: Cli) -> Result<()> {
    let args = match cli.command {
        Some(Commands::Join(args)) => args,
        None => JoinArgs::default(),
    };
    init_logging(args.log_level.as_deref().unwrap_or("info"));

    let room = match args.room.clone() {
        Some(room) => room,
        None => prompt_room()?,
    };
    let config = build_config(&args);

    println!("{}", format!("📞 Joining '{}'...", room).green().bold());
    let (mut session, handle) = connect_webrtc(config, &room, capture_device())
        .await
        .context("Failed to set up the call")?;

    let mut remote = session.take_remote_streams();
    let mut presence = handle.presence();
    let mut notices = handle.notices();
    let mut session_task = tokio::spawn(session.run());

    match handle.request_microphone().await {
        Ok(()) => println!("{}", "🎙  Microphone ready (muted)".cyan()),
        Err(e) => warn!("Continuing without a microphone: {}", e),
    }
    print_help();

    let mut keys = BufReader::new(tokio::io::stdin()).lines();
    let mut keys_open = true;
    let mut tone = args.tone;
    let mut meter = tokio::time::interval(METER_INTERVAL);
    let mut level = handle.level();
    let mut shown_level = 0.0f32;

    let finished = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving...".cyan());
                break None;
            }

            joined = &mut session_task => break Some(joined),

            line = keys.next_line(), if keys_open => match line {
                Ok(Some(line)) => {
                    let Some(key) = parse_key(&line) else {
                        print_help();
                        continue;
                    };
                    if key == Key::Quit {
                        println!("{}", "👋 Leaving...".cyan());
                        break None;
                    }
                    if let Err(e) = apply_key(key, &handle, &mut tone).await {
                        println!("{}", format!("⚠️  {}", e).yellow());
                    }
                }
                Ok(None) => keys_open = false,
                Err(e) => {
                    debug!("Keyboard input closed: {}", e);
                    keys_open = false;
                }
            },

            _ = meter.tick() => {
                let Some(level) = level.as_mut() else { continue };
                let current = *level.borrow_and_update();
                if (current - shown_level).abs() >= METER_STEP {
                    shown_level = current;
                    println!("🎚  {}", level_meter(current));
                }
            }

            Some(stream) = next_remote(&mut remote) => {
                println!("{}", format!("🔊 Receiving {} from {}", stream.kind, stream.id).cyan());
            }

            Ok(()) = presence.changed() => {
                let state = presence.borrow_and_update().clone();
                println!("👥 {}", describe_room(&state.room));
            }

            notice = notices.recv() => match notice {
                Ok(SessionNotice::TransportOpen) => {
                    println!("{}", "✨ Connected to the relay".green());
                }
                Ok(notice) => {
                    println!("{}", format!("⚠️  {}", describe_notice(&notice)).yellow());
                }
                Err(e) => debug!("Notice bus: {}", e),
            }
        }
    };

    let joined = match finished {
        Some(joined) => joined,
        None => {
            handle.shutdown().await;
            session_task.await
        }
    };
    joined
        .context("Call session panicked")?
        .context("Call session failed")
}

#[cfg(feature = "microphone")]
fn capture_device() -> Arc<dyn CaptureDevice> {
    Arc::new(SystemCapture)
}

#[cfg(not(feature = "microphone"))]
fn capture_device() -> Arc<dyn CaptureDevice> {
    Arc::new(SilentCapture)
}

/// One-letter commands read from stdin, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    ToggleMicrophone,
    ToggleSpeaker,
    ToggleTone,
    Quit,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim().to_ascii_lowercase().as_str() {
        "m" => Some(Key::ToggleMicrophone),
        "s" => Some(Key::ToggleSpeaker),
        "t" => Some(Key::ToggleTone),
        "q" => Some(Key::Quit),
        _ => None,
    }
}

async fn apply_key(key: Key, handle: &SessionHandle, tone: &mut bool) -> Result<()> {
    let state = handle.presence().borrow().clone();
    match key {
        Key::ToggleMicrophone => {
            let muted = !state.is_muted_microphone;
            handle.set_microphone_muted(muted).await?;
            println!("{}", if muted { "🔇 Microphone muted" } else { "🎙  Microphone live" });
        }
        Key::ToggleSpeaker => {
            let muted = !state.is_muted_speaker;
            handle.set_speaker_muted(muted).await?;
            println!("{}", if muted { "🔕 Output muted" } else { "🔔 Output on" });
        }
        Key::ToggleTone => {
            *tone = !*tone;
            handle.set_tone(*tone).await?;
            println!("{}", if *tone { "🎵 Test tone on" } else { "🎵 Test tone off" });
        }
        Key::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!(
        "{}",
        "Keys (then Enter): m mute/unmute mic · s mute/unmute output · t test tone · q leave".dimmed()
    );
}

const METER_INTERVAL: Duration = Duration::from_millis(500);
const METER_STEP: f32 = 0.02;
const METER_WIDTH: usize = 20;

/// Outbound level as a bar, `level` being the RMS of the last frame.
fn level_meter(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * METER_WIDTH as f32).round() as usize).min(METER_WIDTH);
    format!(
        "[{}{}] {:.2}",
        "#".repeat(filled),
        "-".repeat(METER_WIDTH - filled),
        level
    )
}

async fn next_remote(rx: &mut Option<mpsc::UnboundedReceiver<RemoteStream>>) -> Option<RemoteStream> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn describe_room(room: &Room) -> String {
    if room.is_empty() {
        return "nobody here yet".to_owned();
    }
    room.users
        .iter()
        .map(|u| format!("{} {}", u.emoji, u.id))
        .collect::<Vec<_>>()
        .join("  ")
}

fn describe_notice(notice: &SessionNotice) -> String {
    match notice {
        SessionNotice::NegotiationFailed(e) => format!("negotiation failed: {e}"),
        SessionNotice::Protocol(e) => format!("protocol error: {e}"),
        SessionNotice::TransportOpen => "connected".to_owned(),
        SessionNotice::TransportClosed => "relay connection closed".to_owned(),
        SessionNotice::TransportError(e) => format!("relay error: {e}"),
        SessionNotice::TransportEnded => "relay connection lost for good".to_owned(),
    }
}
