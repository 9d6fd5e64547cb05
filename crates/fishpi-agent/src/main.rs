//! # fishpi-agent
//!
//! FishPi chat room client binary: loads settings, logs in, prints a profile
//! summary, then joins the chat room. Chat events are printed until Ctrl-C;
//! lines typed on stdin are posted to the room.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fishpi_chat::{ChatEvent, ChatOptions, ClaimOutcome, InboundEvent, RealtimeSession};
use fishpi_client::{FishpiClient, Profile, YesterdayReward};
use fishpi_core::{init_subscriber, mask_token};
use fishpi_settings::FishpiSettings;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Environment variable holding the password for `--user` logins.
const PASSWORD_ENV: &str = "FISHPI_PASSWORD";

/// FishPi chat room client.
#[derive(Parser, Debug)]
#[command(name = "fishpi-agent", about = "FishPi chat room client")]
struct Cli {
    /// API key to use instead of logging in.
    #[arg(long)]
    key: Option<String>,

    /// Log in with this user name or email; the password is read from `FISHPI_PASSWORD`.
    #[arg(long)]
    user: Option<String>,

    /// Second-factor code for `--user` logins.
    #[arg(long)]
    mfa: Option<String>,

    /// Settings file (defaults to `~/.fishpi/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, overriding the settings file.
    #[arg(long)]
    log_level: Option<String>,

    /// Do not claim rewards automatically.
    #[arg(long)]
    no_claim: bool,
}

/// How the agent obtains its session token.
#[derive(Debug, PartialEq, Eq)]
enum Credentials {
    Key(String),
    Password { user: String, mfa: Option<String> },
    Configured,
}

impl Cli {
    fn credentials(&self, settings: &FishpiSettings) -> Result<Credentials> {
        if let Some(key) = self.key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(Credentials::Key(key.trim().to_string()));
        }
        if let Some(user) = self.user.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(Credentials::Password {
                user: user.trim().to_string(),
                mfa: self.mfa.clone().filter(|m| !m.trim().is_empty()),
            });
        }
        if settings.api.api_key.is_some() {
            return Ok(Credentials::Configured);
        }
        bail!("no credentials: pass --key, --user, or set api.api_key in settings")
    }
}

async fn authenticate(client: &FishpiClient, credentials: Credentials) -> Result<Profile> {
    let auth = client.auth();
    match credentials {
        Credentials::Key(key) => {
            tracing::info!(key = %mask_token(&key), "using API key");
            auth.login_with_token(&key).await.context("API key rejected")
        }
        Credentials::Password { user, mfa } => {
            let password = std::env::var(PASSWORD_ENV)
                .with_context(|| format!("{PASSWORD_ENV} must be set for --user logins"))?;
            let _ = auth
                .login(&user, &password, mfa.as_deref())
                .await
                .context("login failed")?;
            auth.profile().await.context("failed to fetch profile")
        }
        Credentials::Configured => auth.profile().await.context("configured API key rejected"),
    }
}

async fn print_summary(client: &FishpiClient, profile: &Profile) {
    println!("logged in as {} (@{})", profile.display_name(), profile.user_name);
    println!("  points: {}  online: {} min", profile.user_point, profile.online_minute);
    match profile.medals() {
        Ok(medals) if !medals.is_empty() => {
            let names: Vec<_> = medals.iter().map(|m| m.name.as_str()).collect();
            println!("  medals: {}", names.join(", "));
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "medal list did not decode"),
    }

    let account = client.account();
    match account.liveness().await {
        Ok(liveness) => println!("  liveness: {liveness:.1}"),
        Err(e) => tracing::warn!(error = %e, "liveness unavailable"),
    }
    match account.checked_in().await {
        Ok(checked_in) => println!("  checked in today: {}", if checked_in { "yes" } else { "no" }),
        Err(e) => tracing::warn!(error = %e, "check-in status unavailable"),
    }
    match account.claim_yesterday_liveness_reward().await {
        Ok(YesterdayReward::Claimed(points)) => println!("  yesterday's liveness reward: +{points}"),
        Ok(YesterdayReward::AlreadyClaimed) => println!("  yesterday's liveness reward: already claimed"),
        Err(e) => tracing::warn!(error = %e, "liveness reward unavailable"),
    }
}

/// One printable line for a chat event, or `None` when there is nothing to show.
fn describe(event: &ChatEvent) -> Option<String> {
    match event {
        ChatEvent::Message(InboundEvent::Plain(m)) => {
            Some(format!("[{}] {}: {}", m.timestamp.short(), m.author, m.display_text))
        }
        ChatEvent::Message(InboundEvent::Reward(r)) => Some(format!(
            "[{}] {} sent a {} reward: {} points x{} \"{}\"",
            r.timestamp.short(),
            r.author,
            r.kind.label(),
            r.total_amount,
            r.total_count,
            r.blessing
        )),
        ChatEvent::Message(InboundEvent::MalformedReward { author, .. }) => {
            Some(format!("{author} sent a reward this client could not read"))
        }
        ChatEvent::Message(InboundEvent::Undecodable { .. } | InboundEvent::Ignorable) => None,
        ChatEvent::ClaimSkipped { id, remaining } => Some(format!(
            "skipped reward {id}: cooldown {}s left",
            remaining.as_secs()
        )),
        ChatEvent::Claim(ClaimOutcome::Claimed { amount, gesture, .. }) => Some(match gesture {
            Some(g) => format!("claimed {amount} points playing {g}"),
            None => format!("claimed {amount} points"),
        }),
        ChatEvent::Claim(ClaimOutcome::Failed { id, cause, .. }) => {
            Some(format!("claim of {id} failed: {cause}"))
        }
        ChatEvent::Disconnected { reason, .. } => Some(format!("disconnected: {reason}")),
    }
}

fn load_settings(cli: &Cli) -> Result<FishpiSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(fishpi_settings::settings_path);
    let mut settings = fishpi_settings::load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    if cli.no_claim {
        settings.rewards.auto_claim = false;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_subscriber(cli.log_level.as_deref().unwrap_or(&settings.logging.level));

    let client = FishpiClient::from_settings(&settings.api);
    let credentials = cli.credentials(&settings)?;
    let profile = authenticate(&client, credentials).await?;
    print_summary(&client, &profile).await;

    let session = RealtimeSession::new(
        client,
        ChatOptions::from_settings(&settings.chat, &settings.rewards),
    );
    let (connection, mut events) = session.open().await.context("failed to join the chat room")?;
    println!("joined the chat room; type a line to send it, Ctrl-C to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(line) = describe(&event) {
                    println!("{line}");
                }
                if matches!(event, ChatEvent::Disconnected { .. }) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    if let Err(e) = connection.send_message(&line).await {
                        tracing::warn!(error = %e, "message not sent");
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    stdin_open = false;
                }
            },
        }
    }

    tracing::info!("leaving the chat room");
    connection.close().await.context("failed to close the chat connection")?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
