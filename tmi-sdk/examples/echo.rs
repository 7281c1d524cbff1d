//! Echo bot: repeats `!echo <text>` back into the channel.
//!
//! Usage:
//!   TMI_NICK=mybot TMI_PASS=oauth:... cargo run --example echo -- --channel mybot
//!
//! Without credentials it logs in anonymously (read-only, replies are dropped
//! by the server). Set `RUST_LOG=tmi_sdk=debug` to see the raw traffic.

use anyhow::Result;
use clap::Parser;
use tmi_sdk::config::{ANONYMOUS_NICK, ANONYMOUS_PASS, DEFAULT_SERVER};
use tmi_sdk::{ConnectConfig, Event};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echo", about = "Twitch chat echo bot")]
struct Args {
    #[arg(long, env = "TMI_SERVER", default_value = DEFAULT_SERVER)]
    server: String,
    #[arg(long, env = "TMI_NICK", default_value = ANONYMOUS_NICK)]
    nick: String,
    #[arg(long, env = "TMI_PASS", default_value = ANONYMOUS_PASS, hide_env_values = true)]
    pass: String,
    /// Channel to join (defaults to the bot's own channel).
    #[arg(long)]
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("tmi_sdk=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let config = ConnectConfig::new()
        .server(&args.server)
        .auth(&args.nick, &args.pass);
    let mut client = tmi_sdk::connect(&config).await?;
    let handle = client.handle();

    let channel = args.channel.unwrap_or_else(|| args.nick.clone());
    handle.join(&[&channel]).await?;
    tracing::info!("Joined #{channel} as {}", args.nick);

    while let Some(event) = client.recv().await {
        match &event {
            Event::Privmsg(msg) => {
                if let Some(reply) = msg.message().strip_prefix("!echo ") {
                    handle.say(msg.channel(), reply).await?;
                }
            }
            Event::Reconnect(_) => {
                tracing::warn!("Server asked us to reconnect, exiting");
                break;
            }
            _ => client.dispatch_default(&event).await?,
        }
    }

    client.close().await?;
    Ok(())
}
