//! Client SDK for Twitch chat (TMI), an IRC dialect with message tags.
//!
//! - [`irc`] parses one protocol line into a [`Message`].
//! - [`event`] classifies a message into an [`Event`] by command name.
//! - [`command`] renders outbound [`Command`]s to wire lines.
//! - [`client`] runs a session: one socket, a receive task and a send task,
//!   with an event queue and a command queue between them and the caller.
//!
//! ```rust,no_run
//! use tmi_sdk::{ConnectConfig, Event};
//!
//! # async fn example() -> tmi_sdk::Result<()> {
//! let config = ConnectConfig::new().auth("justinfan123", "oauth:anything");
//! let mut client = tmi_sdk::connect(&config).await?;
//! client.handle().join(&["forsen"]).await?;
//!
//! while let Some(event) = client.recv().await {
//!     match &event {
//!         Event::Privmsg(msg) => println!("{}: {}", msg.author(), msg.message()),
//!         _ => client.dispatch_default(&event).await?,
//!     }
//! }
//! client.close().await
//! # }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod irc;

pub use client::{Client, ClientHandle, SessionStats, connect, connect_with_stream};
pub use command::Command;
pub use config::{Capability, ConnectConfig};
pub use error::{Error, Result};
pub use event::Event;
pub use irc::{Message, ParseError, Prefix};
