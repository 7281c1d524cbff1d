//! Outbound commands and their wire rendering.

use std::fmt;

/// Line delimiter of the protocol.
pub const DELIM: &str = "\r\n";

/// Reply to the server's keep-alive.
const PONG: &str = "PONG :tmi.twitch.tv";

/// One outbound protocol line. Queued once, written once.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Join every channel in a single `JOIN #a,#b,...` line. Not split
    /// when the line grows past the server's length limit.
    Join(Vec<String>),
    Part(String),
    Say { channel: String, message: String },
    Pong,
    /// Sent verbatim with the delimiter appended.
    Raw(String),
}

impl Command {
    /// Channel names are given without the `#` marker.
    pub fn join<I, S>(channels: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Join(channels.into_iter().map(Into::into).collect())
    }

    pub fn part(channel: impl Into<String>) -> Command {
        Command::Part(channel.into())
    }

    pub fn say(channel: impl Into<String>, message: impl Into<String>) -> Command {
        Command::Say {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn pong() -> Command {
        Command::Pong
    }

    pub fn line(text: impl Into<String>) -> Command {
        Command::Raw(text.into())
    }

    /// Wire bytes, delimiter included.
    pub fn render(&self) -> String {
        format!("{self}{DELIM}")
    }
}

/// The line without its delimiter.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Join(channels) => {
                f.write_str("JOIN ")?;
                for (n, channel) in channels.iter().enumerate() {
                    if n > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "#{channel}")?;
                }
                Ok(())
            }
            Command::Part(channel) => write!(f, "PART #{channel}"),
            Command::Say { channel, message } => write!(f, "PRIVMSG #{channel} :{message}"),
            Command::Pong => f.write_str(PONG),
            Command::Raw(line) => f.write_str(line),
        }
    }
}
