//! Connection options: server address, credentials, requested capabilities.

use std::fmt;
use std::time::Duration;

/// Default plaintext chat endpoint.
pub const DEFAULT_SERVER: &str = "irc.chat.twitch.tv:6667";
/// Anonymous login accepted by the server for read-only sessions.
pub const ANONYMOUS_NICK: &str = "justinfan77777";
pub const ANONYMOUS_PASS: &str = "oauth:ThisIsAnAnonymousAuth_forsenPls";
/// Longest inbound line accepted, delimiter included. Room for a full
/// 8 KiB tag section plus a 512-byte IRC line with multibyte text.
pub const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024;
/// How long `close` lets the send loop flush already-queued commands.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Optional protocol extensions requested with `CAP REQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// JOIN/PART membership events and NAMES replies.
    Membership,
    /// IRCv3 message tags on most commands.
    Tags,
    /// Twitch-specific commands (CLEARCHAT, HOSTTARGET, USERSTATE, ...).
    Commands,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Commands, Capability::Membership, Capability::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Membership => "twitch.tv/membership",
            Capability::Tags => "twitch.tv/tags",
            Capability::Commands => "twitch.tv/commands",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for connecting to the chat server.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Server address (host:port).
    pub server_addr: String,
    /// Login name, sent with `NICK`.
    pub nick: String,
    /// OAuth token, sent with `PASS`.
    pub pass: String,
    /// Capabilities requested during the handshake, in order.
    pub capabilities: Vec<Capability>,
    /// Bound of the event queue (socket -> application).
    pub event_capacity: usize,
    /// Bound of the command queue (application -> socket).
    pub command_capacity: usize,
    /// Inbound lines longer than this are dropped as malformed.
    pub max_line_len: usize,
    /// Upper bound on flushing queued commands once `close` is called.
    pub close_timeout: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER.to_string(),
            nick: ANONYMOUS_NICK.to_string(),
            pass: ANONYMOUS_PASS.to_string(),
            capabilities: Capability::ALL.to_vec(),
            event_capacity: 4096,
            command_capacity: 256,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl ConnectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth(mut self, nick: impl Into<String>, pass: impl Into<String>) -> Self {
        self.nick = nick.into();
        self.pass = pass.into();
        self
    }

    pub fn server(mut self, addr: impl Into<String>) -> Self {
        self.server_addr = addr.into();
        self
    }

    /// Replace the requested capability set.
    pub fn capabilities(mut self, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    /// Queues need room for at least one item; zero is bumped to one.
    pub fn queue_capacity(mut self, events: usize, commands: usize) -> Self {
        self.event_capacity = events.max(1);
        self.command_capacity = commands.max(1);
        self
    }

    /// Anything shorter than a bare `PING` plus CRLF is bumped up to it.
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len.max(8);
        self
    }

    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// The space-separated list sent with `CAP REQ`.
    pub(crate) fn capability_list(&self) -> String {
        self.capabilities
            .iter()
            .map(Capability::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
