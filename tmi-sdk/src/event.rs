//! Events emitted by the client for the application to consume.
//!
//! Every event wraps exactly one parsed [`Message`]. Fields are derived on
//! demand from its parameters, prefix and tags, so nothing is copied out
//! of the record at classification time. Positional accessors return an
//! empty string when the server sent fewer parameters than usual; tag
//! accessors return [`Error::MissingCapability`] when the line carried no
//! tag section.

use std::ops::Deref;

use crate::error::Result;
use crate::irc::Message;

macro_rules! event_types {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $name(pub Message);

            impl $name {
                pub fn into_message(self) -> Message {
                    self.0
                }
            }

            impl Deref for $name {
                type Target = Message;

                fn deref(&self) -> &Message {
                    &self.0
                }
            }
        )*
    };
}

event_types! {
    /// Purge of a user's messages after a ban or timeout, or of the whole chat.
    ClearChat;
    /// Removal of a single message.
    ClearMsg;
    /// Our own user's global settings, sent once after login.
    GlobalUserState;
    /// Channel starts or stops host mode.
    HostTarget;
    Join;
    /// General notices from the server.
    Notice;
    Part;
    /// Keep-alive probe; must be answered with PONG.
    Ping;
    Privmsg;
    /// The server is about to restart; rejoin channels after reconnecting.
    Reconnect;
    /// A channel's chat settings (slow mode, followers-only, ...).
    RoomState;
    /// Subscriptions, raids and other announcements.
    UserNotice;
    /// Our own user's settings in a channel.
    UserState;
    Whisper;
    /// Any three-digit server reply.
    Numeric;
    /// A command this client does not classify.
    Unknown;
}

/// A classified server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClearChat(ClearChat),
    ClearMsg(ClearMsg),
    GlobalUserState(GlobalUserState),
    HostTarget(HostTarget),
    Join(Join),
    Notice(Notice),
    Part(Part),
    Ping(Ping),
    Privmsg(Privmsg),
    Reconnect(Reconnect),
    RoomState(RoomState),
    UserNotice(UserNotice),
    UserState(UserState),
    Whisper(Whisper),
    Numeric(Numeric),
    Unknown(Unknown),
}

impl Event {
    /// Pick the variant by exact, case-sensitive command name.
    pub fn classify(msg: Message) -> Event {
        match msg.command.as_str() {
            "CLEARCHAT" => Event::ClearChat(ClearChat(msg)),
            "CLEARMSG" => Event::ClearMsg(ClearMsg(msg)),
            "GLOBALUSERSTATE" => Event::GlobalUserState(GlobalUserState(msg)),
            "HOSTTARGET" => Event::HostTarget(HostTarget(msg)),
            "JOIN" => Event::Join(Join(msg)),
            "NOTICE" => Event::Notice(Notice(msg)),
            "PART" => Event::Part(Part(msg)),
            "PING" => Event::Ping(Ping(msg)),
            "PRIVMSG" => Event::Privmsg(Privmsg(msg)),
            "RECONNECT" => Event::Reconnect(Reconnect(msg)),
            "ROOMSTATE" => Event::RoomState(RoomState(msg)),
            "USERNOTICE" => Event::UserNotice(UserNotice(msg)),
            "USERSTATE" => Event::UserState(UserState(msg)),
            "WHISPER" => Event::Whisper(Whisper(msg)),
            c if c.len() == 3 && c.bytes().all(|b| b.is_ascii_digit()) => {
                Event::Numeric(Numeric(msg))
            }
            _ => Event::Unknown(Unknown(msg)),
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            Event::ClearChat(e) => &e.0,
            Event::ClearMsg(e) => &e.0,
            Event::GlobalUserState(e) => &e.0,
            Event::HostTarget(e) => &e.0,
            Event::Join(e) => &e.0,
            Event::Notice(e) => &e.0,
            Event::Part(e) => &e.0,
            Event::Ping(e) => &e.0,
            Event::Privmsg(e) => &e.0,
            Event::Reconnect(e) => &e.0,
            Event::RoomState(e) => &e.0,
            Event::UserNotice(e) => &e.0,
            Event::UserState(e) => &e.0,
            Event::Whisper(e) => &e.0,
            Event::Numeric(e) => &e.0,
            Event::Unknown(e) => &e.0,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Event::ClearChat(e) => e.0,
            Event::ClearMsg(e) => e.0,
            Event::GlobalUserState(e) => e.0,
            Event::HostTarget(e) => e.0,
            Event::Join(e) => e.0,
            Event::Notice(e) => e.0,
            Event::Part(e) => e.0,
            Event::Ping(e) => e.0,
            Event::Privmsg(e) => e.0,
            Event::Reconnect(e) => e.0,
            Event::RoomState(e) => e.0,
            Event::UserNotice(e) => e.0,
            Event::UserState(e) => e.0,
            Event::Whisper(e) => e.0,
            Event::Numeric(e) => e.0,
            Event::Unknown(e) => e.0,
        }
    }

    pub fn command(&self) -> &str {
        &self.message().command
    }

    pub fn tag(&self, key: &str) -> Result<Option<&str>> {
        self.message().tag(key)
    }
}

impl From<Message> for Event {
    fn from(msg: Message) -> Self {
        Event::classify(msg)
    }
}

fn param(msg: &Message, n: usize) -> &str {
    msg.param(n).unwrap_or("")
}

/// Parameter `n` with the `#` channel marker removed.
fn channel(msg: &Message, n: usize) -> &str {
    let p = param(msg, n);
    p.strip_prefix('#').unwrap_or(p)
}

fn nick(msg: &Message) -> &str {
    msg.nick().unwrap_or("")
}

impl ClearChat {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    /// The user whose messages were purged; `None` when the whole chat was cleared.
    pub fn nick(&self) -> Option<&str> {
        self.param(1)
    }

    /// Timeout length in seconds; `None` for a permanent ban or a chat clear.
    pub fn ban_duration(&self) -> Result<Option<u64>> {
        Ok(self.tag("ban-duration")?.and_then(|v| v.parse().ok()))
    }
}

impl ClearMsg {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn message(&self) -> &str {
        param(self, 1)
    }

    pub fn login(&self) -> Result<Option<&str>> {
        self.tag("login")
    }

    pub fn target_msg_id(&self) -> Result<Option<&str>> {
        self.tag("target-msg-id")
    }
}

impl GlobalUserState {
    pub fn display_name(&self) -> Result<Option<&str>> {
        self.tag("display-name")
    }

    pub fn user_id(&self) -> Result<Option<&str>> {
        self.tag("user-id")
    }
}

impl HostTarget {
    pub fn hosting_channel(&self) -> &str {
        channel(self, 0)
    }

    /// The second parameter is `<channel> [<viewers>]`, with `-` as the
    /// channel when hosting stops.
    fn target(&self) -> (&str, Option<&str>) {
        let p = param(self, 1);
        match p.split_once(' ') {
            Some((channel, viewers)) => (channel, Some(viewers)),
            None => (p, None),
        }
    }

    /// The hosted channel; `None` when host mode ended.
    pub fn target_channel(&self) -> Option<&str> {
        match self.target().0 {
            "-" | "" => None,
            channel => Some(channel),
        }
    }

    pub fn viewers(&self) -> Option<u32> {
        self.target().1.and_then(|v| v.trim().parse().ok())
    }
}

impl Join {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn user(&self) -> &str {
        nick(self)
    }
}

impl Notice {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn message(&self) -> &str {
        param(self, 1)
    }

    pub fn msg_id(&self) -> Result<Option<&str>> {
        self.tag("msg-id")
    }
}

impl Part {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn user(&self) -> &str {
        nick(self)
    }
}

impl Ping {
    pub fn token(&self) -> Option<&str> {
        self.param(0)
    }
}

impl Privmsg {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn message(&self) -> &str {
        param(self, 1)
    }

    /// Login name of the sender.
    pub fn author(&self) -> &str {
        nick(self)
    }

    pub fn display_name(&self) -> Result<Option<&str>> {
        self.tag("display-name")
    }

    pub fn msg_id(&self) -> Result<Option<&str>> {
        self.tag("id")
    }
}

impl RoomState {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn room_id(&self) -> Result<Option<&str>> {
        self.tag("room-id")
    }
}

impl UserNotice {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    /// The user's attached message; empty for bare announcements.
    pub fn message(&self) -> &str {
        param(self, 1)
    }

    /// Kind of notice: `sub`, `resub`, `raid`, ...
    pub fn msg_id(&self) -> Result<Option<&str>> {
        self.tag("msg-id")
    }

    pub fn system_msg(&self) -> Result<Option<String>> {
        self.tag_unescaped("system-msg")
    }
}

impl UserState {
    pub fn channel(&self) -> &str {
        channel(self, 0)
    }

    pub fn display_name(&self) -> Result<Option<&str>> {
        self.tag("display-name")
    }
}

impl Whisper {
    pub fn user(&self) -> &str {
        nick(self)
    }

    pub fn recipient(&self) -> &str {
        param(self, 0)
    }

    pub fn message(&self) -> &str {
        param(self, 1)
    }
}

impl Numeric {
    pub fn code(&self) -> u16 {
        self.command.parse().unwrap_or_default()
    }

    /// The client the reply is addressed to.
    pub fn target(&self) -> &str {
        param(self, 0)
    }
}
