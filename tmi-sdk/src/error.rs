//! Error types shared by the parser, the event accessors and the session.

use std::io;

use crate::config::Capability;
use crate::irc::ParseError;

/// Result type alias using the crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A line from the server could not be parsed. Never fatal to a session.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A tag accessor was used on a message that carries no tag section,
    /// i.e. the capability was not negotiated.
    #[error("capability {0} was not negotiated")]
    MissingCapability(Capability),

    /// Address resolution or TCP connect failed. Returned before any loop starts.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Read or write failure on an established connection.
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),

    /// The send loop has terminated; the command was not queued.
    #[error("session closed")]
    Closed,
}
