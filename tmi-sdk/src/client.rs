//! Chat client: one TCP connection driven by two tasks.
//!
//! The receive task owns the read half of the socket and turns each line
//! into an [`Event`] on the event queue. The send task owns the write half
//! and writes [`Command`]s from the command queue in FIFO order, flushing
//! after each one. The queues are the only thing the two tasks share.
//!
//! Right after both tasks start, `PASS`, `NICK` and `CAP REQ` are queued,
//! in that order, before the caller gets a handle to queue anything else.
//!
//! ## Failures
//!
//! A malformed or overlong line is logged, counted in
//! [`SessionStats::parse_errors`] and skipped. A read or write error stops
//! only the task that hit it; the event queue then ends (reader) or
//! [`ClientHandle::send`] starts failing with [`Error::Closed`] (writer),
//! and [`Client::close`] returns the error. Nothing here panics or exits
//! the process.
//!
//! ## Shutdown
//!
//! [`Client::close`] stops the receive loop at once. The send loop stops
//! accepting commands, writes out the ones already queued and then shuts
//! down its half of the socket. That flush is bounded by
//! [`ConnectConfig::close_timeout`]: a peer that stops reading cannot hold
//! `close` up, and whatever was left unwritten is counted in
//! [`SessionStats::commands_dropped`].
//!
//! ## Reconnection
//!
//! The SDK does not reconnect. Consumers that want to should watch for the
//! event queue ending (or a [`Event::Reconnect`]) and call [`connect`] again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
    BufWriter,
};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};

use crate::command::Command;
use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::irc::Message;

/// Counters for one session. Readable while the session runs.
#[derive(Debug, Default)]
pub struct SessionStats {
    lines_received: AtomicU64,
    events_delivered: AtomicU64,
    parse_errors: AtomicU64,
    commands_written: AtomicU64,
    commands_dropped: AtomicU64,
}

impl SessionStats {
    pub fn lines_received(&self) -> u64 {
        self.lines_received.load(Ordering::Relaxed)
    }

    pub fn events_delivered(&self) -> u64 {
        self.events_delivered.load(Ordering::Relaxed)
    }

    /// Lines that failed to parse and were dropped.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    pub fn commands_written(&self) -> u64 {
        self.commands_written.load(Ordering::Relaxed)
    }

    /// Queued commands abandoned because `close` timed out flushing them.
    pub fn commands_dropped(&self) -> u64 {
        self.commands_dropped.load(Ordering::Relaxed)
    }
}

/// A cloneable handle for queueing commands.
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl ClientHandle {
    /// Queue a command. Waits while the queue is full.
    pub async fn send(&self, cmd: Command) -> Result<()> {
        if self.cmd_tx.capacity() == 0 {
            tracing::warn!("Command queue is full, waiting for the send loop");
        }
        self.cmd_tx.send(cmd).await.map_err(|_| Error::Closed)
    }

    /// Join channels (names without `#`) in one line.
    pub async fn join(&self, channels: &[&str]) -> Result<()> {
        if channels.is_empty() {
            return Ok(());
        }
        self.send(Command::join(channels.iter().copied())).await
    }

    pub async fn part(&self, channel: &str) -> Result<()> {
        self.send(Command::part(channel)).await
    }

    pub async fn say(&self, channel: &str, message: &str) -> Result<()> {
        self.send(Command::say(channel, message)).await
    }

    pub async fn pong(&self) -> Result<()> {
        self.send(Command::pong()).await
    }

    pub async fn raw(&self, line: &str) -> Result<()> {
        self.send(Command::line(line)).await
    }

    /// Baseline reactions the protocol requires: answer PING with PONG.
    /// Call it for events the application does not handle itself.
    pub async fn dispatch_default(&self, event: &Event) -> Result<()> {
        if let Event::Ping(_) = event {
            self.pong().await?;
        }
        Ok(())
    }
}

/// A running session. Owns the event queue and both socket tasks.
pub struct Client {
    handle: ClientHandle,
    events: mpsc::Receiver<Event>,
    shutdown: watch::Sender<bool>,
    reader: Option<JoinHandle<Result<()>>>,
    writer: Option<JoinHandle<Result<()>>>,
    stats: Arc<SessionStats>,
}

/// Resolve `config.server_addr`, connect, start both loops and send the
/// login handshake.
pub async fn connect(config: &ConnectConfig) -> Result<Client> {
    tracing::debug!("Resolving {}...", config.server_addr);
    let tcp = TcpStream::connect(&config.server_addr)
        .await
        .map_err(|source| Error::Connect {
            addr: config.server_addr.clone(),
            source,
        })?;
    tracing::info!("Connected to {}", config.server_addr);
    let (reader, writer) = tcp.into_split();
    Client::start(reader, writer, config).await
}

/// Run a session over an already established stream.
pub async fn connect_with_stream<S>(stream: S, config: &ConnectConfig) -> Result<Client>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    Client::start(reader, writer, config).await
}

impl Client {
    async fn start<R, W>(reader: R, writer: W, config: &ConnectConfig) -> Result<Client>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(SessionStats::default());

        let reader = tokio::spawn(read_loop(
            BufReader::new(reader),
            event_tx,
            shutdown_rx.clone(),
            stats.clone(),
            config.max_line_len,
        ));
        let writer = tokio::spawn(write_loop(
            writer,
            cmd_rx,
            shutdown_rx,
            stats.clone(),
            config.close_timeout,
        ));

        let mut client = Client {
            handle: ClientHandle { cmd_tx },
            events: event_rx,
            shutdown: shutdown_tx,
            reader: Some(reader),
            writer: Some(writer),
            stats,
        };

        if let Err(e) = client.handshake(config).await {
            // A dead writer is the only way the handshake fails; prefer its error.
            return Err(client.close().await.err().unwrap_or(e));
        }
        Ok(client)
    }

    async fn handshake(&self, config: &ConnectConfig) -> Result<()> {
        self.handle.raw(&format!("PASS {}", config.pass)).await?;
        self.handle.raw(&format!("NICK {}", config.nick)).await?;
        // Sent even when the list is empty; the server answers with an empty ACK.
        self.handle
            .raw(&format!("CAP REQ :{}", config.capability_list()))
            .await
    }

    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Next event in arrival order. `None` once the receive loop has ended.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub async fn send(&self, cmd: Command) -> Result<()> {
        self.handle.send(cmd).await
    }

    pub async fn dispatch_default(&self, event: &Event) -> Result<()> {
        self.handle.dispatch_default(event).await
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Stop both loops and release the socket.
    ///
    /// Commands queued before the call are still written, for at most
    /// [`ConnectConfig::close_timeout`]. Returns the first read/write error
    /// a loop died with, if any. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        self.shutdown.send_replace(true);
        self.events.close();

        let mut result = Ok(());
        for task in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            match task.await {
                Ok(Err(e)) if result.is_ok() => result = Err(e),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Session task did not finish cleanly"),
            }
        }
        result
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

/// Strip the line delimiter. Accepts a bare LF as well as CRLF.
fn trim_line(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn read_loop<R>(
    mut reader: R,
    event_tx: mpsc::Sender<Event>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<SessionStats>,
    max_line: usize,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(512);
    // Set while skipping the tail of an overlong line.
    let mut discarding = false;
    loop {
        buf.clear();
        let mut limited = (&mut reader).take(max_line as u64);
        let n = tokio::select! {
            result = limited.read_until(b'\n', &mut buf) => match result {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(error = %e, "Read failed, stopping receive loop");
                    return Err(e.into());
                }
            },
            _ = shutdown.changed() => {
                tracing::debug!("Receive loop stopped");
                return Ok(());
            }
        };
        if n == 0 {
            tracing::info!("Server closed the connection");
            return Ok(());
        }

        let complete = buf.ends_with(b"\n");
        if discarding {
            discarding = !complete;
            continue;
        }
        stats.lines_received.fetch_add(1, Ordering::Relaxed);
        if !complete && n == max_line {
            discarding = true;
            stats.parse_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                limit = max_line,
                start = %String::from_utf8_lossy(&buf[..buf.len().min(64)]),
                "Dropping overlong line"
            );
            continue;
        }

        let line = trim_line(&buf);
        tracing::debug!("<- {}", String::from_utf8_lossy(line));

        let msg = match Message::parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                stats.parse_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %e,
                    line = %String::from_utf8_lossy(line),
                    "Dropping malformed line"
                );
                continue;
            }
        };

        if event_tx.capacity() == 0 {
            tracing::warn!("Event queue is full, receive loop will block");
        }
        tokio::select! {
            sent = event_tx.send(Event::classify(msg)) => {
                if sent.is_err() {
                    tracing::debug!("Event queue closed, stopping receive loop");
                    return Ok(());
                }
            }
            _ = shutdown.changed() => {
                tracing::debug!("Receive loop stopped");
                return Ok(());
            }
        }
        stats.events_delivered.fetch_add(1, Ordering::Relaxed);
    }
}

async fn write_loop<W>(
    writer: W,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<SessionStats>,
    grace: Duration,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);
    // Set once shutdown is signalled; every later wait is bounded by it.
    let mut deadline: Option<Instant> = None;
    loop {
        let cmd = match deadline {
            Some(at) => match timeout_at(at, cmd_rx.recv()).await {
                Ok(cmd) => cmd,
                Err(_) => {
                    abandon(&mut cmd_rx, &stats, 0);
                    return Ok(());
                }
            },
            None => tokio::select! {
                cmd = cmd_rx.recv() => cmd,
                _ = shutdown.changed() => {
                    deadline = Some(begin_flush(&mut cmd_rx, grace));
                    continue;
                }
            },
        };
        let Some(cmd) = cmd else {
            tracing::debug!("Command queue drained, stopping send loop");
            break;
        };

        let line = cmd.render();
        match &cmd {
            Command::Raw(raw) if raw.starts_with("PASS ") => tracing::debug!("-> PASS ***"),
            _ => tracing::debug!("-> {cmd}"),
        }

        let mut write = std::pin::pin!(write_line(&mut writer, &line));
        let written = loop {
            match deadline {
                Some(at) => break timeout_at(at, &mut write).await.ok(),
                None => tokio::select! {
                    result = &mut write => break Some(result),
                    _ = shutdown.changed() => deadline = Some(begin_flush(&mut cmd_rx, grace)),
                },
            }
        };
        match written {
            Some(Ok(())) => {
                stats.commands_written.fetch_add(1, Ordering::Relaxed);
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Write failed, stopping send loop");
                return Err(e.into());
            }
            None => {
                abandon(&mut cmd_rx, &stats, 1);
                return Ok(());
            }
        }
    }
    let _ = writer.shutdown().await;
    Ok(())
}

/// Refuse new commands and return the deadline for writing the queued ones.
fn begin_flush(cmd_rx: &mut mpsc::Receiver<Command>, grace: Duration) -> Instant {
    tracing::debug!("Send loop stopping, flushing queued commands");
    cmd_rx.close();
    Instant::now() + grace
}

fn abandon(cmd_rx: &mut mpsc::Receiver<Command>, stats: &SessionStats, in_flight: u64) {
    let mut dropped = in_flight;
    while cmd_rx.try_recv().is_ok() {
        dropped += 1;
    }
    stats.commands_dropped.fetch_add(dropped, Ordering::Relaxed);
    tracing::warn!(dropped, "Peer stopped reading, dropping unwritten commands");
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
