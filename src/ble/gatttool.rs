//! Transport driving BlueZ's `gatttool` in interactive mode.
//!
//! The tool speaks a line oriented text protocol. Commands go to stdin:
//!
//! - `connect <address>`
//! - `char-read-hnd 0x<handle>` / `char-read-uuid <uuid>`
//! - `char-write-req 0x<handle> <hex>`
//! - `disconnect`, `exit`
//!
//! and acknowledgments, values and notifications come back on stdout with
//! payload bytes printed as space separated hex pairs. A reader task parses
//! stdout into [`GattToolEvent`]s; notifications that arrive while a command
//! is waiting for its acknowledgment are queued and handed out in order.

use std::collections::VecDeque;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::ble::address::DeviceAddress;
use crate::ble::handles::CharacteristicHandle;
use crate::ble::transport::{Notification, Transport};
use crate::error::TransportError;
use crate::protocol::RawPayload;

/// A recognised line of gatttool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattToolEvent {
    /// `Connection successful`.
    Connected,
    /// Value reported by `char-read-hnd` or `char-read-uuid`.
    Value(RawPayload),
    /// `Characteristic value was written successfully`.
    Written,
    /// `Notification handle = 0x.... value: ..` (or an indication).
    Notification {
        /// Attribute handle of the notifying characteristic.
        handle: u16,
        /// The notification data.
        payload: RawPayload,
    },
    /// `Error: ...`, or a recognised line whose payload did not parse.
    Error(String),
}

const CONNECTED_MARKER: &str = "Connection successful";
const WRITTEN_MARKER: &str = "Characteristic value was written successfully";
const VALUE_MARKER: &str = "Characteristic value/descriptor:";
const UUID_VALUE_MARKER: &str = "handle:";
const NOTIFICATION_MARKERS: [&str; 2] = ["Notification handle =", "Indication   handle ="];
const ERROR_MARKER: &str = "Error:";

/// Parse one line of gatttool output.
///
/// Prompts, ANSI colour codes and unrecognised lines are ignored.
pub fn parse_line(line: &str) -> Option<GattToolEvent> {
    let line = strip_ansi(line);
    let line = line.trim();

    if let Some(position) = line.find(ERROR_MARKER) {
        return Some(GattToolEvent::Error(
            line[position + ERROR_MARKER.len()..].trim().to_string(),
        ));
    }

    if line.contains(CONNECTED_MARKER) {
        return Some(GattToolEvent::Connected);
    }

    if line.contains(WRITTEN_MARKER) {
        return Some(GattToolEvent::Written);
    }

    if let Some(position) = line.find(VALUE_MARKER) {
        return Some(value_event(line, &line[position + VALUE_MARKER.len()..]));
    }

    for marker in NOTIFICATION_MARKERS {
        if let Some(position) = line.find(marker) {
            return Some(notification_event(line, &line[position + marker.len()..]));
        }
    }

    if let Some(position) = line.find(UUID_VALUE_MARKER) {
        let rest = &line[position..];
        let value = rest.find("value:").map(|v| &rest[v + "value:".len()..])?;
        return Some(value_event(line, value));
    }

    None
}

fn value_event(line: &str, hex: &str) -> GattToolEvent {
    match RawPayload::from_hex_str(hex) {
        Ok(payload) => GattToolEvent::Value(payload),
        Err(e) => GattToolEvent::Error(format!("{} in {:?}", e, line)),
    }
}

/// Parse ` 0x000e value: 54 3d ..` following a notification marker.
fn notification_event(line: &str, rest: &str) -> GattToolEvent {
    let malformed = || GattToolEvent::Error(format!("Malformed notification {:?}", line));

    let Some((handle, value)) = rest.split_once("value:") else {
        return malformed();
    };
    let Some(handle) = handle.trim().strip_prefix("0x") else {
        return malformed();
    };
    let Ok(handle) = u16::from_str_radix(handle, 16) else {
        return malformed();
    };

    match RawPayload::from_hex_str(value) {
        Ok(payload) => GattToolEvent::Notification { handle, payload },
        Err(_) => malformed(),
    }
}

/// Remove `ESC [ ... <letter>` sequences.
fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }

    out
}

/// Parse `output` line by line and send every recognised event to `events`.
///
/// Returns when the output ends or the receiver is dropped.
async fn forward_events<R>(output: R, events: mpsc::Sender<GattToolEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = output.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!("gatttool: {}", line);
                if let Some(event) = parse_line(&line) {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read gatttool output: {}", e);
                break;
            }
        }
    }

    debug!("gatttool output closed");
}

/// [`Transport`] backed by a `gatttool -I` child process.
pub struct GattToolTransport<W = ChildStdin> {
    /// Command sink (the child's stdin).
    writer: W,
    /// Parsed stdout lines.
    events: mpsc::Receiver<GattToolEvent>,
    /// Notifications seen while waiting for another response.
    pending: VecDeque<Notification>,
    /// The child process; killed on drop.
    child: Option<Child>,
}

impl GattToolTransport {
    /// Default program name.
    pub const DEFAULT_PROGRAM: &'static str = "gatttool";

    /// Spawn `program -I` (optionally on `adapter`, e.g. `hci0`).
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    pub fn spawn(program: &str, adapter: Option<&str>) -> Result<Self, TransportError> {
        let mut command = Command::new(program);
        command.arg("-I");
        if let Some(adapter) = adapter {
            command.arg("-i").arg(adapter);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(TransportError::Closed)?;
        let stdout = child.stdout.take().ok_or(TransportError::Closed)?;

        debug!("Spawned {} (pid {:?})", program, child.id());

        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(forward_events(BufReader::new(stdout), tx));

        let mut transport = Self::from_parts(stdin, rx);
        transport.child = Some(child);
        Ok(transport)
    }
}

impl<W: AsyncWrite + Unpin + Send> GattToolTransport<W> {
    /// Build a transport from a command sink and an event source.
    pub fn from_parts(writer: W, events: mpsc::Receiver<GattToolEvent>) -> Self {
        Self {
            writer,
            events,
            pending: VecDeque::new(),
            child: None,
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
        debug!("gatttool <- {}", command);
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Wait for the event that acknowledges the last command.
    ///
    /// Notifications are queued; error lines fail the command.
    async fn await_response<F>(&mut self, accept: F) -> Result<GattToolEvent, TransportError>
    where
        F: Fn(&GattToolEvent) -> bool + Send,
    {
        loop {
            match self.events.recv().await {
                None => return Err(TransportError::Closed),
                Some(GattToolEvent::Notification { handle, payload }) => {
                    self.pending.push_back(Notification {
                        handle: Some(handle),
                        uuid: None,
                        payload,
                    });
                }
                Some(GattToolEvent::Error(message)) => {
                    return Err(TransportError::Rejected(message))
                }
                Some(event) if accept(&event) => return Ok(event),
                Some(event) => debug!("Ignoring stray gatttool event: {:?}", event),
            }
        }
    }

    async fn read_value(&mut self, command: &str) -> Result<RawPayload, TransportError> {
        self.send_command(command).await?;
        match self
            .await_response(|e| matches!(e, GattToolEvent::Value(_)))
            .await?
        {
            GattToolEvent::Value(payload) => Ok(payload),
            other => Err(TransportError::Rejected(format!(
                "unexpected response {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Transport for GattToolTransport<W> {
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), TransportError> {
        self.send_command(&format!("connect {}", address)).await?;
        self.await_response(|e| *e == GattToolEvent::Connected)
            .await?;
        Ok(())
    }

    async fn read_characteristic(
        &mut self,
        target: &CharacteristicHandle,
    ) -> Result<RawPayload, TransportError> {
        self.read_value(&format!("char-read-hnd 0x{:04x}", target.handle()))
            .await
    }

    async fn read_by_uuid(&mut self, uuid: Uuid) -> Result<RawPayload, TransportError> {
        self.read_value(&format!("char-read-uuid {}", uuid)).await
    }

    async fn write_characteristic(
        &mut self,
        target: &CharacteristicHandle,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.send_command(&format!(
            "char-write-req 0x{:04x} {}",
            target.handle(),
            hex::encode(data)
        ))
        .await?;
        self.await_response(|e| *e == GattToolEvent::Written)
            .await?;
        Ok(())
    }

    /// Notifications are enabled by the request write itself, so this only logs.
    async fn subscribe(&mut self, target: &CharacteristicHandle) -> Result<(), TransportError> {
        debug!("Listening for notifications from {}", target);
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<Notification> {
        if let Some(notification) = self.pending.pop_front() {
            return Some(notification);
        }

        loop {
            match self.events.recv().await? {
                GattToolEvent::Notification { handle, payload } => {
                    return Some(Notification {
                        handle: Some(handle),
                        uuid: None,
                        payload,
                    })
                }
                event => debug!("Ignoring gatttool event while waiting: {:?}", event),
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.pending.clear();
        self.send_command("disconnect").await?;
        self.send_command("exit").await?;

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                debug!("gatttool already exited: {}", e);
            }
        }

        Ok(())
    }
}
