//! Inbound message classification and routing.
//!
//! Wireless application messages carry no schema: the cluster id says what
//! they are, and readings are laid out positionally as
//! `[terminal id, temperature, humidity]`. Parsing stays positional so it
//! remains wire compatible with deployed terminals, but a payload has to be
//! at least three bytes long before any field is read.

use super::error::Error;
use super::{ClusterId, SensorReading};
use core::fmt::Write as _;
use heapless::String;

/// Minimum payload length of a peer-to-peer reading.
pub const READING_LEN: usize = 3;

/// Capacity of a rendered display/serial line.
pub const LINE_CAPACITY: usize = 20;

/// A rendered display/serial line.
pub type Line = String<LINE_CAPACITY>;

/// Category of an inbound application message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A terminal's sensor reading sent point-to-point.
    PeerToPeerReading,
    /// A periodic broadcast announcement.
    PeriodicAnnouncement,
    /// Anything else.
    Unknown,
}

impl MessageKind {
    /// Classify a message by its cluster id.
    pub fn classify(cluster_id: u16) -> Self {
        match cluster_id {
            id if id == ClusterId::PeerToPeer as u16 => MessageKind::PeerToPeerReading,
            id if id == ClusterId::Periodic as u16 => MessageKind::PeriodicAnnouncement,
            _ => MessageKind::Unknown,
        }
    }
}

/// A line on the local character display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLine {
    /// First line.
    Line1,
    /// Second line.
    Line2,
    /// Third line.
    Line3,
    /// Fourth line.
    Line4,
}

impl DisplayLine {
    /// Display slot reserved for a terminal, if it has one.
    ///
    /// Terminals 1, 2 and 3 map to lines 2, 3 and 4. There is no fallback
    /// slot for other ids.
    pub fn for_terminal(terminal_id: u8) -> Option<Self> {
        match terminal_id {
            1 => Some(DisplayLine::Line2),
            2 => Some(DisplayLine::Line3),
            3 => Some(DisplayLine::Line4),
            _ => None,
        }
    }
}

/// An application message delivered by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingMessage<'a> {
    /// Cluster the message was sent on.
    pub cluster_id: u16,
    /// Short address of the sender.
    pub source: u16,
    /// Raw payload.
    pub payload: &'a [u8],
}

/// What inbound handling did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The reading was shown on a display line and echoed to serial.
    Displayed(DisplayLine),
    /// The reading was framed and written to the serial port.
    Forwarded,
    /// Nothing was done.
    Ignored,
}

/// Extract a reading from a peer-to-peer payload.
///
/// Bytes past the third are ignored.
///
/// # Errors
///
/// * [`Error::FormatError`] - payload shorter than [`READING_LEN`]
pub fn parse_reading(payload: &[u8]) -> Result<SensorReading, Error> {
    match payload {
        [terminal_id, temperature, humidity, ..] => Ok(SensorReading {
            terminal_id: *terminal_id,
            temperature: *temperature,
            humidity: *humidity,
        }),
        _ => Err(Error::FormatError),
    }
}

/// Render a received reading as `"<id> T&H:<t> <h>"`.
pub fn format_terminal_line(reading: &SensorReading) -> Result<Line, Error> {
    let mut line = Line::new();
    write!(
        line,
        "{} T&H:{} {}",
        reading.terminal_id, reading.temperature, reading.humidity
    )
    .map_err(|_| Error::BufferOverflow)?;
    Ok(line)
}

/// Render a locally taken reading as `"T&H:<t> <h>"`.
pub fn format_local_line(reading: &SensorReading) -> Result<Line, Error> {
    let mut line = Line::new();
    write!(line, "T&H:{} {}", reading.temperature, reading.humidity)
        .map_err(|_| Error::BufferOverflow)?;
    Ok(line)
}
