//! Periodic sensor report pipeline.
//!
//! A wireless sensor network node built on top of a vendor network stack.
//! Depending on its [`Role`] a node either:
//!
//! - **reports**: on every timer tick polls a temperature/humidity sensor,
//!   shows the values locally and unicasts them to the coordinator
//!   ([`Role::EndDevice`]), or frames them onto a serial port
//!   ([`Role::Gateway`]);
//! - **aggregates**: receives readings from up to three terminals and shows
//!   each on its own display line ([`Role::Coordinator`]).
//!
//! ```text
//!  timer ──▶ sensor ──▶ frame / payload ──▶ radio or serial
//!                                              │
//!  radio ──▶ dispatch(cluster) ──▶ display slot + serial echo
//! ```
//!
//! The network stack, the timer service, the display, the serial port and
//! the sensor driver are all reached through the [`Platform`] trait. The
//! node itself keeps no global state: everything lives in
//! [`report::Node`], which the application owns and feeds events into.

#![deny(unsafe_code)]

use serde::Deserialize;

/// Error types for the sensor pipeline
pub mod error;

/// Serial frame codec
pub mod frame;

/// Inbound message classification and routing
pub mod dispatch;

/// The node state machine driving periodic reports
pub mod report;

/// UART receive staging buffer
pub mod serial;

pub use dispatch::{DisplayLine, MessageKind};
pub use error::Error;
pub use report::{Event, Node, NodeStats};

/// Application endpoint the sample profile lives on.
pub const APP_ENDPOINT: u8 = 20;

/// Application profile identifier.
pub const APP_PROFILE_ID: u16 = 0x0F08;

/// Application device identifier.
pub const APP_DEVICE_ID: u16 = 0x0001;

/// Group used by the flash command.
pub const FLASH_GROUP: u16 = 0x0001;

/// Short address of the network coordinator.
pub const COORDINATOR_ADDR: u16 = 0x0000;

/// Short address meaning "every device".
pub const BROADCAST_ADDR: u16 = 0xFFFF;

/// Base reporting period in milliseconds.
pub const DEFAULT_REPORT_PERIOD_MS: u32 = 5000;

/// Upper bound of the random jitter added to every reschedule.
pub const MAX_JITTER_MS: u32 = 0xFF;

/// One temperature/humidity sample from a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// Identifier of the terminal that took the reading.
    pub terminal_id: u8,
    /// Temperature in whole degrees.
    pub temperature: u8,
    /// Relative humidity in whole percent.
    pub humidity: u8,
}

impl SensorReading {
    /// Positional wire form used on the wireless path: `[id, t, h]`.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.terminal_id, self.temperature, self.humidity]
    }
}

/// A raw sample as returned by the sensor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Climate {
    /// Temperature in whole degrees.
    pub temperature: u8,
    /// Relative humidity in whole percent.
    pub humidity: u8,
}

/// How a [`NetworkAddress`] is interpreted by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Delivered to every device.
    Broadcast,
    /// Delivered to every member of a group.
    Group,
    /// Delivered to a single 16-bit short address.
    Unicast,
}

/// Destination descriptor for a wireless data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress {
    /// Addressing mode.
    pub mode: AddrMode,
    /// Destination endpoint.
    pub endpoint: u8,
    /// Short address or group id, depending on `mode`.
    pub address: u16,
}

/// Periodic broadcast to every device.
pub const PERIODIC_DST: NetworkAddress = NetworkAddress {
    mode: AddrMode::Broadcast,
    endpoint: APP_ENDPOINT,
    address: BROADCAST_ADDR,
};

/// Group destination of the flash command.
pub const FLASH_DST: NetworkAddress = NetworkAddress {
    mode: AddrMode::Group,
    endpoint: APP_ENDPOINT,
    address: FLASH_GROUP,
};

/// Unicast destination towards the coordinator.
pub const P2P_DST: NetworkAddress = NetworkAddress {
    mode: AddrMode::Unicast,
    endpoint: APP_ENDPOINT,
    address: COORDINATOR_ADDR,
};

/// Application cluster identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ClusterId {
    /// Periodic announcement.
    Periodic = 1,
    /// Flash command.
    Flash = 2,
    /// Point-to-point sensor reading.
    PeerToPeer = 3,
}

/// Device state as reported by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Initialized, not started automatically.
    Hold,
    /// Initialized, not connected to anything.
    Init,
    /// Discovering networks to join.
    NwkDisc,
    /// Joining a network.
    NwkJoining,
    /// Rejoining a network after losing it.
    NwkRejoin,
    /// Joined but not yet authenticated.
    EndDeviceUnauth,
    /// Started as an end device.
    EndDevice,
    /// Started as a router.
    Router,
    /// Starting as the coordinator.
    CoordStarting,
    /// Started as the coordinator.
    Coordinator,
    /// Lost its parent.
    NwkOrphan,
}

impl DeviceState {
    /// Whether this state means the device has joined and should report.
    ///
    /// The coordinator does not report its own readings.
    pub fn is_joined_reporter(self) -> bool {
        matches!(self, DeviceState::Router | DeviceState::EndDevice)
    }
}

/// What a node does with readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Aggregates readings from terminals onto its display.
    Coordinator,
    /// Reports its own readings to the coordinator over the air.
    EndDevice,
    /// Reports its own readings, and relays received ones, as serial frames.
    Gateway,
}

/// Endpoint description registered with the network stack at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleDescriptor {
    /// Endpoint number.
    pub endpoint: u8,
    /// Application profile id.
    pub profile_id: u16,
    /// Application device id.
    pub device_id: u16,
    /// Application device version.
    pub device_version: u8,
    /// Application flags.
    pub flags: u8,
    /// Input clusters.
    pub in_clusters: &'static [ClusterId],
    /// Output clusters.
    pub out_clusters: &'static [ClusterId],
}

const APP_CLUSTERS: [ClusterId; 2] = [ClusterId::PeerToPeer, ClusterId::Periodic];

/// The descriptor for the sample application endpoint.
pub const APP_DESCRIPTOR: SimpleDescriptor = SimpleDescriptor {
    endpoint: APP_ENDPOINT,
    profile_id: APP_PROFILE_ID,
    device_id: APP_DEVICE_ID,
    device_version: 0,
    flags: 0,
    in_clusters: &APP_CLUSTERS,
    out_clusters: &APP_CLUSTERS,
};

/// Node configuration.
///
/// # Examples
///
/// ```rust
/// use sensorlink::sensor::{NodeConfig, Role};
///
/// let config = NodeConfig::from_json(r#"{"role":"gateway","terminal_id":2}"#).unwrap();
/// assert_eq!(config.role, Role::Gateway);
/// assert_eq!(config.terminal_id, 2);
/// assert_eq!(config.report_period_ms, 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// What this node does with readings.
    pub role: Role,
    /// Identifier stamped on this node's own readings.
    pub terminal_id: u8,
    /// Base reporting period in milliseconds.
    pub report_period_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: Role::EndDevice,
            terminal_id: 1,
            report_period_ms: DEFAULT_REPORT_PERIOD_MS,
        }
    }
}

impl NodeConfig {
    /// Parse a configuration from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json_core::from_str(json)
            .map(|(config, _)| config)
            .map_err(|_| Error::FormatError)
    }
}

/// Services a node needs from the board and the network stack.
///
/// Implemented by the application on top of the vendor stack; tests use an
/// in-memory mock.
pub trait Platform {
    /// Error type of the underlying services.
    type Error: core::fmt::Debug;
    /// The debug/frame serial port.
    type Serial: crate::transport::Write;

    /// Register the application endpoint with the network stack.
    fn register_endpoint(&mut self, descriptor: &SimpleDescriptor) -> Result<(), Self::Error>;

    /// Poll the temperature/humidity sensor.
    fn read_sensor(&mut self) -> Result<Climate, Self::Error>;

    /// Write a line of text to the local display.
    fn display(&mut self, line: DisplayLine, text: &str);

    /// The serial port used for debug echo and frames.
    fn serial(&mut self) -> &mut Self::Serial;

    /// Send an application payload over the air.
    fn data_request(
        &mut self,
        destination: &NetworkAddress,
        cluster: ClusterId,
        payload: &[u8],
    ) -> Result<(), Self::Error>;

    /// Arm the report timer to fire once after `timeout_ms`.
    fn start_timer(&mut self, timeout_ms: u32);

    /// Cancel a pending report timer, if any.
    fn stop_timer(&mut self);
}
