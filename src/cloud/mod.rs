//! Cloud property report loop.
//!
//! A device opens a single session with an IoT cloud platform, registers a
//! table of event callbacks, and then runs a cooperative loop: it yields to
//! the session driver for a bounded time, and once per elapsed second checks
//! whether it is time to post its properties.
//!
//! The session driver (connection management, TLS, MQTT framing, reconnects)
//! is an external collaborator reached through the [`Session`] trait. This
//! module only keeps track of connectivity through the callbacks; it does
//! no recovery of its own.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sensorlink::cloud::{CloudApp, DeviceMeta, LoopConfig, SessionConfig};
//!
//! let session_config = SessionConfig {
//!     mqtt_domain: "iot-as-mqtt.cn-shanghai.aliyuncs.com",
//!     endpoint: None,
//!     event_reply: true,
//!     meta: DeviceMeta {
//!         product_key: "a1b2c3",
//!         device_name: "sensor-01",
//!         device_secret: "secret",
//!     },
//! };
//!
//! let mut app = CloudApp::new(session, clock, session_config, LoopConfig::default());
//! let summary = app.run()?;
//! ```

#![deny(unsafe_code)]

/// Error types for the cloud loop
pub mod error;

/// Event kinds, the callback registry and the default handlers
pub mod callbacks;

/// Application context and the property payload
pub mod property;

/// The loop driver
pub mod app;

pub use app::{CloudApp, LoopSummary};
pub use callbacks::{CallbackRegistry, Event, EventKind, Handler, HandlerResult};
pub use error::Error;
pub use property::AppContext;

/// Bounded time handed to the session driver on every loop iteration.
pub const DEFAULT_YIELD_TIMEOUT_MS: u32 = 200;

/// Seconds between two property posts.
pub const DEFAULT_POST_PERIOD_S: u64 = 5;

/// Demo time box after which the loop returns.
pub const SAMPLE_EXECUTION_TIME_S: u64 = 60 * 20;

/// Value of an endpoint setting that means "use the driver default".
pub const ENDPOINT_UNSET: &str = "NULL";

/// Kind of an upstream report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Post of one or more property values.
    PostProperty,
    /// Post of an event.
    PostEvent,
}

/// Credentials identifying the device to the cloud platform.
#[derive(Debug, Clone, Copy)]
pub struct DeviceMeta<'a> {
    /// Product the device belongs to.
    pub product_key: &'a str,
    /// Name of the device within the product.
    pub device_name: &'a str,
    /// Per-device secret.
    pub device_secret: &'a str,
}

/// Session driver settings applied before the session is opened.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig<'a> {
    /// MQTT domain of the region the device lives in.
    pub mqtt_domain: &'a str,
    /// Custom endpoint; `None` or `"NULL"` keeps the driver default.
    pub endpoint: Option<&'a str>,
    /// Ask the cloud to acknowledge event posts.
    pub event_reply: bool,
    /// Device credentials.
    pub meta: DeviceMeta<'a>,
}

impl SessionConfig<'_> {
    /// The custom endpoint to configure, if any.
    pub fn custom_endpoint(&self) -> Option<&str> {
        self.endpoint.filter(|endpoint| *endpoint != ENDPOINT_UNSET)
    }
}

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Bounded time handed to the session driver per iteration.
    pub yield_timeout_ms: u32,
    /// Seconds between two property posts.
    pub post_period_s: u64,
    /// Return once this many seconds have passed; `None` runs forever.
    pub execution_time_s: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            yield_timeout_ms: DEFAULT_YIELD_TIMEOUT_MS,
            post_period_s: DEFAULT_POST_PERIOD_S,
            execution_time_s: Some(SAMPLE_EXECUTION_TIME_S),
        }
    }
}

/// Receiver of the events the session driver raises while it runs.
///
/// The driver calls this synchronously from inside [`Session::yield_for`].
pub trait EventSink {
    /// Handle one event, optionally producing a response for the cloud.
    fn on_event(&mut self, event: &Event<'_>) -> HandlerResult;
}

/// The cloud SDK's device session driver.
pub trait Session {
    /// Error type of the driver.
    type Error: core::fmt::Debug;

    /// Set the MQTT domain of the device's region.
    fn set_mqtt_domain(&mut self, domain: &str) -> Result<(), Self::Error>;

    /// Override the connection endpoint.
    fn set_endpoint(&mut self, endpoint: &str) -> Result<(), Self::Error>;

    /// Choose whether event posts are acknowledged.
    fn set_event_reply(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Create the device session, returning its device id.
    fn open(&mut self, meta: &DeviceMeta<'_>) -> Result<i32, Self::Error>;

    /// Connect the session to the cloud.
    fn connect(&mut self, device_id: i32) -> Result<(), Self::Error>;

    /// Let the driver run for up to `timeout_ms`, delivering events to `sink`.
    fn yield_for(&mut self, timeout_ms: u32, sink: &mut dyn EventSink);

    /// Send a report upstream, returning its message id.
    fn report(
        &mut self,
        device_id: i32,
        kind: MessageType,
        payload: &[u8],
    ) -> Result<i32, Self::Error>;

    /// Tear the session down.
    fn close(&mut self, device_id: i32) -> Result<(), Self::Error>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point.
    fn uptime_ms(&mut self) -> u64;
}
