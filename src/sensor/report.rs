//! The node state machine driving periodic reports.
//!
//! ```text
//!            StateChange(Router | EndDevice)
//!   ┌──────┐ ───────────────────────────────▶ ┌───────┐ ──┐ ReportTimer:
//!   │ Idle │                                  │ Armed │   │ report, then
//!   └──────┘ ◀─────────────────────────────── └───────┘ ◀─┘ rearm with jitter
//!            StateChange(anything else)
//! ```
//!
//! Reports are best-effort telemetry. A reading that cannot be taken or
//! sent is dropped and counted; the next tick simply tries again with a
//! fresh reading.

use super::dispatch::{
    self, Dispatch, DisplayLine, IncomingMessage, MessageKind, format_local_line,
    format_terminal_line, parse_reading,
};
use super::error::Error;
use super::frame::{self, FUN_CODE_UPLOAD_DATA};
use super::{
    APP_DESCRIPTOR, ClusterId, DeviceState, MAX_JITTER_MS, NodeConfig, P2P_DST, Platform, Role,
    SensorReading,
};
use crate::transport;
use rand_core::RngCore;

/// Display line a reporting node shows its own reading on.
pub const LOCAL_DISPLAY_LINE: DisplayLine = DisplayLine::Line3;

/// Line ending appended to every debug echo.
const CRLF: &[u8] = b"\r\n";

/// An event delivered to the node by the network stack or the timer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// The network stack reported a new device state.
    StateChange(DeviceState),
    /// The report timer fired.
    ReportTimer,
    /// An application message arrived over the air.
    Incoming(IncomingMessage<'a>),
}

/// Whether the report timer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not on a network, nothing scheduled.
    Idle,
    /// On a network with the report timer running.
    Armed,
}

/// Counters of what the node has done since start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStats {
    /// Readings handed to the radio or the serial port.
    pub reports_sent: u32,
    /// Reports dropped because the sensor could not be read.
    pub sensor_failures: u32,
    /// Reports or relays dropped because the transport refused them.
    pub send_failures: u32,
    /// Received readings shown on the display.
    pub readings_displayed: u32,
    /// Received readings relayed as serial frames.
    pub readings_forwarded: u32,
    /// Inbound messages rejected as malformed.
    pub rejected_messages: u32,
}

/// A sensor network node.
///
/// Owns the platform it runs on and the jitter source used when
/// rescheduling reports.
///
/// # Examples
///
/// ```rust,ignore
/// let mut node = Node::new(board, rng, NodeConfig::default());
/// node.init()?;
///
/// node.process_event(Event::StateChange(DeviceState::EndDevice))?;
/// // ... later, when the timer service fires:
/// node.process_event(Event::ReportTimer)?;
/// ```
#[derive(Debug)]
pub struct Node<P: Platform, R: RngCore> {
    state: State,
    device_state: DeviceState,
    config: NodeConfig,
    stats: NodeStats,
    platform: P,
    rng: R,
}

impl<P: Platform, R: RngCore> Node<P, R> {
    /// Creates a new idle node.
    pub fn new(platform: P, rng: R, config: NodeConfig) -> Self {
        Self {
            state: State::Idle,
            device_state: DeviceState::Init,
            config,
            stats: NodeStats::default(),
            platform,
            rng,
        }
    }

    /// Register the application endpoint with the network stack.
    pub fn init(&mut self) -> Result<(), P::Error> {
        self.platform.register_endpoint(&APP_DESCRIPTOR)?;
        info!("endpoint {=u8} registered", APP_DESCRIPTOR.endpoint);
        Ok(())
    }

    /// Returns whether the report timer is running.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the last device state reported by the network stack.
    pub fn device_state(&self) -> DeviceState {
        self.device_state
    }

    /// Returns the node configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Returns the node counters.
    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Returns the platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the platform mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Processes one event.
    ///
    /// Send and sensor failures are counted and dropped here. Only a
    /// malformed inbound message is returned as an error, after being
    /// counted in [`NodeStats::rejected_messages`].
    pub fn process_event(&mut self, event: Event<'_>) -> Result<(), Error> {
        match event {
            Event::StateChange(device_state) => {
                self.on_state_change(device_state);
                Ok(())
            }
            Event::ReportTimer => {
                self.on_report_timer();
                Ok(())
            }
            Event::Incoming(message) => match self.handle_message(&message) {
                Ok(_) => Ok(()),
                Err(Error::SendFailure) => Ok(()),
                Err(e) => {
                    self.stats.rejected_messages += 1;
                    warn!("inbound message rejected: {}", e);
                    Err(e)
                }
            },
        }
    }

    fn on_state_change(&mut self, device_state: DeviceState) {
        self.device_state = device_state;

        if device_state.is_joined_reporter() && self.config.role != Role::Coordinator {
            self.platform.start_timer(self.config.report_period_ms);
            if self.state == State::Idle {
                info!("joined network, reporting armed");
            }
            self.state = State::Armed;
        } else if self.state == State::Armed {
            self.platform.stop_timer();
            self.state = State::Idle;
            info!("left network, reporting stopped");
        }
    }

    fn on_report_timer(&mut self) {
        if self.state != State::Armed {
            debug!("stale report timer ignored");
            return;
        }

        match self.report() {
            Ok(_) => self.stats.reports_sent += 1,
            Err(Error::SensorFailure) => self.stats.sensor_failures += 1,
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("report dropped: {}", e);
            }
        }

        let next = self.next_interval();
        self.platform.start_timer(next);
    }

    /// Take one reading, show it locally and hand it to the transport.
    ///
    /// # Errors
    ///
    /// * [`Error::SensorFailure`] - the sensor could not be read
    /// * [`Error::SendFailure`] - the radio or serial port refused the reading
    pub fn report(&mut self) -> Result<SensorReading, Error> {
        let climate = self.platform.read_sensor().map_err(|_| {
            warn!("sensor read failed");
            Error::SensorFailure
        })?;

        let reading = SensorReading {
            terminal_id: self.config.terminal_id,
            temperature: climate.temperature,
            humidity: climate.humidity,
        };

        let line = format_local_line(&reading)?;
        self.platform.display(LOCAL_DISPLAY_LINE, &line);
        self.echo(&line);

        match self.config.role {
            Role::EndDevice => {
                self.platform
                    .data_request(&P2P_DST, ClusterId::PeerToPeer, &reading.to_bytes())
                    .map_err(|_| Error::SendFailure)?;
            }
            Role::Gateway => {
                frame::send_frame(
                    self.platform.serial(),
                    FUN_CODE_UPLOAD_DATA,
                    &reading.to_bytes(),
                )?;
            }
            Role::Coordinator => {}
        }

        Ok(reading)
    }

    /// Delay until the next report: the base period plus 0..=255 ms jitter.
    pub fn next_interval(&mut self) -> u32 {
        let jitter = self.rng.next_u32() & MAX_JITTER_MS;
        self.config.report_period_ms.saturating_add(jitter)
    }

    /// Route one inbound application message.
    ///
    /// # Errors
    ///
    /// * [`Error::FormatError`] - a reading shorter than three bytes
    /// * [`Error::SendFailure`] - a gateway could not write the relay frame
    pub fn handle_message(&mut self, message: &IncomingMessage<'_>) -> Result<Dispatch, Error> {
        match MessageKind::classify(message.cluster_id) {
            MessageKind::PeerToPeerReading => match self.config.role {
                Role::Coordinator => self.display_reading(message.payload),
                Role::Gateway => self.forward_reading(message.payload),
                Role::EndDevice => Ok(Dispatch::Ignored),
            },
            MessageKind::PeriodicAnnouncement | MessageKind::Unknown => Ok(Dispatch::Ignored),
        }
    }

    fn display_reading(&mut self, payload: &[u8]) -> Result<Dispatch, Error> {
        let reading = parse_reading(payload)?;

        let Some(slot) = DisplayLine::for_terminal(reading.terminal_id) else {
            debug!("no display slot for terminal {=u8}", reading.terminal_id);
            return Ok(Dispatch::Ignored);
        };

        let line = format_terminal_line(&reading)?;
        self.platform.display(slot, &line);
        self.echo(&line);
        self.stats.readings_displayed += 1;

        Ok(Dispatch::Displayed(slot))
    }

    fn forward_reading(&mut self, payload: &[u8]) -> Result<Dispatch, Error> {
        let reading = parse_reading(payload)?;

        if let Err(e) = frame::send_frame(
            self.platform.serial(),
            FUN_CODE_UPLOAD_DATA,
            &reading.to_bytes(),
        ) {
            self.stats.send_failures += 1;
            warn!("relay of terminal {=u8} failed: {}", reading.terminal_id, e);
            return Err(e);
        }
        self.stats.readings_forwarded += 1;

        Ok(Dispatch::Forwarded)
    }

    fn echo(&mut self, line: &dispatch::Line) {
        let serial = self.platform.serial();
        let echoed = transport::write_all(serial, line.as_bytes(), || Error::SendFailure)
            .and_then(|_| transport::write_all(serial, CRLF, || Error::SendFailure));
        if echoed.is_err() {
            warn!("debug echo failed");
        }
    }
}
