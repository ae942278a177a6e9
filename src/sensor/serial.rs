//! UART receive staging buffer.
//!
//! The UART driver signals receive events from interrupt context; the
//! application then moves pending bytes into a bounded staging buffer for
//! over-the-air transmission. There is no backpressure: only as many bytes
//! as fit in the remaining headroom are pulled from the UART, the rest stay
//! in the driver's FIFO.

use crate::transport::Read;
use heapless::Vec;

/// Maximum byte count staged for a single over-the-air message.
pub const TX_MAX: usize = 80;

/// UART event flags as reported by the driver callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UartEvents(pub u8);

impl UartEvents {
    /// Receive FIFO is full.
    pub const RX_FULL: Self = Self(0x01);
    /// Receive FIFO is above its threshold.
    pub const RX_ABOUT_FULL: Self = Self(0x02);
    /// Receive line went idle after at least one byte.
    pub const RX_TIMEOUT: Self = Self(0x04);
    /// Transmit FIFO is full.
    pub const TX_FULL: Self = Self(0x08);
    /// Transmit FIFO drained.
    pub const TX_EMPTY: Self = Self(0x10);

    /// Whether any flag of `other` is set.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether this event should pull received bytes.
    pub fn has_rx_data(self) -> bool {
        self.intersects(Self::RX_FULL | Self::RX_ABOUT_FULL | Self::RX_TIMEOUT)
    }
}

impl core::ops::BitOr for UartEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Baud rates supported by the UART driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    /// 9600 baud
    B9600,
    /// 19200 baud
    B19200,
    /// 38400 baud
    B38400,
    /// 57600 baud
    B57600,
    /// 115200 baud
    B115200,
}

/// Serial port configuration handed to the UART driver at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// UART port number.
    pub port: u8,
    /// Line speed.
    pub baud_rate: BaudRate,
    /// Invoke the receive callback once free space drops below this.
    pub rx_threshold: u8,
    /// Receive buffer size.
    pub rx_size: u8,
    /// Transmit buffer size.
    pub tx_size: u8,
    /// Idle time in milliseconds after a byte before the callback fires.
    pub idle_timeout_ms: u8,
    /// Bytes staged for one over-the-air message, at most [`TX_MAX`].
    pub tx_max: usize,
    /// Keep appending received bytes while earlier ones are still staged.
    pub loopback: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            port: 0,
            baud_rate: BaudRate::B115200,
            rx_threshold: 64,
            rx_size: 128,
            tx_size: 128,
            idle_timeout_ms: 6,
            tx_max: TX_MAX,
            loopback: false,
        }
    }
}

/// Bytes received from the UART and waiting to be sent on.
#[derive(Debug)]
pub struct TxStage {
    buf: Vec<u8, TX_MAX>,
    limit: usize,
    loopback: bool,
}

impl Default for TxStage {
    fn default() -> Self {
        Self::new(&UartConfig::default())
    }
}

impl TxStage {
    /// Creates an empty stage for the given UART configuration.
    ///
    /// `tx_max` is clamped to [`TX_MAX`].
    pub fn new(config: &UartConfig) -> Self {
        Self {
            buf: Vec::new(),
            limit: config.tx_max.min(TX_MAX),
            loopback: config.loopback,
        }
    }

    /// Handle a UART callback, pulling received bytes into the stage.
    ///
    /// Without loopback, bytes are only pulled into an empty stage. With
    /// loopback, they are appended as long as there is headroom. Returns the
    /// number of bytes pulled.
    pub fn on_uart_event<U: Read + ?Sized>(
        &mut self,
        events: UartEvents,
        uart: &mut U,
    ) -> Result<usize, U::Error> {
        if !events.has_rx_data() {
            return Ok(0);
        }
        let accepting = if self.loopback {
            self.buf.len() < self.limit
        } else {
            self.buf.is_empty()
        };
        if !accepting {
            return Ok(0);
        }

        let start = self.buf.len();
        let headroom = self.limit - start;
        // `limit` never exceeds the capacity.
        let _ = self.buf.resize_default(self.limit);
        let read = match uart.read(&mut self.buf[start..start + headroom]) {
            Ok(n) => n.min(headroom),
            Err(e) => {
                self.buf.truncate(start);
                return Err(e);
            }
        };
        self.buf.truncate(start + read);

        Ok(read)
    }

    /// Staged bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of staged bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Most bytes the stage holds.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remove and return everything staged.
    pub fn take(&mut self) -> Vec<u8, TX_MAX> {
        core::mem::take(&mut self.buf)
    }
}
