//! Error types for the sensor report pipeline

/// An error raised while reading, framing, dispatching or sending a reading.
///
/// Every variant is local to one tick or one inbound message. Nothing here
/// stops the node; the caller logs the failure and waits for the next event.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The wireless data request or the serial write was rejected.
    SendFailure,
    /// A payload or frame was too short or malformed.
    FormatError,
    /// A payload exceeded the fixed frame capacity.
    BufferOverflow,
    /// A decoded frame carried a checksum that does not match its contents.
    ChecksumMismatch,
    /// The sensor driver could not produce a reading.
    SensorFailure,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::SendFailure => defmt::write!(f, "SendFailure"),
            Error::FormatError => defmt::write!(f, "FormatError"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::ChecksumMismatch => defmt::write!(f, "ChecksumMismatch"),
            Error::SensorFailure => defmt::write!(f, "SensorFailure"),
        }
    }
}
