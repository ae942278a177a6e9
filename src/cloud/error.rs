//! Error types for the cloud property report loop

/// An error raised by the cloud property report loop.
///
/// Session establishment failures end the run; everything else is local to
/// one post or one callback.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The session driver could not create the device session.
    SessionOpenFailure,
    /// The session driver could not connect the device session.
    SessionConnectFailure,
    /// A report was refused by the session driver.
    ReportFailure,
    /// A cloud payload could not be parsed.
    FormatError,
    /// A value did not fit its fixed-size buffer.
    BufferOverflow,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::SessionOpenFailure => defmt::write!(f, "SessionOpenFailure"),
            Error::SessionConnectFailure => defmt::write!(f, "SessionConnectFailure"),
            Error::ReportFailure => defmt::write!(f, "ReportFailure"),
            Error::FormatError => defmt::write!(f, "FormatError"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
        }
    }
}
