//! Byte-stream transport traits.
//!
//! The serial port that carries frames and debug text, and the UART that
//! feeds the transmit staging buffer, are external collaborators. This
//! module describes the small surface the pipelines need from them. Both a
//! blocking sink and (behind the `async` feature) an async one are provided.

#![allow(async_fn_in_trait)]
#![deny(unsafe_code)]

/// Re-exports of common traits
pub mod prelude {
    #[cfg(feature = "async")]
    pub use super::AsyncWrite;
    pub use super::{Read, Write};
}

/// A byte source, typically a UART receive FIFO.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read up to `buf.len()` bytes, returning how many were copied.
    ///
    /// Returning `Ok(0)` means nothing is pending right now.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// A byte sink, typically a UART transmit path.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the port
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Async byte sink.
#[cfg(feature = "async")]
pub trait AsyncWrite {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the port asynchronously
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer asynchronously
    async fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Write the whole of `buf`, looping over short writes.
///
/// A writer that accepts zero bytes while data remains is treated as
/// stalled. Either failure is reported as `on_error()`.
pub fn write_all<W: Write + ?Sized, E>(
    writer: &mut W,
    mut buf: &[u8],
    on_error: impl Fn() -> E,
) -> Result<(), E> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => return Err(on_error()),
            Ok(n) => buf = &buf[n.min(buf.len())..],
            Err(_) => return Err(on_error()),
        }
    }
    Ok(())
}

#[cfg(feature = "async")]
/// Async counterpart of [`write_all`].
pub async fn write_all_async<W: AsyncWrite + ?Sized, E>(
    writer: &mut W,
    mut buf: &[u8],
    on_error: impl Fn() -> E,
) -> Result<(), E> {
    while !buf.is_empty() {
        match writer.write(buf).await {
            Ok(0) => return Err(on_error()),
            Ok(n) => buf = &buf[n.min(buf.len())..],
            Err(_) => return Err(on_error()),
        }
    }
    Ok(())
}
