//! Serial frame codec.
//!
//! Readings leaving a gateway node over its serial port are wrapped in a
//! small checksummed frame:
//!
//! ```text
//! ┌────────┬──────────┬───────────────┬─────────────────┬─────┬─────┐
//! │ length │ checksum │ function code │ payload (0..75) │ '$' │ '@' │
//! └────────┴──────────┴───────────────┴─────────────────┴─────┴─────┘
//!   3 + n    fc + Σp                                      terminator
//! ```
//!
//! The checksum is an 8-bit wrapping sum over the function code and the
//! payload, so it does not depend on byte order. A frame is built fresh for
//! each send and never kept around.
//!
//! # Examples
//!
//! ```rust
//! use sensorlink::sensor::frame;
//!
//! let bytes = frame::encode(0x01, &[10, 20, 30]).unwrap();
//! assert_eq!(&bytes[..], &[0x06, 0x3D, 0x01, 0x0A, 0x14, 0x1E, b'$', b'@']);
//!
//! let decoded = frame::decode(&bytes).unwrap();
//! assert_eq!(decoded.function_code, 0x01);
//! assert_eq!(decoded.payload, &[10, 20, 30]);
//! ```

use super::error::Error;
use crate::transport::{self, Write};
use heapless::Vec;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD_LEN: usize = 75;

/// Bytes a frame adds around its payload: length, checksum, function code
/// and the two terminator bytes.
pub const FRAME_OVERHEAD: usize = 5;

/// Size of the fixed transmit buffer a frame is assembled in.
pub const FRAME_BUFFER_SIZE: usize = 81;

/// Literal bytes closing every frame.
pub const TERMINATOR: [u8; 2] = [b'$', b'@'];

/// Length-field bytes counted in addition to the payload.
const HEADER_LEN: u8 = 3;

/// Function code used for sensor readings relayed upstream.
pub const FUN_CODE_UPLOAD_DATA: u8 = 0x01;

/// An encoded frame, ready to be written to a serial port.
pub type FrameBuf = Vec<u8, FRAME_BUFFER_SIZE>;

/// A frame decoded from a byte slice.
///
/// The payload borrows from the input.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Frame<'a> {
    /// Function code identifying what the payload means.
    pub function_code: u8,
    /// Payload bytes.
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Value of the length byte for this frame.
    pub fn length(&self) -> u8 {
        HEADER_LEN + self.payload.len() as u8
    }

    /// Value of the checksum byte for this frame.
    pub fn checksum(&self) -> u8 {
        checksum(self.function_code, self.payload)
    }
}

/// Additive checksum over the function code and payload, modulo 256.
pub fn checksum(function_code: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(function_code, |acc, byte| acc.wrapping_add(*byte))
}

/// Encode a frame into a fresh fixed-capacity buffer.
///
/// # Errors
///
/// * [`Error::BufferOverflow`] - `payload` is longer than [`MAX_PAYLOAD_LEN`]
pub fn encode(function_code: u8, payload: &[u8]) -> Result<FrameBuf, Error> {
    let mut buf = [0u8; FRAME_BUFFER_SIZE];
    let len = encode_into(function_code, payload, &mut buf)?;
    Vec::from_slice(&buf[..len]).map_err(|_| Error::BufferOverflow)
}

/// Encode a frame into a caller-provided buffer.
///
/// Returns the number of bytes written, always `payload.len() + 5`. Nothing
/// is written when the frame does not fit.
///
/// # Errors
///
/// * [`Error::BufferOverflow`] - `payload` is longer than [`MAX_PAYLOAD_LEN`],
///   or `out` is shorter than the encoded frame
pub fn encode_into(function_code: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::BufferOverflow);
    }
    let total = payload.len() + FRAME_OVERHEAD;
    if out.len() < total {
        return Err(Error::BufferOverflow);
    }

    let end = 3 + payload.len();
    out[0] = HEADER_LEN + payload.len() as u8;
    out[1] = checksum(function_code, payload);
    out[2] = function_code;
    out[3..end].copy_from_slice(payload);
    out[end..total].copy_from_slice(&TERMINATOR);

    Ok(total)
}

/// Decode one complete frame.
///
/// `bytes` must hold exactly one frame; the length byte has to agree with
/// the slice length.
///
/// # Errors
///
/// * [`Error::FormatError`] - too short, inconsistent length byte or missing
///   `$@` terminator
/// * [`Error::ChecksumMismatch`] - checksum byte does not match the contents
pub fn decode(bytes: &[u8]) -> Result<Frame<'_>, Error> {
    if bytes.len() < FRAME_OVERHEAD {
        return Err(Error::FormatError);
    }

    let length = bytes[0] as usize;
    if length < HEADER_LEN as usize || length + 2 != bytes.len() {
        return Err(Error::FormatError);
    }
    if bytes[length..] != TERMINATOR {
        return Err(Error::FormatError);
    }

    let frame = Frame {
        function_code: bytes[2],
        payload: &bytes[3..length],
    };
    if frame.checksum() != bytes[1] {
        return Err(Error::ChecksumMismatch);
    }

    Ok(frame)
}

/// Encode a frame and write it to a serial port, then flush.
///
/// # Errors
///
/// * [`Error::BufferOverflow`] - payload too large, nothing was written
/// * [`Error::SendFailure`] - the port rejected the write or the flush
pub fn send_frame<W: Write + ?Sized>(
    writer: &mut W,
    function_code: u8,
    payload: &[u8],
) -> Result<usize, Error> {
    let frame = encode(function_code, payload)?;
    transport::write_all(writer, &frame, || Error::SendFailure)?;
    writer.flush().map_err(|_| Error::SendFailure)?;
    Ok(frame.len())
}

/// Async counterpart of [`send_frame`].
#[cfg(feature = "async")]
pub async fn send_frame_async<W: transport::AsyncWrite + ?Sized>(
    writer: &mut W,
    function_code: u8,
    payload: &[u8],
) -> Result<usize, Error> {
    let frame = encode(function_code, payload)?;
    transport::write_all_async(writer, &frame, || Error::SendFailure).await?;
    writer.flush().await.map_err(|_| Error::SendFailure)?;
    Ok(frame.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_empty_payload() {
        let frame = encode(0x7F, &[]).unwrap();
        assert_eq!(&frame[..], &[0x03, 0x7F, 0x7F, b'$', b'@']);
    }

    #[test]
    fn checksum_wraps_modulo_256() {
        assert_eq!(checksum(0xFF, &[0x01]), 0x00);
        assert_eq!(checksum(0x80, &[0x80, 0x80]), 0x80);
    }

    #[test]
    fn max_payload_fills_the_buffer() {
        let payload = [0xAAu8; MAX_PAYLOAD_LEN];
        let frame = encode(0x02, &payload).unwrap();
        assert_eq!(frame.len(), MAX_PAYLOAD_LEN + FRAME_OVERHEAD);
        assert_eq!(frame[0], 78);
        assert_eq!(&frame[frame.len() - 2..], &TERMINATOR);
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(encode(0x01, &payload), Err(Error::BufferOverflow));
    }

    #[test]
    fn encode_into_leaves_small_buffer_untouched() {
        let mut out = [0xEEu8; 6];
        assert_eq!(
            encode_into(0x01, &[1, 2], &mut out),
            Err(Error::BufferOverflow)
        );
        assert_eq!(out, [0xEE; 6]);
    }

    #[test]
    fn decode_rejects_bad_terminator() {
        let mut frame = encode(0x01, &[1, 2, 3]).unwrap();
        let last = frame.len() - 1;
        frame[last] = b'#';
        assert_eq!(decode(&frame), Err(Error::FormatError));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let frame = encode(0x01, &[1, 2, 3]).unwrap();
        assert_eq!(decode(&frame[..frame.len() - 1]), Err(Error::FormatError));
        assert_eq!(decode(&[0x03, 0x00, 0x00]), Err(Error::FormatError));
    }

    #[test]
    fn decode_detects_corruption() {
        let mut frame = encode(0x01, &[1, 2, 3]).unwrap();
        frame[4] ^= 0x10;
        assert_eq!(decode(&frame), Err(Error::ChecksumMismatch));
    }
}
