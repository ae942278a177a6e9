//! # sensorlink - sensor and cloud report pipelines
//!
//! Building blocks for small IoT nodes that report telemetry. The crate
//! holds two independent pipelines, both designed for `no_std` targets
//! with fixed-size buffers:
//!
//! ## Sensor report pipeline
//!
//! A wireless sensor network node ([`sensor`]) that periodically reads a
//! temperature/humidity sensor and forwards the reading, either over the
//! air to the network coordinator or as a checksummed serial frame. The
//! coordinator role receives those readings and shows each terminal on its
//! own display line.
//!
//! ```rust
//! use sensorlink::sensor::frame;
//!
//! // length, checksum, function code, payload, "$@"
//! let bytes = frame::encode(frame::FUN_CODE_UPLOAD_DATA, &[1, 23, 45]).unwrap();
//! assert_eq!(bytes.len(), 8);
//! assert_eq!(&bytes[6..], b"$@");
//! ```
//!
//! ## Cloud property report loop
//!
//! A device session with an IoT cloud platform ([`cloud`]) that posts two
//! properties every few seconds from a cooperative loop and tracks
//! connectivity through registered event callbacks.
//!
//! ```rust
//! use sensorlink::cloud::AppContext;
//!
//! let ctx = AppContext::new();
//! let payload = ctx.render_payload().unwrap();
//! assert_eq!(payload.as_str(), r#"{"Data": "Hello,World!", "Status": 1}"#);
//! ```
//!
//! ## Collaborators
//!
//! The network stack, timers, display, serial port, sensor driver and the
//! cloud SDK's session driver are not part of this crate. They are reached
//! through traits ([`sensor::Platform`], [`transport::Write`],
//! [`cloud::Session`], [`cloud::Clock`]) the application implements.
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `async`: Async serial writes for frames
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod log;

/// Byte-stream traits for the serial port.
pub mod transport;

/// Periodic sensor report pipeline: node state machine, frame codec and
/// inbound dispatch.
pub mod sensor;

/// Cloud property report loop: session driver trait, callbacks and loop.
pub mod cloud;
