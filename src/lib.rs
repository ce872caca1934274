//! # mocap - client SDK for networked motion-capture data services
//!
//! Socket client for a motion-capture service that streams binary
//! frames of per-device orientation and inertial sensor data. Provides:
//! - Length-delimited frame transport over TCP ([`Client`])
//! - Decoders for the preview, sensor, raw, and configurable stream
//!   formats ([`format`])
//! - A background reader thread with a lock-guarded latest-transform
//!   slot for render loops ([`PreviewStream`], [`TransformRelay`])
//! - A scripting console bridge and a recorded take-file reader
//!
//! ## Quick Start
//! ```no_run
//! use mocap::{protocol, Client, PreviewStream, StreamOptions};
//! use std::time::Duration;
//!
//! let client = Client::connect("", protocol::PORT_PREVIEW).unwrap();
//! let stream = PreviewStream::start(client, StreamOptions::default()).unwrap();
//!
//! for _ in 0..100 {
//!     let frame = stream.recv_timeout(Duration::from_secs(1)).unwrap();
//!     for (key, element) in frame.iter() {
//!         let [w, x, y, z] = element.quaternion(false);
//!         println!("Gq({}) = ({}, {}i, {}j, {}k)", key, w, x, y, z);
//!     }
//! }
//!
//! // Meanwhile a render tick can take the latest transform:
//! if let Some(matrix) = stream.snapshot() {
//!     let column_major = mocap::protocol::transpose(matrix);
//!     let _ = column_major;
//! }
//! ```

pub mod client;
pub mod console;
pub mod error;
pub mod file;
pub mod format;
pub mod protocol;
pub mod relay;
pub mod stream;
pub mod types;

pub use client::Client;
pub use console::{Console, ConsoleCode, ConsoleReply};
pub use error::Error;
pub use file::TakeFile;
pub use format::{
    ConfigurableElement, DecodedFrame, PreviewElement, RawElement, SensorElement,
};
pub use relay::{LatestValue, StreamStatus, TransformRelay};
pub use stream::{PreviewStream, StreamOptions, Target};
pub use types::{
    ChannelSelection, DeviceKey, PreviewChannels, RawChannels, SensorChannels, StreamFormat,
};

/// Result type alias for mocap operations.
pub type Result<T> = std::result::Result<T, Error>;
