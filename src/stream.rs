use crate::client::Client;
use crate::format::{self, DecodedFrame, PreviewElement};
use crate::protocol;
use crate::relay::{StreamStatus, TransformRelay};
use crate::types::DeviceKey;
use crate::{Error, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which device's transform the worker publishes through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// First device key enumerated in each frame, in wire order.
    #[default]
    First,
    /// A specific device key; frames without it publish nothing.
    Device(DeviceKey),
}

/// Tuning for a [`PreviewStream`] worker.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Device whose transform goes to the relay.
    pub target: Target,
    /// Publish the local orientation instead of the global one.
    pub local: bool,
    /// Idle deadline for one wait-for-data cycle.
    pub wait_timeout: Duration,
    /// Deadline for one frame read inside a burst.
    pub read_timeout: Duration,
    /// Capacity of the per-frame channel. When full, new frames are
    /// dropped; the relay still always carries the latest transform.
    pub channel_capacity: usize,
    /// Command payload written once before the read loop, e.g. a
    /// channel-selection definition for the configurable service.
    pub configuration: Option<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            target: Target::First,
            local: false,
            wait_timeout: protocol::WAIT_FOR_DATA_TIMEOUT,
            read_timeout: protocol::READ_TIMEOUT,
            channel_capacity: 256,
            configuration: None,
        }
    }
}

/// Handle to an active orientation stream.
///
/// A background worker thread owns the socket client, reads and decodes
/// frames, and hands them off two ways: every decoded frame is offered
/// to a bounded channel (full channel drops the frame), and the
/// selected device's row-major transform always overwrites the
/// [`TransformRelay`] slot. A render loop on its own tick reads
/// [`snapshot`](PreviewStream::snapshot); a logger that wants each
/// frame uses [`recv`](PreviewStream::recv).
///
/// Dropping the handle stops the worker and joins the thread.
pub struct PreviewStream {
    receiver: Receiver<DecodedFrame<PreviewElement>>,
    relay: Arc<TransformRelay>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl PreviewStream {
    /// Start the reader thread over an already connected client.
    ///
    /// Writes `options.configuration` to the service first, when set.
    pub fn start(mut client: Client, options: StreamOptions) -> Result<PreviewStream> {
        if let Some(configuration) = &options.configuration {
            if !client.write_command(configuration.as_bytes(), None)? {
                return Err(Error::MessageLength {
                    length: configuration.len(),
                });
            }
        }

        let (sender, receiver) = crossbeam_channel::bounded(options.channel_capacity);
        let relay = Arc::new(TransformRelay::new());
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread = {
            let relay = relay.clone();
            let stop_flag = stop_flag.clone();
            std::thread::Builder::new()
                .name("mocap-preview".into())
                .spawn(move || {
                    reader_loop(client, options, sender, relay, stop_flag);
                })
                .map_err(Error::Io)?
        };

        Ok(PreviewStream {
            receiver,
            relay,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// Receive the next decoded frame (blocks until available).
    pub fn recv(&self) -> Result<DecodedFrame<PreviewElement>> {
        self.receiver.recv().map_err(|_| Error::StreamStopped)
    }

    /// Receive a decoded frame without blocking.
    pub fn try_recv(&self) -> Option<DecodedFrame<PreviewElement>> {
        self.receiver.try_recv().ok()
    }

    /// Receive a decoded frame with a deadline.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<DecodedFrame<PreviewElement>> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => Error::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => Error::StreamStopped,
        })
    }

    /// Latest transform of the target device, row-major, or `None`
    /// before the first publish. Never blocks on the worker.
    pub fn snapshot(&self) -> Option<[f32; 16]> {
        self.relay.snapshot()
    }

    /// Shared handle to the relay, for a consumer thread that outlives
    /// borrowing from this stream.
    pub fn relay(&self) -> Arc<TransformRelay> {
        self.relay.clone()
    }

    /// Producer status as observed on the relay.
    pub fn status(&self) -> StreamStatus {
        self.relay.status()
    }

    /// Whether the worker is still running.
    pub fn is_active(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the worker and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PreviewStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The reader loop runs in a dedicated thread and owns the client.
///
/// Idle: wait for data, staying idle on timeout. Draining: read one
/// frame at a time until the end-of-stream sentinel, decoding and
/// publishing each. Drops back to idle while the connection is usable;
/// terminal otherwise. The stop flag is checked at every transition.
fn reader_loop(
    mut client: Client,
    options: StreamOptions,
    sender: Sender<DecodedFrame<PreviewElement>>,
    relay: Arc<TransformRelay>,
    stop_flag: Arc<AtomicBool>,
) {
    log::info!("preview reader started ({}:{})", client.host(), client.port());

    let final_status = loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("preview reader stopping (stop flag set)");
            break StreamStatus::Ended;
        }

        match client.wait_for_data(Some(options.wait_timeout)) {
            Ok(true) => {}
            Ok(false) => continue, // idle, nothing yet
            Err(e) => {
                log::warn!("wait for data failed: {}", e);
                break StreamStatus::Failed;
            }
        }

        // Drain the burst one frame at a time.
        let status = loop {
            if stop_flag.load(Ordering::Relaxed) {
                log::info!("preview reader stopping (stop flag set)");
                break Some(StreamStatus::Ended);
            }

            let frame = match client.read_frame(Some(options.read_timeout)) {
                Ok(Some(frame)) => frame,
                Ok(None) => break None, // burst drained or stream over
                Err(e) => {
                    log::warn!("frame read failed: {}", e);
                    break Some(StreamStatus::Failed);
                }
            };

            let decoded = match format::preview(&frame) {
                Ok(decoded) => decoded,
                Err(e) => {
                    // One bad frame is skippable; framing is intact
                    // because the length header was consistent.
                    log::warn!("skipping frame: {}", e);
                    continue;
                }
            };

            if let Some(matrix) = select_transform(&decoded, options.target, options.local) {
                relay.publish(matrix);
            }

            if let Err(e) = sender.try_send(decoded) {
                match e {
                    crossbeam_channel::TrySendError::Full(_) => {
                        log::trace!("frame channel full, dropping frame");
                    }
                    crossbeam_channel::TrySendError::Disconnected(_) => {
                        log::info!("frame channel disconnected, stopping reader");
                        break Some(StreamStatus::Ended);
                    }
                }
            }
        };

        if let Some(status) = status {
            break status;
        }

        if !client.is_connected() {
            log::info!("service closed the stream, preview reader exiting");
            break StreamStatus::Ended;
        }
    };

    relay.set_status(final_status);
}

/// Pick the transform of the configured target device out of one
/// decoded frame.
fn select_transform(
    frame: &DecodedFrame<PreviewElement>,
    target: Target,
    local: bool,
) -> Option<[f32; 16]> {
    match target {
        Target::First => frame.first().map(|(_, e)| e.matrix(local)),
        Target::Device(key) => frame.get(key).map(|e| e.matrix(local)),
    }
}
