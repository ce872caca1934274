use crate::types::StreamFormat;

/// Errors surfaced by the client, decoders, and stream worker.
///
/// End-of-stream and a wait-for-data timeout are not errors: the client
/// reports them as `Ok(None)` and `Ok(false)` respectively.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {length} bytes is not a whole number of {format} elements")]
    Decode { format: StreamFormat, length: usize },

    #[error("message length {length} is outside the protocol bounds")]
    MessageLength { length: usize },

    #[error("unknown result code {0} from the console service")]
    UnknownConsoleCode(u8),

    #[error("timed out waiting for data")]
    Timeout,

    #[error("stream worker stopped")]
    StreamStopped,
}
