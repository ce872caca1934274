use crate::client::Client;
use crate::{Error, Result};
use std::time::Duration;

/// How the console service disposed of a script chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCode {
    /// Parsed and executed; the printed output is in the reply.
    Success,
    /// The chunk was incomplete; the service is waiting for the rest
    /// before executing.
    Continue,
    /// Compile or runtime error; a description is in the reply.
    Failure,
}

/// Reply to one script chunk.
#[derive(Debug, Clone)]
pub struct ConsoleReply {
    pub code: ConsoleCode,
    /// Printed output on success, error description on failure.
    pub output: String,
}

/// Request/response bridge to the scripting console service.
///
/// Each exchange sends one script chunk as a frame and reads one reply
/// frame back: a result code byte followed by the textual output. Used
/// for device lifecycle commands (scan, start, stop) without a separate
/// control protocol.
///
/// ```no_run
/// use mocap::{protocol, Client, Console, ConsoleCode};
///
/// let client = Client::connect("", protocol::PORT_CONSOLE)?;
/// let mut console = Console::new(client);
/// let reply = console.send_chunk("print('hello')", None)?;
/// assert_eq!(reply.code, ConsoleCode::Success);
/// # Ok::<(), mocap::Error>(())
/// ```
pub struct Console {
    client: Client,
}

impl Console {
    /// Wrap an existing connection to the console port.
    pub fn new(client: Client) -> Console {
        Console { client }
    }

    /// Send one script chunk and wait for its reply. `None` selects
    /// the default send and receive deadlines.
    pub fn send_chunk(&mut self, chunk: &str, timeout: Option<Duration>) -> Result<ConsoleReply> {
        if !self.client.write_command(chunk.as_bytes(), timeout)? {
            return Err(Error::MessageLength {
                length: chunk.len(),
            });
        }

        let reply = self
            .client
            .read_frame(timeout)?
            .ok_or(Error::Timeout)?;

        // Frame lengths are at least one byte, so a reply always
        // carries its code.
        let code = match reply[0] {
            0 => ConsoleCode::Success,
            1 => ConsoleCode::Continue,
            2 => ConsoleCode::Failure,
            other => return Err(Error::UnknownConsoleCode(other)),
        };
        let output = String::from_utf8_lossy(&reply[1..]).into_owned();

        Ok(ConsoleReply { code, output })
    }

    /// Give the connection back, e.g. to reuse it directly.
    pub fn into_client(self) -> Client {
        self.client
    }
}
