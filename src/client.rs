use crate::error::Error;
use crate::protocol;
use crate::Result;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

/// Fallback when the caller passes an empty host string.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Socket client for one service stream.
///
/// Owns a single TCP connection to a fixed `(host, port)` pair and
/// implements the length-delimited frame protocol: each message is a
/// big-endian u32 byte count followed by that many little-endian
/// payload bytes.
///
/// Construction and connection are one step. A dropped or failed
/// connection is terminal for this instance; there is no reconnect.
///
/// ```no_run
/// use mocap::{format, protocol, Client};
///
/// let mut client = Client::connect("", protocol::PORT_PREVIEW)?;
/// while client.wait_for_data(None)? {
///     while let Some(frame) = client.read_frame(None)? {
///         let decoded = format::preview(&frame)?;
///         println!("devices in frame: {}", decoded.len());
///     }
///     if !client.is_connected() {
///         break;
///     }
/// }
/// # Ok::<(), mocap::Error>(())
/// ```
pub struct Client {
    stream: TcpStream,
    host: String,
    port: u16,
    /// Greeting frame the service sends on connect: a textual
    /// description of the remote service.
    description: Option<String>,
    /// Most recent XML metadata message intercepted from the stream.
    xml_string: Option<String>,
    connected: bool,
    // Cache the deadlines currently applied to the socket so repeated
    // calls with the same timeout skip the setsockopt round trip.
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl Client {
    /// Open a connection to the service. An empty host selects the
    /// loopback address.
    ///
    /// Consumes the greeting frame the service sends on accept, when
    /// one arrives within the read deadline.
    pub fn connect(host: &str, port: u16) -> Result<Client> {
        let address = if host.is_empty() { DEFAULT_HOST } else { host };

        let stream = TcpStream::connect((address, port)).map_err(|source| Error::Connect {
            host: address.to_string(),
            port,
            source,
        })?;
        stream.set_nodelay(true)?;

        let mut client = Client {
            stream,
            host: address.to_string(),
            port,
            description: None,
            xml_string: None,
            connected: true,
            read_timeout: None,
            write_timeout: None,
        };

        if let Some(greeting) = client.read_frame(Some(protocol::READ_TIMEOUT))? {
            client.description = Some(String::from_utf8_lossy(&greeting).into_owned());
            log::debug!(
                "connected to {}:{}: {}",
                client.host,
                client.port,
                client.description.as_deref().unwrap_or_default()
            );
        } else {
            log::debug!("connected to {}:{}, no greeting", client.host, client.port);
        }

        Ok(client)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Service description from the greeting frame, if one was sent.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Most recent XML metadata message intercepted from the data
    /// stream, if any.
    pub fn xml_string(&self) -> Option<&str> {
        self.xml_string.as_deref()
    }

    /// False once the peer has closed the connection or the stream
    /// framing has broken down.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Block until the socket reports readable data or the timeout
    /// elapses. `None` selects the 5 second default.
    ///
    /// Returns `Ok(false)` on timeout; a timeout is a normal outcome,
    /// not an error. Does not consume any stream bytes. Also returns
    /// `Ok(true)` when the peer has closed the connection, so the
    /// caller proceeds to `read_frame` and observes end-of-stream
    /// instead of idling forever.
    pub fn wait_for_data(&mut self, timeout: Option<Duration>) -> Result<bool> {
        let timeout = timeout.unwrap_or(protocol::WAIT_FOR_DATA_TIMEOUT);
        self.apply_read_timeout(timeout)?;

        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(e) if is_timeout(&e) => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Read exactly one frame, stripping the length header. `None`
    /// selects the 1 second default timeout.
    ///
    /// Returns `Ok(None)` when no more frames are available: the peer
    /// closed the connection, the length header was malformed, or no
    /// complete frame arrived before the deadline. Peer close, a bad
    /// header, and a stall partway through a frame also mark this
    /// client disconnected.
    ///
    /// Metadata messages starting with `<?xml` are stored on the client
    /// and skipped; the next data frame is returned in their place.
    pub fn read_frame(&mut self, timeout: Option<Duration>) -> Result<Option<Vec<u8>>> {
        let timeout = timeout.unwrap_or(protocol::READ_TIMEOUT);
        self.apply_read_timeout(timeout)?;

        loop {
            let frame = match self.receive()? {
                Some(frame) => frame,
                None => return Ok(None),
            };

            if frame.starts_with(protocol::XML_MAGIC) {
                self.xml_string = Some(String::from_utf8_lossy(&frame).into_owned());
                log::debug!("intercepted xml message, {} bytes", frame.len());
                continue;
            }

            return Ok(Some(frame));
        }
    }

    /// Send one command or configuration payload, length-prefixed.
    /// `None` selects the 1 second default timeout.
    ///
    /// Returns `Ok(false)` without touching the socket when the payload
    /// length is outside the protocol bounds.
    pub fn write_command(&mut self, payload: &[u8], timeout: Option<Duration>) -> Result<bool> {
        let header = match protocol::encode_header(payload.len()) {
            Some(header) => header,
            None => return Ok(false),
        };

        let timeout = timeout.unwrap_or(protocol::WRITE_TIMEOUT);
        if self.write_timeout != Some(timeout) {
            self.stream.set_write_timeout(Some(timeout))?;
            self.write_timeout = Some(timeout);
        }

        self.stream.write_all(&header)?;
        self.stream.write_all(payload)?;
        self.stream.flush()?;

        Ok(true)
    }

    /// Read one length-delimited message. `Ok(None)` is the
    /// end-of-stream sentinel.
    fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.connected {
            return Ok(None);
        }

        // Peek the header first so a timeout before a full header
        // arrives consumes nothing and leaves the framing intact. A
        // header can straddle TCP segments, so keep peeking until all
        // four bytes are buffered or the deadline elapses.
        let mut header = [0u8; protocol::HEADER_SIZE];
        let deadline = self.read_timeout.map(|t| Instant::now() + t);
        loop {
            match self.stream.peek(&mut header) {
                Ok(0) => {
                    log::debug!("service {}:{} closed the connection", self.host, self.port);
                    self.connected = false;
                    return Ok(None);
                }
                Ok(n) if n < protocol::HEADER_SIZE => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        // Stalled mid-header; the framing is gone.
                        self.connected = false;
                        return Ok(None);
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
                Ok(_) => break,
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => {
                    self.connected = false;
                    return Err(Error::Io(e));
                }
            }
        }
        match self.stream.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.connected = false;
                return Ok(None);
            }
            Err(e) => {
                self.connected = false;
                return Err(Error::Io(e));
            }
        }

        let length = match protocol::decode_header(header) {
            Some(length) => length,
            None => {
                // A bogus length means we lost framing; nothing after
                // this point can be trusted.
                log::warn!(
                    "invalid frame header {:02x?} from {}:{}",
                    header,
                    self.host,
                    self.port
                );
                self.connected = false;
                return Ok(None);
            }
        };

        let mut payload = vec![0u8; length];
        match self.stream.read_exact(&mut payload) {
            Ok(()) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof || is_timeout(&e) => {
                // Header without its body: the stream ended or stalled
                // mid-frame. Either way the framing is gone.
                self.connected = false;
                Ok(None)
            }
            Err(e) => {
                self.connected = false;
                Err(Error::Io(e))
            }
        }
    }

    fn apply_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        if self.read_timeout != Some(timeout) {
            self.stream.set_read_timeout(Some(timeout))?;
            self.read_timeout = Some(timeout);
        }
        Ok(())
    }
}

/// A receive deadline expiring reports as WouldBlock on Unix and
/// TimedOut on Windows.
fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
