//! Shared scaffolding: a single-connection mock service speaking the
//! length-delimited frame protocol.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

/// Bind an OS-assigned loopback port and serve exactly one connection
/// with the given closure on a background thread.
pub fn spawn_service<F>(serve: F) -> SocketAddr
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock service");
    let addr = listener.local_addr().expect("local addr");

    std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            serve(stream);
        }
    });

    addr
}

/// Write one length-delimited frame.
pub fn send_frame(stream: &mut TcpStream, payload: &[u8]) {
    let header = (payload.len() as u32).to_be_bytes();
    stream.write_all(&header).expect("send header");
    stream.write_all(payload).expect("send payload");
    stream.flush().expect("flush");
}

/// The textual description frame a service sends right after accept.
pub fn send_greeting(stream: &mut TcpStream, description: &str) {
    send_frame(stream, description.as_bytes());
}

/// Server-side read of one client frame (e.g. a configuration command).
pub fn recv_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).expect("recv header");
    let length = u32::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).expect("recv payload");
    payload
}

/// Pack preview records: each entry is a device key plus 14 floats.
pub fn preview_payload(entries: &[(i32, [f32; 14])]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (key, values) in entries {
        payload.extend_from_slice(&key.to_le_bytes());
        for v in values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
    }
    payload
}

/// Preview values carrying a unit global quaternion.
pub fn unit_preview_values(q: [f32; 4]) -> [f32; 14] {
    let mut values = [0.0f32; 14];
    values[..4].copy_from_slice(&q);
    values
}
