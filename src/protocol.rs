use std::time::Duration;

// -- Well-known service ports --
//
// The service binds one port per data category. These are protocol
// constants, not computed values.
pub const PORT_PREVIEW: u16 = 32079;
pub const PORT_SENSOR: u16 = 32078;
pub const PORT_RAW: u16 = 32077;
pub const PORT_CONFIGURABLE: u16 = 32076;
pub const PORT_CONSOLE: u16 = 32075;

// -- Frame geometry --

/// Every frame starts with a big-endian u32 byte count.
pub const HEADER_SIZE: usize = 4;

/// Exclusive upper bound on a single message body, so the largest
/// valid payload is 65534 bytes. Mostly a safeguard against allocating
/// a huge buffer from a corrupt length header.
pub const MAX_MESSAGE_LENGTH: usize = 65535;

/// Messages starting with these bytes carry service metadata, not
/// sample data. The client intercepts them out of the data stream.
pub const XML_MAGIC: &[u8] = b"<?xml";

// -- Default socket deadlines --

/// Receive deadline while idling for the next burst of data.
pub const WAIT_FOR_DATA_TIMEOUT: Duration = Duration::from_secs(5);
/// Receive deadline for one frame inside a burst.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Send deadline for one outgoing command.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Encode a frame length header. Returns `None` when the length is
/// outside the protocol bounds `1..MAX_MESSAGE_LENGTH`.
pub fn encode_header(length: usize) -> Option<[u8; HEADER_SIZE]> {
    if length == 0 || length >= MAX_MESSAGE_LENGTH {
        return None;
    }
    Some((length as u32).to_be_bytes())
}

/// Decode and validate a frame length header.
pub fn decode_header(header: [u8; HEADER_SIZE]) -> Option<usize> {
    let length = u32::from_be_bytes(header) as usize;
    if length == 0 || length >= MAX_MESSAGE_LENGTH {
        return None;
    }
    Some(length)
}

/// Convert a quaternion `[w, x, y, z]` to a 4x4 rotation matrix in
/// row-major order.
///
/// Normalizes by the squared norm so unit and near-unit quaternions are
/// handled without drift. A quaternion of (near) zero length yields the
/// identity matrix, as does the identity quaternion (1, 0, 0, 0).
///
/// The output is always row-major. Consumers that need column-major
/// storage (e.g. OpenGL-style renderers) must call [`transpose`] at
/// their own boundary.
pub fn quaternion_to_matrix(q: [f32; 4]) -> [f32; 16] {
    let [a, b, c, d] = q;

    let aa = a * a;
    let ab = a * b;
    let ac = a * c;
    let ad = a * d;
    let bb = b * b;
    let bc = b * c;
    let bd = b * d;
    let cc = c * c;
    let cd = c * d;
    let dd = d * d;

    let norm_sq = aa + bb + cc + dd;

    let mut m = [0.0f32; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[15] = 1.0;

    if norm_sq > 1e-6 {
        m[0] = (aa + bb - cc - dd) / norm_sq;
        m[1] = 2.0 * (-ad + bc) / norm_sq;
        m[2] = 2.0 * (ac + bd) / norm_sq;
        m[4] = 2.0 * (ad + bc) / norm_sq;
        m[5] = (aa - bb + cc - dd) / norm_sq;
        m[6] = 2.0 * (-ab + cd) / norm_sq;
        m[8] = 2.0 * (-ac + bd) / norm_sq;
        m[9] = 2.0 * (ab + cd) / norm_sq;
        m[10] = (aa - bb - cc + dd) / norm_sq;
    }

    m
}

/// Transpose a 4x4 matrix stored as a flat 16-element array.
///
/// The named row-major to column-major conversion step.
pub fn transpose(m: [f32; 16]) -> [f32; 16] {
    let mut t = [0.0f32; 16];
    for row in 0..4 {
        for col in 0..4 {
            t[4 * col + row] = m[4 * row + col];
        }
    }
    t
}
