//! Decoders for the per-category binary frame formats.
//!
//! Each function turns one raw frame into a [`DecodedFrame`]: a mapping
//! from device key to a typed record, in the order the keys appear in
//! the byte stream. Decoding is pure and copies out of the input
//! buffer; the result owns its data.
//!
//! A frame whose byte length does not divide into whole per-key records
//! fails with [`Error::Decode`] and never yields a partial mapping.

use crate::error::Error;
use crate::protocol;
use crate::types::{DeviceKey, StreamFormat};
use crate::Result;

/// Decoded frame: device key to record, in wire order.
///
/// Keys are unique within one frame, so a small ordered vector is both
/// the lookup structure and the iteration order.
#[derive(Debug, Clone)]
pub struct DecodedFrame<E> {
    entries: Vec<(DeviceKey, E)>,
}

impl<E> Default for DecodedFrame<E> {
    fn default() -> Self {
        DecodedFrame {
            entries: Vec::new(),
        }
    }
}

impl<E> DecodedFrame<E> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record for one device key, if present in this frame.
    pub fn get(&self, key: DeviceKey) -> Option<&E> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, e)| e)
    }

    /// Entries in the order the keys appeared in the byte stream.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceKey, &E)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    pub fn keys(&self) -> impl Iterator<Item = DeviceKey> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// First entry in wire order, if any.
    pub fn first(&self) -> Option<(DeviceKey, &E)> {
        self.entries.first().map(|(k, e)| (*k, e))
    }

    fn push(&mut self, key: DeviceKey, element: E) {
        self.entries.push((key, element));
    }
}

/// One device's record on the preview stream.
///
/// Wire layout per key: global quaternion `[w,x,y,z]`, local quaternion
/// `[w,x,y,z]`, local Euler angles `[x,y,z]`, linear acceleration
/// `[x,y,z]`. 14 floats total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewElement {
    values: [f32; PREVIEW_VALUES],
}

const PREVIEW_VALUES: usize = 14;

impl PreviewElement {
    /// Unit quaternion `[w, x, y, z]` of the current orientation.
    /// `local` selects the orientation relative to the start pose;
    /// otherwise the global orientation.
    pub fn quaternion(&self, local: bool) -> [f32; 4] {
        let base = if local { 4 } else { 0 };
        [
            self.values[base],
            self.values[base + 1],
            self.values[base + 2],
            self.values[base + 3],
        ]
    }

    /// Local Euler angles `[x, y, z]` in radians, x-y-z rotation order,
    /// each on `[-pi, pi]`.
    pub fn euler(&self) -> [f32; 3] {
        [self.values[8], self.values[9], self.values[10]]
    }

    /// Linear acceleration estimate `[x, y, z]` in g.
    pub fn acceleration(&self) -> [f32; 3] {
        [self.values[11], self.values[12], self.values[13]]
    }

    /// 4x4 rotation matrix of the selected orientation, as a flat
    /// 16-element array in row-major order.
    pub fn matrix(&self, local: bool) -> [f32; 16] {
        protocol::quaternion_to_matrix(self.quaternion(local))
    }
}

/// One device's record on the sensor stream: calibrated inertial
/// vectors packed as `[a, m, g]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorElement {
    values: [f32; SENSOR_VALUES],
}

const SENSOR_VALUES: usize = 9;

impl SensorElement {
    /// Accelerometer `[x, y, z]` in g.
    pub fn accelerometer(&self) -> [f32; 3] {
        [self.values[0], self.values[1], self.values[2]]
    }

    /// Magnetometer `[x, y, z]` in microtesla.
    pub fn magnetometer(&self) -> [f32; 3] {
        [self.values[3], self.values[4], self.values[5]]
    }

    /// Gyroscope `[x, y, z]` in degrees/second.
    pub fn gyroscope(&self) -> [f32; 3] {
        [self.values[6], self.values[7], self.values[8]]
    }
}

/// One device's record on the raw stream: unprocessed 12-bit readings
/// as signed 16-bit integers, packed as `[a, m, g]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawElement {
    values: [i16; SENSOR_VALUES],
}

impl RawElement {
    pub fn accelerometer(&self) -> [i16; 3] {
        [self.values[0], self.values[1], self.values[2]]
    }

    pub fn magnetometer(&self) -> [i16; 3] {
        [self.values[3], self.values[4], self.values[5]]
    }

    pub fn gyroscope(&self) -> [i16; 3] {
        [self.values[6], self.values[7], self.values[8]]
    }
}

/// One device's record on the configurable stream: the channels
/// selected at connect time, in category order. Size is self-reporting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurableElement {
    values: Vec<f32>,
}

impl ConfigurableElement {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Decode a preview frame.
pub fn preview(data: &[u8]) -> Result<DecodedFrame<PreviewElement>> {
    decode_floats(data, StreamFormat::Preview, PREVIEW_VALUES, |values| {
        let mut element = PreviewElement {
            values: [0.0; PREVIEW_VALUES],
        };
        element.values.copy_from_slice(values);
        element
    })
}

/// Decode a sensor frame.
pub fn sensor(data: &[u8]) -> Result<DecodedFrame<SensorElement>> {
    decode_floats(data, StreamFormat::Sensor, SENSOR_VALUES, |values| {
        let mut element = SensorElement {
            values: [0.0; SENSOR_VALUES],
        };
        element.values.copy_from_slice(values);
        element
    })
}

/// Decode a raw frame.
pub fn raw(data: &[u8]) -> Result<DecodedFrame<RawElement>> {
    const STRIDE: usize = 4 + 2 * SENSOR_VALUES;

    if data.len() % STRIDE != 0 {
        return Err(Error::Decode {
            format: StreamFormat::Raw,
            length: data.len(),
        });
    }

    let mut frame = DecodedFrame::default();
    for record in data.chunks_exact(STRIDE) {
        let key = read_i32(&record[0..4]);
        let mut values = [0i16; SENSOR_VALUES];
        for (i, pair) in record[4..].chunks_exact(2).enumerate() {
            values[i] = i16::from_le_bytes([pair[0], pair[1]]);
        }
        frame.push(key, RawElement { values });
    }

    Ok(frame)
}

/// Decode a configurable frame.
///
/// `values_per_device` is the count negotiated through the
/// [`ChannelSelection`](crate::ChannelSelection) handshake; the decoder
/// is told the layout rather than inferring it. Passing 0 selects the
/// self-describing wire form where each record embeds its own u32 value
/// count.
pub fn configurable(
    data: &[u8],
    values_per_device: usize,
) -> Result<DecodedFrame<ConfigurableElement>> {
    if values_per_device > 0 {
        return decode_floats(
            data,
            StreamFormat::Configurable,
            values_per_device,
            |values| ConfigurableElement {
                values: values.to_vec(),
            },
        );
    }

    let fail = || Error::Decode {
        format: StreamFormat::Configurable,
        length: data.len(),
    };

    let mut frame = DecodedFrame::default();
    let mut rest = data;
    while !rest.is_empty() {
        if rest.len() < 8 {
            return Err(fail());
        }
        let key = read_i32(&rest[0..4]);
        let count = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        rest = &rest[8..];

        if count == 0 || rest.len() < 4 * count {
            return Err(fail());
        }
        let values = rest[..4 * count]
            .chunks_exact(4)
            .map(read_f32)
            .collect::<Vec<_>>();
        rest = &rest[4 * count..];

        frame.push(key, ConfigurableElement { values });
    }

    Ok(frame)
}

/// Walk a buffer of fixed-stride float records: i32 key followed by
/// `count` little-endian f32 values.
fn decode_floats<E>(
    data: &[u8],
    format: StreamFormat,
    count: usize,
    make: impl Fn(&[f32]) -> E,
) -> Result<DecodedFrame<E>> {
    let stride = 4 + 4 * count;

    if data.len() % stride != 0 {
        return Err(Error::Decode {
            format,
            length: data.len(),
        });
    }

    let mut frame = DecodedFrame::default();
    let mut values = vec![0.0f32; count];
    for record in data.chunks_exact(stride) {
        let key = read_i32(&record[0..4]);
        for (value, chunk) in values.iter_mut().zip(record[4..].chunks_exact(4)) {
            *value = read_f32(chunk);
        }
        frame.push(key, make(&values));
    }

    Ok(frame)
}

fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
