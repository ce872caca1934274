use crate::protocol;
use std::fmt;

/// Identifier of one sensing device within a frame. Keys are unique
/// within a single decoded frame.
pub type DeviceKey = i32;

/// The data categories the service publishes, one per well-known port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Filtered orientation output: quaternions, Euler angles,
    /// linear acceleration.
    Preview,
    /// Calibrated inertial sensor vectors in physical units.
    Sensor,
    /// Unprocessed sensor readings in device units.
    Raw,
    /// Caller-selected channel mix, negotiated at connect time.
    Configurable,
}

impl StreamFormat {
    /// The well-known port the service binds for this category.
    pub fn default_port(self) -> u16 {
        match self {
            StreamFormat::Preview => protocol::PORT_PREVIEW,
            StreamFormat::Sensor => protocol::PORT_SENSOR,
            StreamFormat::Raw => protocol::PORT_RAW,
            StreamFormat::Configurable => protocol::PORT_CONFIGURABLE,
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamFormat::Preview => "preview",
            StreamFormat::Sensor => "sensor",
            StreamFormat::Raw => "raw",
            StreamFormat::Configurable => "configurable",
        };
        f.write_str(name)
    }
}

bitflags::bitflags! {
    /// Preview-category channels selectable on the configurable stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PreviewChannels: u32 {
        /// Global orientation quaternion, 4 values.
        const GLOBAL_QUATERNION = 1 << 0;
        /// Local orientation quaternion, 4 values.
        const LOCAL_QUATERNION = 1 << 1;
        /// Local Euler angles in radians, 3 values.
        const EULER = 1 << 2;
        /// Linear acceleration in g, 3 values.
        const ACCELERATION = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Sensor-category channels selectable on the configurable stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SensorChannels: u32 {
        /// Accelerometer vector in g, 3 values.
        const ACCELEROMETER = 1 << 0;
        /// Magnetometer vector in microtesla, 3 values.
        const MAGNETOMETER = 1 << 1;
        /// Gyroscope vector in degrees/second, 3 values.
        const GYROSCOPE = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Raw-category channels selectable on the configurable stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RawChannels: u32 {
        /// Unprocessed accelerometer vector, 3 values.
        const ACCELEROMETER = 1 << 0;
        /// Unprocessed magnetometer vector, 3 values.
        const MAGNETOMETER = 1 << 1;
        /// Unprocessed gyroscope vector, 3 values.
        const GYROSCOPE = 1 << 2;
    }
}

/// Active channel definition for the configurable service.
///
/// Sent once after connecting, before entering the read loop. The
/// service then packs exactly the selected channels, in category order,
/// into every subsequent frame. The same selection tells the decoder
/// how many values to expect per device.
///
/// ```
/// use mocap::{ChannelSelection, PreviewChannels, SensorChannels};
///
/// let selection = ChannelSelection {
///     preview: PreviewChannels::GLOBAL_QUATERNION,
///     sensor: SensorChannels::ACCELEROMETER,
///     ..Default::default()
/// };
/// assert_eq!(selection.values_per_device(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSelection {
    pub preview: PreviewChannels,
    pub sensor: SensorChannels,
    pub raw: RawChannels,
}

impl ChannelSelection {
    /// Number of scalar values the service will pack per device key.
    pub fn values_per_device(&self) -> usize {
        let mut count = 0;
        if self.preview.contains(PreviewChannels::GLOBAL_QUATERNION) {
            count += 4;
        }
        if self.preview.contains(PreviewChannels::LOCAL_QUATERNION) {
            count += 4;
        }
        if self.preview.contains(PreviewChannels::EULER) {
            count += 3;
        }
        if self.preview.contains(PreviewChannels::ACCELERATION) {
            count += 3;
        }
        count += 3 * self.sensor.bits().count_ones() as usize;
        count += 3 * self.raw.bits().count_ones() as usize;
        count
    }

    /// Render the selection as the XML command payload the service
    /// expects, e.g.
    /// `<?xml version="1.0"?><configurable><preview><Gq/></preview></configurable>`.
    ///
    /// Empty categories are omitted.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?><configurable>");

        if !self.preview.is_empty() {
            xml.push_str("<preview>");
            if self.preview.contains(PreviewChannels::GLOBAL_QUATERNION) {
                xml.push_str("<Gq/>");
            }
            if self.preview.contains(PreviewChannels::LOCAL_QUATERNION) {
                xml.push_str("<Lq/>");
            }
            if self.preview.contains(PreviewChannels::EULER) {
                xml.push_str("<r/>");
            }
            if self.preview.contains(PreviewChannels::ACCELERATION) {
                xml.push_str("<la/>");
            }
            xml.push_str("</preview>");
        }

        if !self.sensor.is_empty() {
            xml.push_str("<sensor>");
            if self.sensor.contains(SensorChannels::ACCELEROMETER) {
                xml.push_str("<a/>");
            }
            if self.sensor.contains(SensorChannels::MAGNETOMETER) {
                xml.push_str("<m/>");
            }
            if self.sensor.contains(SensorChannels::GYROSCOPE) {
                xml.push_str("<g/>");
            }
            xml.push_str("</sensor>");
        }

        if !self.raw.is_empty() {
            xml.push_str("<raw>");
            if self.raw.contains(RawChannels::ACCELEROMETER) {
                xml.push_str("<A/>");
            }
            if self.raw.contains(RawChannels::MAGNETOMETER) {
                xml.push_str("<M/>");
            }
            if self.raw.contains(RawChannels::GYROSCOPE) {
                xml.push_str("<G/>");
            }
            xml.push_str("</raw>");
        }

        xml.push_str("</configurable>");
        xml
    }
}
