use crate::Result;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Reader for recorded take data files.
///
/// A take file is the persisted form of one stream: fixed-size records
/// of little-endian values, no headers. The record size comes from the
/// format the take was recorded in, e.g. 9 floats per device for sensor
/// data. Offers the same "one record or end-of-stream" contract as the
/// live socket, so decoded playback can share the consumer code path.
///
/// ```no_run
/// use mocap::TakeFile;
///
/// let mut take = TakeFile::open("sensor.bin")?;
/// while let Some(values) = take.read_floats(9)? {
///     println!("accelerometer x = {}", values[0]);
/// }
/// # Ok::<(), mocap::Error>(())
/// ```
pub struct TakeFile {
    reader: BufReader<std::fs::File>,
}

impl TakeFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TakeFile> {
        let file = std::fs::File::open(path)?;
        Ok(TakeFile {
            reader: BufReader::new(file),
        })
    }

    /// Read one record of `count` little-endian f32 values. `Ok(None)`
    /// at end of file or on a short final record.
    pub fn read_floats(&mut self, count: usize) -> Result<Option<Vec<f32>>> {
        Ok(self.read_record(4 * count)?.map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        }))
    }

    /// Read one record of `count` little-endian i16 values. `Ok(None)`
    /// at end of file or on a short final record.
    pub fn read_shorts(&mut self, count: usize) -> Result<Option<Vec<i16>>> {
        Ok(self.read_record(2 * count)?.map(|bytes| {
            bytes
                .chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect()
        }))
    }

    fn read_record(&mut self, size: usize) -> Result<Option<Vec<u8>>> {
        if size == 0 {
            return Ok(None);
        }

        let mut bytes = vec![0u8; size];
        match self.reader.read_exact(&mut bytes) {
            Ok(()) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
