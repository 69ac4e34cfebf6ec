//! PNG chunk walker

use super::ImageMetrics;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::debug;
use std::io::{Cursor, Read};

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const IHDR: u32 = 0x4948_4452;
const BASELINE: u32 = 0x6261_5345;
const PHYS: u32 = 0x7048_5973;
const IEND: u32 = 0x4945_4E44;

const INCHES_PER_METRE: f64 = 39.37;

struct Chunk<'a> {
    kind: u32,
    data: &'a [u8],
}

/// Chunks of a PNG stream, stopping silently at the first truncated one.
struct Chunks<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Chunks<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        let body = bytes.strip_prefix(&SIGNATURE[..]).unwrap_or(bytes);
        Self {
            cursor: Cursor::new(body),
        }
    }

    fn read_chunk(&mut self) -> std::io::Result<Chunk<'a>> {
        let length = self.cursor.read_u32::<BigEndian>()? as usize;
        let kind = self.cursor.read_u32::<BigEndian>()?;
        let buffer: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        self.cursor.set_position(end as u64);
        // The checksum is not verified; a stream cut inside it still yields the payload.
        let mut crc = [0u8; 4];
        let _ = self.cursor.read_exact(&mut crc);
        Ok(Chunk {
            kind,
            data: &buffer[start..end],
        })
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_chunk() {
            Ok(chunk) if chunk.kind == IEND => None,
            Ok(chunk) => Some(chunk),
            Err(err) => {
                debug!("PNG chunk walk stopped at byte {}: {}", self.cursor.position(), err);
                None
            }
        }
    }
}

/// Reads width and height from `IHDR`, the baseline from `baSE` and the resolution from
/// `pHYs`. Returns `None` when no header chunk is present.
pub fn read_png_metrics(bytes: &[u8]) -> Option<ImageMetrics> {
    let mut size = None;
    let mut baseline = None;
    let mut dpi = None;

    for chunk in Chunks::new(bytes) {
        match chunk.kind {
            IHDR if chunk.data.len() >= 8 => {
                size = Some((
                    BigEndian::read_u32(&chunk.data[0..4]),
                    BigEndian::read_u32(&chunk.data[4..8]),
                ));
            }
            BASELINE if chunk.data.len() >= 4 => {
                baseline = Some(BigEndian::read_u32(&chunk.data[0..4]));
            }
            PHYS if chunk.data.len() >= 4 => {
                let pixels_per_metre = BigEndian::read_u32(&chunk.data[0..4]);
                dpi = Some((f64::from(pixels_per_metre) / INCHES_PER_METRE).round() as u32);
            }
            _ => {}
        }
    }

    let (width, height) = size?;
    Some(ImageMetrics {
        width,
        height,
        baseline,
        dpi,
    })
}
