//! Tracker binary header parsing.
//!
//! Only the prologue needed for timing is read:
//!
//! | offset | size | field                      |
//! |--------|------|----------------------------|
//! | 0      | 6    | version tag (`Org-0[123]`) |
//! | 6      | 2    | tick duration, ms (u16 LE) |
//! | 8      | 1    | beats per measure          |
//! | 9      | 1    | steps per beat             |
//! | 10     | 4    | loop start tick (i32 LE)   |
//! | 14     | 4    | loop end tick (i32 LE)     |

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::errors::{ConversionError, ConversionResult};

/// Number of bytes read from the start of a tracker file.
pub const HEADER_LEN: usize = 18;

/// Recognised tracker format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgVersion {
    V1,
    V2,
    V3,
}

impl OrgVersion {
    /// Match a 6-byte version tag.
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            b"Org-01" => Some(OrgVersion::V1),
            b"Org-02" => Some(OrgVersion::V2),
            b"Org-03" => Some(OrgVersion::V3),
            _ => None,
        }
    }

    /// The tag as it appears in the file.
    pub fn magic(&self) -> &'static [u8; 6] {
        match self {
            OrgVersion::V1 => b"Org-01",
            OrgVersion::V2 => b"Org-02",
            OrgVersion::V3 => b"Org-03",
        }
    }
}

/// Timing fields of a tracker file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHeader {
    pub version: OrgVersion,
    /// Duration of one tick in milliseconds.
    pub tick_duration_ms: u16,
    /// First tick of the loop body.
    pub loop_start_tick: i32,
    /// Tick at which the loop body jumps back to `loop_start_tick`.
    pub loop_end_tick: i32,
}

impl TrackHeader {
    /// Parse the header prologue. `path` is only used for error messages.
    pub fn parse(bytes: &[u8; HEADER_LEN], path: &Path) -> ConversionResult<Self> {
        let magic = &bytes[0..6];
        let version =
            OrgVersion::from_magic(magic).ok_or_else(|| ConversionError::InvalidFormat {
                path: path.to_path_buf(),
                magic: String::from_utf8_lossy(magic).to_string(),
            })?;

        Ok(Self {
            version,
            tick_duration_ms: u16::from_le_bytes([bytes[6], bytes[7]]),
            loop_start_tick: i32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]),
            loop_end_tick: i32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]),
        })
    }

    /// Serialise back to the 18-byte prologue (tempo bytes zeroed).
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..6].copy_from_slice(self.version.magic());
        bytes[6..8].copy_from_slice(&self.tick_duration_ms.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.loop_start_tick.to_le_bytes());
        bytes[14..18].copy_from_slice(&self.loop_end_tick.to_le_bytes());
        bytes
    }

    /// Length of the loop body in ticks.
    pub fn loop_ticks(&self) -> i64 {
        i64::from(self.loop_end_tick) - i64::from(self.loop_start_tick)
    }
}

/// Read and parse the header of a tracker file.
///
/// The file handle is dropped on every path, so it is closed whether
/// parsing succeeds or not.
pub async fn read_header(path: &Path) -> ConversionResult<TrackHeader> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ConversionError::io("open", path, e))?;

    let mut bytes = [0u8; HEADER_LEN];
    file.read_exact(&mut bytes)
        .await
        .map_err(|e| ConversionError::io("read header of", path, e))?;
    drop(file);

    TrackHeader::parse(&bytes, path)
}
