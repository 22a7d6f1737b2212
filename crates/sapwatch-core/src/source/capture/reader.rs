use std::io::{Read, Seek, SeekFrom};

use pcap_parser::{InterfaceDescriptionBlock, Linktype};

use super::error::CaptureSourceError;
use super::layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy,
    PcapNg,
}

/// Peek at the first four bytes to pick a capture reader, then rewind.
///
/// Anything that is not PCAPNG is handed to the legacy reader, which reports
/// its own magic errors.
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> Result<CaptureFormat, CaptureSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    if magic == layout::PCAPNG_MAGIC {
        Ok(CaptureFormat::PcapNg)
    } else {
        Ok(CaptureFormat::Legacy)
    }
}

/// Per-interface state from a PCAPNG interface description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interface {
    pub linktype: Linktype,
    /// Timestamp units per second (`if_tsresol`).
    pub ts_units: u64,
    /// Seconds added to every timestamp (`if_tsoffset`).
    pub ts_offset: i64,
}

impl Interface {
    pub fn from_block(block: &InterfaceDescriptionBlock<'_>) -> Self {
        Self {
            linktype: block.linktype,
            ts_units: block
                .ts_resolution()
                .filter(|units| *units > 0)
                .unwrap_or(layout::MICROS_PER_SECOND),
            ts_offset: block.ts_offset(),
        }
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self {
            linktype: Linktype::ETHERNET,
            ts_units: layout::MICROS_PER_SECOND,
            ts_offset: 0,
        }
    }
}

/// Interface for a PCAPNG interface id; Ethernet with microsecond timestamps
/// when the interface block is missing.
pub fn interface_for_id(interfaces: &[Interface], if_id: u32) -> Interface {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or_default()
}

pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32, interface: &Interface) -> f64 {
    let ts = ((ts_high as u64) << 32) | (ts_low as u64);
    let units = interface.ts_units;
    interface.ts_offset as f64 + (ts / units) as f64 + (ts % units) as f64 / units as f64
}

/// Legacy captures carry microseconds, or nanoseconds for the `a1b23c4d` magic.
pub fn legacy_ts_to_seconds(ts_sec: u32, ts_frac: u32, nanosecond: bool) -> f64 {
    let units = if nanosecond {
        layout::NANOS_PER_SECOND
    } else {
        layout::MICROS_PER_SECOND
    };
    ts_sec as f64 + ts_frac as f64 / units as f64
}
