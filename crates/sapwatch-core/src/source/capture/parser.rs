use std::fmt::Display;
use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{Datagram, DatagramSource, SourceError};

use super::error::CaptureSourceError;
use super::layout;
use super::reader::{
    CaptureFormat, Interface, detect_format, interface_for_id, legacy_ts_to_seconds,
    pcapng_ts_to_seconds,
};
use super::udp::parse_udp_datagram;

/// Replays SAP datagrams from a PCAP or PCAPNG file.
///
/// Only UDP payloads whose source or destination port matches `port` are
/// yielded; every other frame is skipped.
pub struct CaptureFileSource {
    frames: FrameReader,
    port: u16,
}

enum FrameReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Linktype,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<File>,
        interfaces: Vec<Interface>,
    },
}

struct Frame {
    ts: f64,
    linktype: Linktype,
    data: Vec<u8>,
}

impl CaptureFileSource {
    pub fn open(path: &Path, port: u16) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let format = detect_format(&mut file)?;
        let frames = FrameReader::new(file, format)?;
        Ok(Self { frames, port })
    }
}

impl DatagramSource for CaptureFileSource {
    fn next_datagram(&mut self) -> Result<Option<Datagram>, SourceError> {
        while let Some(frame) = self.frames.next_frame()? {
            match parse_udp_datagram(frame.linktype, &frame.data) {
                Ok(Some(udp)) if udp.touches_port(self.port) => {
                    return Ok(Some(Datagram {
                        ts: Some(frame.ts),
                        peer: Some(udp.src),
                        data: udp.payload.to_vec(),
                    }));
                }
                Ok(_) => {}
                Err(err) => tracing::trace!(error = %err, ts = frame.ts, "skipping frame"),
            }
        }
        Ok(None)
    }
}

impl FrameReader {
    fn new(file: File, format: CaptureFormat) -> Result<Self, CaptureSourceError> {
        match format {
            CaptureFormat::PcapNg => {
                let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| pcap_error("pcapng reader init", e))?;
                Ok(FrameReader::Ng {
                    reader,
                    interfaces: Vec::new(),
                })
            }
            CaptureFormat::Legacy => {
                let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| pcap_error("pcap reader init", e))?;
                Ok(FrameReader::Legacy {
                    reader,
                    linktype: Linktype::ETHERNET,
                    nanosecond: false,
                })
            }
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureSourceError> {
        loop {
            let frame = match self {
                FrameReader::Legacy {
                    reader,
                    linktype,
                    nanosecond,
                } => match reader.next() {
                    Ok((offset, block)) => {
                        let frame = match block {
                            PcapBlockOwned::LegacyHeader(header) => {
                                *linktype = header.network;
                                *nanosecond = header.is_nanosecond_precision();
                                None
                            }
                            PcapBlockOwned::Legacy(packet) => Some(Frame {
                                ts: legacy_ts_to_seconds(
                                    packet.ts_sec,
                                    packet.ts_usec,
                                    *nanosecond,
                                ),
                                linktype: *linktype,
                                data: packet.data.to_vec(),
                            }),
                            _ => None,
                        };
                        reader.consume(offset);
                        frame
                    }
                    Err(PcapError::Eof) => return Ok(None),
                    Err(PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| pcap_error("pcap reader refill", e))?;
                        None
                    }
                    Err(e) => return Err(pcap_error("pcap reader next", e)),
                },
                FrameReader::Ng { reader, interfaces } => match reader.next() {
                    Ok((offset, block)) => {
                        let frame = match block {
                            PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                                interfaces.clear();
                                None
                            }
                            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                                interfaces.push(Interface::from_block(&intf));
                                None
                            }
                            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                                let interface = interface_for_id(interfaces, packet.if_id);
                                Some(Frame {
                                    ts: pcapng_ts_to_seconds(
                                        packet.ts_high,
                                        packet.ts_low,
                                        &interface,
                                    ),
                                    linktype: interface.linktype,
                                    data: packet.data.to_vec(),
                                })
                            }
                            _ => None,
                        };
                        reader.consume(offset);
                        frame
                    }
                    Err(PcapError::Eof) => return Ok(None),
                    Err(PcapError::Incomplete(_)) => {
                        reader
                            .refill()
                            .map_err(|e| pcap_error("pcapng reader refill", e))?;
                        None
                    }
                    Err(e) => return Err(pcap_error("pcapng reader next", e)),
                },
            };
            if frame.is_some() {
                return Ok(frame);
            }
        }
    }
}

fn pcap_error(context: &'static str, err: impl Display) -> CaptureSourceError {
    CaptureSourceError::Pcap {
        context,
        message: err.to_string(),
    }
}
