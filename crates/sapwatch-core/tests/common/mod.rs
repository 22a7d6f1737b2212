#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use etherparse::PacketBuilder;
use flate2::Compression;
use flate2::write::ZlibEncoder;

pub const SAP_PORT: u16 = 9875;

/// Builder for SAP datagrams with IPv4 origins.
pub struct SapDatagram {
    pub control: u8,
    pub auth_len: u8,
    pub msg_id_hash: u16,
    pub origin: [u8; 4],
    pub auth_data: Vec<u8>,
    pub payload: Vec<u8>,
}

impl SapDatagram {
    pub fn announcement(payload: &[u8]) -> Self {
        Self {
            control: 0x20,
            auth_len: 0,
            msg_id_hash: 0x1287,
            origin: [152, 78, 104, 83],
            auth_data: Vec::new(),
            payload: payload.to_vec(),
        }
    }

    pub fn deletion(self) -> Self {
        Self {
            control: self.control | 0x04,
            ..self
        }
    }

    pub fn compressed(self) -> Self {
        let payload = zlib(&self.payload);
        Self {
            control: self.control | 0x01,
            payload,
            ..self
        }
    }

    pub fn with_auth_words(self, words: u8) -> Self {
        Self {
            auth_len: words,
            auth_data: vec![0xaa; words as usize * 4],
            ..self
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = vec![self.control, self.auth_len];
        out.extend_from_slice(&self.msg_id_hash.to_be_bytes());
        out.extend_from_slice(&self.origin);
        out.extend_from_slice(&self.auth_data);
        out.extend_from_slice(&self.payload);
        out
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn ethernet_udp_frame(src: [u8; 4], src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [0x01, 0x00, 0x5e, 0x02, 0x7f, 0xfe])
        .ipv4(src, [224, 2, 127, 254], 64)
        .udp(src_port, dst_port);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn ethernet_tcp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [6, 5, 4, 3, 2, 1])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
        .tcp(SAP_PORT, SAP_PORT, 0, 0);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn temp_capture_path(label: &str, ext: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sapwatch_{label}_{unique}.{ext}"))
}

/// Little-endian legacy PCAP with Ethernet link type.
pub fn write_pcap(path: &Path, frames: &[(u32, Vec<u8>)]) {
    let frames: Vec<_> = frames
        .iter()
        .map(|(ts_sec, data)| (*ts_sec, 0, data.clone()))
        .collect();
    write_legacy(path, 0xa1b2_c3d4, &frames);
}

/// Legacy PCAP with the nanosecond magic; frames are `(sec, nsec, data)`.
pub fn write_pcap_nanos(path: &Path, frames: &[(u32, u32, Vec<u8>)]) {
    write_legacy(path, 0xa1b2_3c4d, frames);
}

fn write_legacy(path: &Path, magic: u32, frames: &[(u32, u32, Vec<u8>)]) {
    let mut out = Vec::new();
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (ts_sec, ts_frac, data) in frames {
        out.extend_from_slice(&ts_sec.to_le_bytes());
        out.extend_from_slice(&ts_frac.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    fs::write(path, out).unwrap();
}

/// Big-endian PCAPNG with a single Ethernet interface; timestamps in µs.
pub fn write_pcapng(path: &Path, frames: &[(u64, Vec<u8>)]) {
    write_pcapng_with_resolution(path, None, frames);
}

/// PCAPNG whose interface declares `if_tsresol`; timestamps are in those units.
pub fn write_pcapng_with_resolution(path: &Path, tsresol: Option<u8>, frames: &[(u64, Vec<u8>)]) {
    let mut out = Vec::new();
    out.extend_from_slice(&pcapng_block(0x0A0D_0D0A, &section_header_body()));
    out.extend_from_slice(&pcapng_block(1, &interface_desc_body(tsresol)));
    for (ts, data) in frames {
        out.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(*ts, data)));
    }
    fs::write(path, out).unwrap();
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B_3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body(tsresol: Option<u8>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    if let Some(tsresol) = tsresol {
        // if_tsresol, one byte padded to four, then opt_endofopt.
        body.extend_from_slice(&9u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[tsresol, 0, 0, 0]);
        body.extend_from_slice(&[0, 0, 0, 0]);
    }
    body
}

fn enhanced_packet_body(ts: u64, data: &[u8]) -> Vec<u8> {
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&((ts >> 32) as u32).to_be_bytes());
    body.extend_from_slice(&(ts as u32).to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    body.resize(body.len() + (4 - data.len() % 4) % 4, 0);
    body
}
