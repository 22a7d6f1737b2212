use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::directory::SessionDirectory;
use crate::protocols::sap::decode_sap_packet;
use crate::source::{CaptureFileSource, Datagram, DatagramSource, SourceError};
use crate::{AnnouncementRecord, CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod failures;

use failures::FailureTally;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode every SAP datagram in a capture file into a report.
pub fn analyze_capture_file(path: &Path, port: u16) -> Result<Report, AnalysisError> {
    let source = CaptureFileSource::open(path, port)?;
    analyze_source(path, source)
}

pub fn analyze_source<S: DatagramSource>(
    path: &Path,
    mut source: S,
) -> Result<Report, AnalysisError> {
    let mut sap_datagrams = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut announcements = Vec::new();
    let mut directory = SessionDirectory::new();
    let mut failures = FailureTally::default();

    while let Some(Datagram { ts, peer, data }) = source.next_datagram()? {
        sap_datagrams += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);
        match decode_sap_packet(&data) {
            Ok(packet) => {
                let event = directory.apply(&packet, ts);
                tracing::debug!(
                    origin = %packet.origin_address,
                    hash = %packet.msg_id_hash_hex(),
                    event = ?event,
                    "decoded SAP packet"
                );
                announcements.push(AnnouncementRecord::from_packet(
                    &packet,
                    peer.map(|peer| peer.to_string()),
                    ts_to_rfc3339(ts),
                ));
            }
            Err(err) => {
                tracing::debug!(kind = err.kind(), error = %err, "undecodable SAP datagram");
                failures.record(&err, describe_datagram(sap_datagrams, peer, ts));
            }
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        sap_datagrams,
        decoded: announcements.len() as u64,
        failed: failures.total(),
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = ts_to_rfc3339(last_ts.or(first_ts))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.announcements = announcements;
    report.sessions = directory.summaries(ts_to_rfc3339);
    report.decode_failures = failures.into_summaries();
    Ok(report)
}

fn describe_datagram(index: u64, peer: Option<std::net::SocketAddr>, ts: Option<f64>) -> String {
    let mut context = format!("datagram #{index}");
    if let Some(peer) = peer {
        context.push_str(&format!(" from {peer}"));
    }
    if let Some(ts) = ts_to_rfc3339(ts) {
        context.push_str(&format!(" @ {ts}"));
    }
    context
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
