use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use etherparse::PacketBuilder;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const SAP_PORT: u16 = 9875;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("sapwatch"))
}

fn sap_frame(control: u8, payload: &[u8]) -> Vec<u8> {
    let mut sap = vec![control, 0x00, 0x12, 0x87, 152, 78, 104, 83];
    sap.extend_from_slice(payload);
    let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [0x01, 0x00, 0x5e, 0x02, 0x7f, 0xfe])
        .ipv4([10, 0, 0, 1], [224, 2, 127, 254], 64)
        .udp(40000, SAP_PORT);
    let mut frame = Vec::with_capacity(builder.size(sap.len()));
    builder.write(&mut frame, &sap).expect("frame");
    frame
}

/// Little-endian legacy PCAP with an Ethernet link type.
fn write_capture(path: &Path, frames: &[Vec<u8>]) {
    let mut out = 0xa1b2_c3d4u32.to_le_bytes().to_vec();
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    for value in [0u32, 0, 65535, 1] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    for (idx, frame) in frames.iter().enumerate() {
        let len = frame.len() as u32;
        for value in [idx as u32 + 1, 0, len, len] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(frame);
    }
    fs::write(path, out).expect("write capture");
}

fn clean_capture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("announcements.pcap");
    write_capture(&path, &[sap_frame(0x20, b"v=0\r\ns=Seminar\r\n")]);
    path
}

fn mixed_capture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("mixed.pcap");
    write_capture(
        &path,
        &[
            sap_frame(0x20, b"v=0\r\ns=Seminar\r\n"),
            sap_frame(0x30, b"v=0\r\n"),
        ],
    );
    path
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd().arg("pcap").arg("analyse").arg("--help").assert().success();
    cmd().arg("pcap").arg("analyze").arg("--help").assert().success();
    cmd().arg("listen").arg("--help").assert().success();
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcapng");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    fs::write(&input, b"not a capture").expect("write");

    cmd()
        .arg("pcap")
        .arg("analyse")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn stdout_outputs_json_report() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);
    let assert = cmd()
        .arg("pcap")
        .arg("analyse")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(report["tool"]["name"], "sapwatch");
    assert_eq!(report["announcements"][0]["origin"], "152.78.104.83");
    assert_eq!(report["announcements"][0]["msg_id_hash"], "1287");
    assert_eq!(report["announcements"][0]["payload_mime_type"], "application/sdp");
    assert_eq!(report["sessions"].as_array().map(Vec::len), Some(1));
}

#[test]
fn glob_input_resolves_single_match() {
    let temp = TempDir::new().expect("tempdir");
    clean_capture(&temp);
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("pcap")
        .arg("analyse")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success()
        .stdout(contains("\"announcements\""));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_written_and_quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(written["capture_summary"]["decoded"], 1);
}

#[test]
fn report_must_not_overwrite_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);

    cmd()
        .arg("pcap")
        .arg("analyse")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn strict_fails_when_datagrams_fail_to_decode() {
    let temp = TempDir::new().expect("tempdir");
    let input = mixed_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("1 SAP datagram(s) failed to decode"));

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(
        written["decode_failures"][0]["kind"],
        "unsupported_address_family"
    );
}

#[test]
fn strict_passes_on_clean_capture() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn listen_rejects_zero_count() {
    cmd()
        .arg("listen")
        .arg("--count")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("--count must be at least 1"));
}

#[test]
fn listen_rejects_zero_timeout() {
    cmd()
        .arg("listen")
        .arg("--port")
        .arg("0")
        .arg("--timeout-secs")
        .arg("0")
        .assert()
        .failure()
        .stderr(
            contains("--timeout-secs must be at least 1")
                .and(contains("failed to join").not()),
        );
}

#[test]
fn listen_rejects_unicast_group() {
    cmd()
        .arg("listen")
        .arg("--group")
        .arg("10.1.2.3")
        .arg("--port")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("not a multicast group").and(contains("hint:")));
}
