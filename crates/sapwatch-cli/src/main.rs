use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use sapwatch_core::{
    AnnouncementRecord, DEFAULT_BUFFER_SIZE, ListenerConfig, MulticastSource, SAP_IPV4_GLOBAL_GROUP,
    SAP_PORT, SapListener,
};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SAPWATCH_BUILD_COMMIT"),
    " ",
    env!("SAPWATCH_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "sapwatch")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Session Announcement Protocol (RFC 2974) listener and capture decoder.",
    long_about = None,
    after_help = "Examples:\n  sapwatch listen --count 5\n  sapwatch listen --group 239.255.255.255 --json\n  sapwatch pcap analyse capture.pcapng -o report.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join a SAP multicast group and print decoded announcements.
    Listen(ListenArgs),
    /// Operations on PCAP/PCAPNG inputs (offline).
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Multicast group to join
    #[arg(long, default_value_t = SAP_IPV4_GLOBAL_GROUP)]
    group: Ipv4Addr,

    /// UDP port to listen on
    #[arg(long, default_value_t = SAP_PORT)]
    port: u16,

    /// Local interface address for the group join
    #[arg(long, default_value_t = Ipv4Addr::UNSPECIFIED)]
    interface: Ipv4Addr,

    /// Stop after this many decoded packets
    #[arg(long)]
    count: Option<u64>,

    /// Stop when nothing arrives for this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print one JSON record per line instead of a text dump
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode SAP traffic in a capture file and write a JSON report.
    #[command(alias = "analyze")]
    #[command(
        after_help = "Examples:\n  sapwatch pcap analyse capture.pcapng -o report.json\n  sapwatch pcap analyze 'captures/*.pcap' --stdout --pretty"
    )]
    Analyse {
        /// Path (or glob matching one file) to a .pcap or .pcapng file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// UDP port carrying SAP traffic
        #[arg(long, default_value_t = SAP_PORT)]
        port: u16,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any SAP datagram failed to decode
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Listen(args) => cmd_listen(args),
        Commands::Pcap { command } => match command {
            PcapCommands::Analyse {
                input,
                report,
                stdout,
                pretty,
                port,
                quiet,
                strict,
            } => cmd_pcap_analyse(AnalyseOptions {
                input,
                report,
                stdout,
                pretty,
                port,
                quiet,
                strict,
            }),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_listen(args: ListenArgs) -> Result<(), CliError> {
    if args.count == Some(0) {
        return Err(CliError::new(
            "--count must be at least 1",
            Some("omit --count to listen until interrupted".to_string()),
        ));
    }
    if args.timeout_secs == Some(0) {
        return Err(CliError::new(
            "--timeout-secs must be at least 1",
            Some("omit --timeout-secs to wait indefinitely".to_string()),
        ));
    }
    let config = ListenerConfig {
        group: args.group,
        port: args.port,
        interface: args.interface,
        buffer_size: DEFAULT_BUFFER_SIZE,
        read_timeout: args.timeout_secs.map(Duration::from_secs),
    };

    let source = MulticastSource::open(&config)
        .with_context(|| format!("failed to join {}:{}", config.group, config.port))
        .map_err(|err| {
            CliError::new(
                format!("{err:#}"),
                Some("check --group/--interface and that the port is free".to_string()),
            )
        })?;
    let mut listener = SapListener::new(source);

    let mut printed = 0u64;
    while args.count.is_none_or(|count| printed < count) {
        let Some(received) = listener.next_packet().context("receive failed")? else {
            eprintln!("no SAP traffic within the timeout");
            break;
        };
        if args.json {
            let record = AnnouncementRecord::from_packet(
                &received.packet,
                received.peer.map(|peer| peer.to_string()),
                None,
            );
            let line = serde_json::to_string(&record).context("JSON serialization failed")?;
            println!("{line}");
        } else {
            if let Some(peer) = received.peer {
                println!("--- from {peer}");
            }
            print!("{}", received.packet);
        }
        printed += 1;
    }

    let stats = listener.stats();
    tracing::info!(
        datagrams = stats.datagrams,
        decoded = stats.decoded,
        discarded = stats.discarded,
        "listener finished"
    );
    listener
        .into_inner()
        .close()
        .context("failed to leave multicast group")?;
    Ok(())
}

struct AnalyseOptions {
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    port: u16,
    quiet: bool,
    strict: bool,
}

fn cmd_pcap_analyse(opts: AnalyseOptions) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&opts.input)?;
    validate_input_file(&resolved_input)?;

    let report = if opts.stdout {
        None
    } else {
        Some(opts.report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };
    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(&resolved_input, report_path)?;
    }

    let rep = sapwatch_core::analyze_capture_file(&resolved_input, opts.port)
        .context("capture analysis failed")?;
    let json = if opts.pretty {
        serde_json::to_string_pretty(&rep)
    } else {
        serde_json::to_string(&rep)
    }
    .context("JSON serialization failed")?;

    match report {
        None => println!("{json}"),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !opts.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    let failed = rep
        .capture_summary
        .as_ref()
        .map_or(0, |summary| summary.failed);
    if opts.strict && failed > 0 {
        return Err(CliError::new(
            format!("{failed} SAP datagram(s) failed to decode"),
            Some("inspect decode_failures in the report".to_string()),
        ));
    }
    Ok(())
}

fn ensure_distinct_output(input: &PathBuf, report: &PathBuf) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let Some(file_name) = report.file_name() else {
        return Err(CliError::new(
            format!("invalid report path: {}", report.display()),
            Some("pass a file path to -o/--report".to_string()),
        ));
    };
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // A missing output directory cannot contain the input.
    let Ok(report_dir) = fs::canonicalize(&parent) else {
        return Ok(());
    };
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        n => {
            let listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let more = if n > 3 { ", ..." } else { "" };
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({n} matches); matches: {listed}{more}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
