use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use huludscan_detect::{AuditLogEvent, SuspiciousActivity, detect, detect_by_repository};
use huludscan_github::{AuditLogClient, ContextExpander, DEFAULT_API_URL};

mod artifact;
mod report;

use report::ScanInfo;

#[derive(Parser)]
#[command(name = "huludscan")]
#[command(about = "Detect self-deleting workflow runs in GitHub org audit logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an organization's audit log from GitHub and scan it
    Scan(ScanArgs),

    /// Scan NDJSON audit-log events from a file or stdin, offline
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Organization to scan
    #[arg(short, long)]
    org: String,

    /// API token with audit-log read access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// How many days of history to fetch
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    days_back: u32,

    /// Maximum created-to-deleted span, in seconds, for a sequence to be flagged
    #[arg(short = 'w', long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    window_seconds: u64,

    /// Minutes of surrounding actor activity to attach per finding (0 disables)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
    context_minutes: i64,

    /// Extra audit-log search phrase appended to the query
    #[arg(long, default_value = "")]
    additional_phrase: String,

    /// Directory to write summary.md and suspicious-activity.csv into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// API base URL (GitHub Enterprise Server)
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Correlate by (actor, repository) instead of run id, for feeds
    /// that carry no workflow run identifiers
    #[arg(long)]
    by_repository: bool,

    /// Exit with status 2 when suspicious sequences are found
    #[arg(long)]
    fail_on_match: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to an NDJSON event file (reads stdin if omitted)
    path: Option<PathBuf>,

    /// Maximum created-to-deleted span, in seconds, for a sequence to be flagged
    #[arg(short = 'w', long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    window_seconds: u64,

    /// Correlate by (actor, repository) instead of run id
    #[arg(long)]
    by_repository: bool,

    /// Print findings as JSON lines instead of a Markdown summary
    #[arg(long)]
    json: bool,

    /// Directory to write summary.md and suspicious-activity.csv into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Exit with status 2 when suspicious sequences are found
    #[arg(long)]
    fail_on_match: bool,
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => cmd_scan(args).await,
        Commands::Analyze(args) => cmd_analyze(args),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_scan(args: ScanArgs) {
    let client = match AuditLogClient::with_base_url(&args.token, &args.api_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid API base URL: {e}");
            process::exit(1);
        }
    };

    info!(
        org = %args.org,
        days_back = args.days_back,
        window_seconds = args.window_seconds,
        "fetching audit log events"
    );

    let events = match client
        .fetch_workflow_events(&args.org, args.days_back, &args.additional_phrase)
        .await
    {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error fetching audit log: {e}");
            process::exit(1);
        }
    };
    info!(events = events.len(), "retrieved workflow events");

    let mut findings = run_detection(&events, args.window_seconds, args.by_repository);

    if args.context_minutes > 0 && !findings.is_empty() {
        let expander = ContextExpander::new(&client, &args.org, args.context_minutes);
        if let Err(e) = expander.expand_all(&mut findings).await {
            // the findings stand without their review context
            warn!("context expansion failed: {e}");
        }
    }

    let scan_info = ScanInfo {
        days_back: Some(args.days_back),
        window_seconds: args.window_seconds,
        org: Some(&args.org),
    };
    finish(
        &findings,
        &scan_info,
        args.output_dir.as_deref(),
        false,
        args.fail_on_match,
    );
}

fn cmd_analyze(args: AnalyzeArgs) {
    let events = match &args.path {
        Some(path) => match fs::read_to_string(path) {
            Ok(contents) => parse_ndjson(contents.lines().map(str::to_owned)),
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => {
            let stdin = io::stdin();
            let lines = stdin.lock().lines().map_while(|line| match line {
                Ok(l) => Some(l),
                Err(e) => {
                    eprintln!("Error reading stdin: {e}");
                    None
                }
            });
            parse_ndjson(lines)
        }
    };

    let findings = run_detection(&events, args.window_seconds, args.by_repository);

    let scan_info = ScanInfo {
        days_back: None,
        window_seconds: args.window_seconds,
        org: None,
    };
    finish(
        &findings,
        &scan_info,
        args.output_dir.as_deref(),
        args.json,
        args.fail_on_match,
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse NDJSON events, reporting bad lines to stderr and skipping them.
/// A malformed record never aborts a scan.
fn parse_ndjson(lines: impl Iterator<Item = String>) -> Vec<AuditLogEvent> {
    let mut events = Vec::new();
    let mut line_num = 0u64;

    for line in lines {
        line_num += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditLogEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => eprintln!("Skipping invalid event on line {line_num}: {e}"),
        }
    }

    events
}

fn run_detection(
    events: &[AuditLogEvent],
    window_seconds: u64,
    by_repository: bool,
) -> Vec<SuspiciousActivity> {
    if by_repository {
        detect_by_repository(events, window_seconds)
    } else {
        detect(events, window_seconds)
    }
}

/// Log, render, persist, and set the exit code.
fn finish(
    findings: &[SuspiciousActivity],
    scan_info: &ScanInfo<'_>,
    output_dir: Option<&Path>,
    json: bool,
    fail_on_match: bool,
) {
    if findings.is_empty() {
        info!("no suspicious activity found");
    } else {
        let actors: HashSet<&str> = findings.iter().map(|a| a.actor.as_str()).collect();
        warn!(
            sequences = findings.len(),
            actors = actors.len(),
            "found suspicious activity sequences"
        );
    }

    if json {
        for finding in findings {
            match serde_json::to_string(finding) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("JSON serialization error: {e}");
                    process::exit(1);
                }
            }
        }
    } else {
        println!("{}", report::render_summary(findings, scan_info));
    }

    if let Some(dir) = output_dir {
        write_reports(findings, scan_info, dir);
    }

    if fail_on_match && !findings.is_empty() {
        process::exit(2);
    }
}

fn write_reports(findings: &[SuspiciousActivity], scan_info: &ScanInfo<'_>, dir: &Path) {
    let summary = report::render_summary(findings, scan_info);
    if let Err(e) = artifact::write_report(dir, artifact::SUMMARY_FILE_NAME, &summary) {
        eprintln!("Error writing summary to {}: {e}", dir.display());
        process::exit(1);
    }

    if !findings.is_empty() {
        let csv = report::render_csv(findings);
        match artifact::write_report(dir, artifact::CSV_FILE_NAME, &csv) {
            Ok(path) => info!(path = %path.display(), "wrote suspicious activity CSV"),
            Err(e) => {
                eprintln!("Error writing CSV to {}: {e}", dir.display());
                process::exit(1);
            }
        }
    }
}
