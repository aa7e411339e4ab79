use std::path::PathBuf;

use alloy::primitives::U256;
use approval_analysis::classifier::{AccountClassifier, SuffixHeuristic, DEFAULT_EOA_SUFFIX};
use approval_analysis::decoder::{decode_approval, DecodedApproval, APPROVE_SIGNATURE};
use approval_analysis::engine::is_infinite_amount;
use approval_analysis::{
    ApprovalRiskEngine, DetectionResponse, DetectionService, RiskKind, Traversal,
};
use approval_data::loader::load_requests;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Exit status for `detect --fail-on-detect` when any request is flagged.
const EXIT_DETECTED: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "approval-guard")]
#[command(about = "Flag risky ERC-20 approve patterns in EVM transaction traces")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze detection requests and print a verdict per transaction.
    Detect(DetectArgs),
    /// Decode approve(address,uint256) calldata.
    Decode(DecodeArgs),
    /// List the risk catalog.
    Rules,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TraversalArg {
    /// Direct children of the root call.
    Children,
    /// Root call and every nested call.
    Recursive,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Children => Traversal::Children,
            TraversalArg::Recursive => Traversal::Recursive,
        }
    }
}

/// Arguments for the `detect` subcommand.
#[derive(Args, Debug)]
struct DetectArgs {
    /// Request JSON file, JSON array file, or directory of `*.json` files.
    #[arg(long)]
    input: PathBuf,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,

    #[arg(long, value_enum, default_value = "children")]
    traversal: TraversalArg,

    /// Address suffix classified as an EOA.
    #[arg(long, env = "APPROVAL_GUARD_EOA_SUFFIX", default_value = DEFAULT_EOA_SUFFIX)]
    eoa_suffix: String,

    /// Exit with status 2 when any transaction is flagged.
    #[arg(long)]
    fail_on_detect: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Hex call input, `0x`-prefixed.
    #[arg(long)]
    calldata: String,

    #[arg(long, env = "APPROVAL_GUARD_EOA_SUFFIX", default_value = DEFAULT_EOA_SUFFIX)]
    eoa_suffix: String,
}

/// JSON output of the `detect` subcommand.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectReport<'a> {
    generated_at: String,
    traversal: Traversal,
    requests: usize,
    flagged: usize,
    responses: &'a [DetectionResponse],
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Detect(args) => handle_detect(args).await,
        Commands::Decode(args) => handle_decode(args),
        Commands::Rules => handle_rules(),
    }
}

/// Default log level when `RUST_LOG` is unset: `-q` wins over `-v`.
fn log_level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Logs go to stderr so `detect --output json` stays pipeable.
fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level(verbose, quiet).as_str())
            .wrap_err("failed to initialize tracing filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn parse_suffix(raw: &str) -> Result<SuffixHeuristic> {
    let suffix = raw.strip_prefix("0x").unwrap_or(raw);
    if suffix.is_empty() || suffix.len() > 40 || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(eyre!(
            "invalid eoa-suffix {raw:?}: expected 1-40 hex characters"
        ));
    }
    Ok(SuffixHeuristic::new(suffix))
}

async fn handle_detect(args: DetectArgs) -> Result<()> {
    if args.output != "table" && args.output != "json" {
        return Err(eyre!(
            "invalid output format {:?}: expected table or json",
            args.output
        ));
    }

    let classifier = parse_suffix(&args.eoa_suffix)?;
    let service = DetectionService::new(
        ApprovalRiskEngine::with_classifier(classifier),
        args.traversal.into(),
    );

    let requests = load_requests(&args.input)
        .await
        .wrap_err("failed to load detection requests")?;
    if requests.is_empty() {
        return Err(eyre!("no detection requests found in {}", args.input.display()));
    }

    info!(
        requests = requests.len(),
        traversal = ?service.traversal(),
        "analyzing transactions"
    );

    let pb = if requests.len() > 1 {
        let pb = ProgressBar::new(requests.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} txs")
                .wrap_err("failed to create progress style")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut responses = Vec::with_capacity(requests.len());
    for request in &requests {
        let response = service.detect(request);
        if response.detected {
            info!(
                hash = %response.hash,
                risks = response.risks.len(),
                "transaction flagged"
            );
        }
        responses.push(response);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let flagged = responses.iter().filter(|r| r.detected).count();

    if args.output == "json" {
        let report = DetectReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            traversal: service.traversal(),
            requests: responses.len(),
            flagged,
            responses: &responses,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).wrap_err("failed to serialize report")?
        );
    } else {
        print_verdict_table(&responses);
        println!("{flagged} of {} transaction(s) flagged", responses.len());
    }

    if args.fail_on_detect && flagged > 0 {
        std::process::exit(EXIT_DETECTED);
    }
    Ok(())
}

fn format_amount(amount_hex: &str) -> String {
    if is_infinite_amount(amount_hex) {
        return "unlimited".to_string();
    }
    match amount_hex.parse::<U256>() {
        Ok(value) => value.to_string(),
        Err(_) => amount_hex.to_string(),
    }
}

fn print_verdict_table(responses: &[DetectionResponse]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Tx Hash", "Chain", "Risk", "Severity", "Owner", "Spender", "Amount",
    ]);

    for response in responses {
        if response.risks.is_empty() {
            table.add_row(vec![
                response.hash.clone(),
                response.chain_id.to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ]);
            continue;
        }

        for risk in &response.risks {
            let amount = risk
                .evidence
                .value
                .as_deref()
                .map(format_amount)
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                response.hash.clone(),
                response.chain_id.to_string(),
                risk.kind.to_string(),
                risk.severity.to_string(),
                risk.evidence.from.clone(),
                risk.evidence.to.clone(),
                amount,
            ]);
        }
    }

    println!("{table}");
}

fn handle_decode(args: DecodeArgs) -> Result<()> {
    let classifier = parse_suffix(&args.eoa_suffix)?;
    let approval = decode_approval(args.calldata.trim())
        .ok_or_else(|| eyre!("calldata is not a decodable {APPROVE_SIGNATURE} call"))?;

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    for (field, value) in decode_rows(&approval, &classifier) {
        table.add_row(vec![field.to_string(), value]);
    }

    println!("{table}");
    Ok(())
}

fn decode_rows(
    approval: &DecodedApproval,
    classifier: &dyn AccountClassifier,
) -> Vec<(&'static str, String)> {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" }.to_string();

    let checksummed = approval
        .spender_address()
        .map(|address| address.to_checksum(None))
        .unwrap_or_else(|| "N/A".to_string());
    let decimal = approval
        .amount_value()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "N/A (exceeds uint256)".to_string());

    vec![
        ("Method", APPROVE_SIGNATURE.to_string()),
        ("Spender", approval.spender.clone()),
        ("Spender (checksum)", checksummed),
        ("Amount (hex)", approval.amount.clone()),
        ("Amount", decimal),
        ("Infinite", yes_no(is_infinite_amount(&approval.amount))),
        (
            "EOA (heuristic)",
            yes_no(classifier.is_externally_owned(&approval.spender)),
        ),
    ]
}

fn handle_rules() -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Risk", "Severity", "Active", "Message"]);

    for kind in RiskKind::ALL {
        table.add_row(vec![
            kind.to_string(),
            kind.severity().to_string(),
            if kind.is_reserved() { "reserved" } else { "yes" }.to_string(),
            kind.message().to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_detect_flags() {
        let cli = Cli::try_parse_from([
            "approval-guard",
            "-v",
            "detect",
            "--input",
            "requests/",
            "--output",
            "json",
            "--traversal",
            "recursive",
            "--fail-on-detect",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Detect(args) => {
                assert_eq!(args.output, "json");
                assert!(matches!(args.traversal, TraversalArg::Recursive));
                assert!(args.fail_on_detect);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn suffix_validation() {
        assert_eq!(parse_suffix("0x789").unwrap().suffix(), "789");
        assert!(parse_suffix("").is_err());
        assert!(parse_suffix("xyz").is_err());
    }

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(log_level(0, false), Level::INFO);
        assert_eq!(log_level(1, false), Level::DEBUG);
        assert_eq!(log_level(3, false), Level::TRACE);
        assert_eq!(log_level(2, true), Level::WARN);
    }

    #[test]
    fn decode_rows_show_method_and_checksum() {
        let calldata = format!(
            "0x095ea7b3{:0>64}{}",
            "d8da6bf26964af9d7eed9e03e53415d37aa96045",
            "f".repeat(64)
        );
        let approval = decode_approval(&calldata).unwrap();
        let rows = decode_rows(&approval, &SuffixHeuristic::default());

        let value = |field: &str| {
            rows.iter()
                .find(|(name, _)| *name == field)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(value("Method"), Some("approve(address,uint256)"));
        assert_eq!(
            value("Spender (checksum)"),
            Some("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
        );
        assert_eq!(value("Infinite"), Some("yes"));
        assert_eq!(value("EOA (heuristic)"), Some("no"));
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(&format!("0x{:064x}", 10)), "10");
        assert_eq!(format_amount(&format!("0x{}", "f".repeat(64))), "unlimited");
    }
}
