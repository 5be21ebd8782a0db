//! `dsse-verify bundle` - verify a Sigstore bundle.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dsse_verify::{
    extract_payload, verify_bundle, verify_bundle_offline, BundleReport, RekorClient, RekorConfig,
    SigstoreBundle, TlogCheck, Verdict,
};
use tracing::info;

use super::{read_file, report_error};
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Sigstore bundle file (JSON)
    pub bundle: PathBuf,

    /// Rekor base URL
    #[arg(long, env = "DSSE_VERIFY_REKOR_URL", default_value = "https://rekor.sigstore.dev")]
    pub rekor_url: String,

    /// Rekor request timeout in seconds (no timeout by default)
    #[arg(long, env = "DSSE_VERIFY_REKOR_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Check the signature only; do not contact the transparency log
    #[arg(long)]
    pub offline: bool,

    /// Quiet mode - only exit code, no output
    #[arg(long, short)]
    pub quiet: bool,
}

pub async fn cmd_bundle(args: BundleArgs) -> i32 {
    match run_bundle(&args).await {
        Ok(code) => code,
        Err(e) => report_error(&e, args.quiet),
    }
}

async fn run_bundle(args: &BundleArgs) -> Result<i32> {
    let json = read_file(&args.bundle, "bundle file")?;
    let bundle = SigstoreBundle::from_json(&json)?;

    let report = if args.offline {
        verify_bundle_offline(&bundle)?
    } else {
        let mut config = RekorConfig::default().with_url(&args.rekor_url);
        if let Some(secs) = args.timeout {
            config = config.with_timeout_secs(secs);
        }
        verify_bundle(&bundle, &RekorClient::new(config)?).await?
    };

    info!(
        verdict = report.verdict.as_str(),
        entries = report.entries.len(),
        offline = args.offline,
        "bundle verification finished"
    );
    if !args.quiet {
        print_report(&report);
        if report.verdict != Verdict::Failed {
            println!();
            println!("{}", extract_payload(&bundle.dsse_envelope.payload));
        }
    }

    Ok(match report.verdict {
        Verdict::Verified => exit_codes::SUCCESS,
        Verdict::VerifiedUnanchored => exit_codes::UNANCHORED,
        Verdict::Failed => exit_codes::VERIFICATION_FAILED,
    })
}

fn print_report(report: &BundleReport) {
    match report.verification.verified_index {
        Some(index) => println!("Signature: valid (signature #{index})"),
        None => println!("Signature: invalid"),
    }
    for entry in &report.entries {
        match &entry.check {
            TlogCheck::Passed => println!("  log index {}: ok", entry.entry.log_index),
            TlogCheck::Failed(failure) => {
                println!("  log index {}: {}", entry.entry.log_index, failure)
            }
        }
    }
    println!("Result: {}", report.verdict.as_str());
}
