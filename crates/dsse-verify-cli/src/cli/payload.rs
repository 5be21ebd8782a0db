//! `dsse-verify payload` - print the decoded payload.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dsse_verify::{extract_payload, Envelope};
use serde_json::Value;

use super::{read_file, report_error};
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// DSSE envelope or Sigstore bundle file (JSON)
    pub file: PathBuf,
}

pub fn cmd_payload(args: PayloadArgs) -> i32 {
    match run_payload(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => report_error(&e, false),
    }
}

fn run_payload(args: &PayloadArgs) -> Result<()> {
    let json = read_file(&args.file, "input file")?;
    let value: Value = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse JSON: {}", args.file.display()))?;

    // bundles wrap the envelope
    let envelope_json = value.get("dsseEnvelope").unwrap_or(&value).to_string();
    let envelope = Envelope::from_json(&envelope_json)?;

    println!("{}", extract_payload(&envelope.payload));
    Ok(())
}
