pub mod bundle;
pub mod envelope;
pub mod payload;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dsse_verify::VerifyError;

use crate::exit_codes;

#[derive(Parser, Debug)]
#[command(
    name = "dsse-verify",
    version,
    about = "Verify DSSE attestation envelopes and Sigstore bundles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a DSSE envelope against a public key, certificate or PGP key
    Envelope(envelope::EnvelopeArgs),

    /// Verify a Sigstore bundle and cross-check its transparency-log entries
    Bundle(bundle::BundleArgs),

    /// Print the decoded payload of an envelope or bundle
    Payload(payload::PayloadArgs),
}

pub async fn dispatch(cli: Cli) -> i32 {
    match cli.cmd {
        Command::Envelope(args) => envelope::cmd_envelope(args),
        Command::Bundle(args) => bundle::cmd_bundle(args).await,
        Command::Payload(args) => payload::cmd_payload(args),
    }
}

/// Print the error and map it to an exit code.
pub(crate) fn report_error(err: &anyhow::Error, quiet: bool) -> i32 {
    if !quiet {
        eprintln!("error: {err:#}");
    }
    match err.downcast_ref::<VerifyError>() {
        Some(verify_err) if verify_err.is_transport() => exit_codes::NETWORK_ERROR,
        Some(verify_err) => verify_err.exit_code(),
        None if err.downcast_ref::<std::io::Error>().is_some()
            || err.downcast_ref::<serde_json::Error>().is_some() =>
        {
            exit_codes::INPUT_ERROR
        }
        None => exit_codes::INTERNAL_ERROR,
    }
}

pub(crate) fn read_file(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what}: {}", path.display()))
}
