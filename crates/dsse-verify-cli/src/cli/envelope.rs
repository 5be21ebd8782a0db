//! `dsse-verify envelope` - verify a DSSE envelope.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dsse_verify::{extract_payload, keys, verify_envelope, Envelope};
use tracing::info;

use super::{read_file, report_error};
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct EnvelopeArgs {
    /// DSSE envelope file (JSON)
    pub envelope: PathBuf,

    /// Key file: PUBLIC KEY, CERTIFICATE, RSA PUBLIC KEY or PGP PUBLIC KEY BLOCK
    #[arg(long, short)]
    pub key: Option<PathBuf>,

    /// Quiet mode - only exit code, no output
    #[arg(long, short)]
    pub quiet: bool,
}

pub fn cmd_envelope(args: EnvelopeArgs) -> i32 {
    match run_envelope(&args) {
        Ok(code) => code,
        Err(e) => report_error(&e, args.quiet),
    }
}

fn run_envelope(args: &EnvelopeArgs) -> Result<i32> {
    let json = read_file(&args.envelope, "envelope file")?;
    let envelope = Envelope::from_json(&json)?;

    let Some(key_path) = &args.key else {
        if !args.quiet {
            println!("No key given; signature not checked.");
            println!();
            println!("{}", extract_payload(&envelope.payload));
        }
        return Ok(exit_codes::SUCCESS);
    };

    let key = keys::resolve(&read_file(key_path, "key file")?)?;
    let outcome = verify_envelope(&envelope, &key)?;

    let Some(index) = outcome.verified_index else {
        if !args.quiet {
            eprintln!("Signature verification failed");
            for failure in &outcome.failures {
                eprintln!(
                    "  signature #{} (keyid: {}): {}",
                    failure.index,
                    failure.keyid.as_deref().unwrap_or("-"),
                    failure.error
                );
            }
        }
        return Ok(exit_codes::VERIFICATION_FAILED);
    };

    info!(index, key = key.tag(), "envelope verified");
    if !args.quiet {
        println!("Signature verified");
        println!();
        println!("  signature: #{}", index);
        if let Some(keyid) = &envelope.signatures[index].keyid {
            println!("  keyid:     {}", keyid);
        }
        println!("  key:       {}", key.tag());
        println!("  type:      {}", envelope.payload_type);
        println!();
        println!("{}", extract_payload(&envelope.payload));
    }
    Ok(exit_codes::SUCCESS)
}
