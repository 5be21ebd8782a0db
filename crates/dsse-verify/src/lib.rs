//! Verification of DSSE attestation envelopes and Sigstore bundles.
//!
//! This crate provides:
//!
//! - DSSE pre-authentication encoding (PAE)
//! - Key resolution from `PUBLIC KEY`, `CERTIFICATE`, `RSA PUBLIC KEY` and
//!   `PGP PUBLIC KEY BLOCK` text, with ordered fallback parsers per format
//! - Signature verification for RSA (PKCS#1 v1.5 / PSS), ECDSA on P-256,
//!   P-384 and P-521, and OpenPGP detached signatures
//! - Sigstore bundle verification with Rekor transparency-log cross-checks
//!
//! Keys and certificates are trusted as given: there is no chain building,
//! validity-period check or revocation lookup.
//!
//! # Quick Start
//!
//! ```no_run
//! use dsse_verify::{keys, verify_dsse_signature, Envelope};
//!
//! # fn example(envelope_json: &str, key_pem: &str) -> Result<(), dsse_verify::VerifyError> {
//! let envelope = Envelope::from_json(envelope_json)?;
//! let key = keys::resolve(key_pem)?;
//! if verify_dsse_signature(&envelope, &key)? {
//!     println!("{}", dsse_verify::extract_payload(&envelope.payload));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Bundles
//!
//! ```no_run
//! use dsse_verify::{verify_bundle, RekorClient, SigstoreBundle};
//!
//! # async fn example(json: &str) -> anyhow::Result<()> {
//! let bundle = SigstoreBundle::from_json(json)?;
//! let rekor = RekorClient::from_env()?;
//! let report = verify_bundle(&bundle, &rekor).await?;
//! println!("{}", report.verdict.as_str());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `DSSE_VERIFY_REKOR_URL` | Rekor base URL (default: `https://rekor.sigstore.dev`) |
//! | `DSSE_VERIFY_REKOR_TIMEOUT` | Request timeout in seconds (default: none) |

pub mod bundle;
pub mod error;
pub mod keys;
pub mod pae;
pub mod payload;
pub mod pem;
pub mod tlog;
pub mod types;
pub mod verify;

// Re-export main types
pub use bundle::{
    certificate_public_key_pem, verify_bundle, verify_bundle_offline, BundleReport, EntryReport,
    Verdict,
};
pub use error::{VerifyError, VerifyResult};
pub use keys::{resolve, KeyFormat, KeyHandle, ParseAttempt, ParseStrategy};
pub use payload::{decode_payload, extract_payload};
pub use tlog::{check_record, verify_tlog_entry, LogRecordSource, RekorClient, TlogCheck, TlogFailure};
pub use types::{
    Envelope, RekorConfig, RemoteLogRecord, Signature, SigstoreBundle, TlogEntry,
    VerificationMaterial,
};
pub use verify::{
    verify_dsse_signature, verify_envelope, SignatureError, SignatureFailure, VerificationOutcome,
};
