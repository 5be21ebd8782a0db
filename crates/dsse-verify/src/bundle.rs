//! Sigstore bundle verification.
//!
//! The bundle's leaf certificate is reduced to a `PUBLIC KEY` PEM, resolved
//! like any other key text, and used to verify the embedded DSSE envelope.
//! When the signature holds, each transparency-log entry is cross-checked in
//! order. A failing entry does not stop the remaining ones.

use tracing::{debug, info, warn};

use crate::error::{VerifyError, VerifyResult};
use crate::keys::{self, certificate};
use crate::tlog::{verify_tlog_entry, LogRecordSource, TlogCheck};
use crate::types::{SigstoreBundle, TlogEntry};
use crate::verify::{verify_envelope, VerificationOutcome};

/// Overall result of a bundle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Signature valid and every log entry cross-checked.
    Verified,
    /// Signature valid, but nothing anchored it in a log.
    VerifiedUnanchored,
    /// Signature invalid, or a log entry failed.
    Failed,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::VerifiedUnanchored => "verified (not anchored in a transparency log)",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub entry: TlogEntry,
    pub check: TlogCheck,
}

#[derive(Debug, Clone)]
pub struct BundleReport {
    pub verdict: Verdict,
    pub verification: VerificationOutcome,
    pub entries: Vec<EntryReport>,
    /// Public key derived from the bundle certificate.
    pub public_key_pem: String,
}

impl BundleReport {
    pub fn is_verified(&self) -> bool {
        self.verdict == Verdict::Verified
    }
}

/// The certificate's SubjectPublicKeyInfo as `PUBLIC KEY` PEM text.
pub fn certificate_public_key_pem(certificate_der: &[u8]) -> VerifyResult<String> {
    certificate::public_key_pem(certificate_der).map_err(|e| VerifyError::Certificate {
        message: e.to_string(),
    })
}

/// Verify the bundle signature and cross-check every log entry against `source`.
pub async fn verify_bundle<S>(bundle: &SigstoreBundle, source: &S) -> VerifyResult<BundleReport>
where
    S: LogRecordSource + ?Sized,
{
    let mut report = verify_signature(bundle)?;
    if report.verdict == Verdict::Failed {
        return Ok(report);
    }

    let tlog_entries = &bundle.verification_material.tlog_entries;
    if tlog_entries.is_empty() {
        info!("bundle has no transparency log entries");
        return Ok(report);
    }

    let certificate_der = leaf_certificate(bundle)?;
    for entry in tlog_entries {
        let check = verify_tlog_entry(source, entry, &bundle.dsse_envelope, certificate_der).await?;
        if let Some(failure) = check.failure() {
            warn!(log_index = entry.log_index, error = %failure, "log entry rejected");
        }
        report.entries.push(EntryReport {
            entry: *entry,
            check,
        });
    }

    report.verdict = if report.entries.iter().all(|e| e.check.is_passed()) {
        Verdict::Verified
    } else {
        Verdict::Failed
    };
    debug!(verdict = report.verdict.as_str(), entries = report.entries.len(), "bundle checked");
    Ok(report)
}

/// Verify only the bundle signature, without consulting a log.
///
/// A valid signature yields [`Verdict::VerifiedUnanchored`] even when the bundle lists entries.
pub fn verify_bundle_offline(bundle: &SigstoreBundle) -> VerifyResult<BundleReport> {
    verify_signature(bundle)
}

fn verify_signature(bundle: &SigstoreBundle) -> VerifyResult<BundleReport> {
    let envelope = &bundle.dsse_envelope;
    envelope.validate()?;

    let public_key_pem = certificate_public_key_pem(leaf_certificate(bundle)?)?;
    let key = keys::resolve(&public_key_pem)?;
    let verification = verify_envelope(envelope, &key)?;

    let verdict = if verification.is_verified() {
        Verdict::VerifiedUnanchored
    } else {
        warn!(
            signatures = envelope.signatures.len(),
            "no bundle signature verified against the certificate key"
        );
        Verdict::Failed
    };

    Ok(BundleReport {
        verdict,
        verification,
        entries: Vec::new(),
        public_key_pem,
    })
}

fn leaf_certificate(bundle: &SigstoreBundle) -> VerifyResult<&[u8]> {
    bundle
        .verification_material
        .leaf_certificate()
        .ok_or_else(|| VerifyError::InvalidBundle {
            message: "bundle has no signing certificate".to_string(),
        })
}
