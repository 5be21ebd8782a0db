//! Transparency-log cross-checks.
//!
//! A bundle's log entry is trusted only when the record fetched from the log
//! agrees with it on integrated time and index, is a `dsse` entry, and logs
//! exactly the envelope's signatures with the bundle's certificate as verifier.

mod client;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{VerifyError, VerifyResult};
use crate::payload::decode_base64;
use crate::pem::strip_certificate_content;
use crate::types::{Envelope, LogEntryBody, LoggedSignature, RemoteLogRecord, TlogEntry};

pub use client::RekorClient;

const DSSE_KIND: &str = "dsse";

/// Where log records come from.
#[async_trait]
pub trait LogRecordSource: Send + Sync {
    /// Record stored at `log_index`, or `None` when the log has none.
    async fn fetch_record(&self, log_index: u64) -> VerifyResult<Option<RemoteLogRecord>>;
}

/// Why a log entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlogFailure {
    #[error("no log record at index {log_index}")]
    EntryNotFound { log_index: u64 },

    #[error("integratedTime mismatch: bundle has {expected}, log has {actual}")]
    TimeMismatch { expected: i64, actual: i64 },

    #[error("logIndex mismatch: bundle has {expected}, log has {actual}")]
    IndexMismatch { expected: u64, actual: u64 },

    #[error("log entry kind is {kind:?}, expected \"dsse\"")]
    WrongEntryKind { kind: String },

    #[error("malformed log entry body: {message}")]
    MalformedBody { message: String },

    #[error("log entry records no signatures")]
    NoLoggedSignatures,

    #[error("logged signature is not in the envelope: {signature}")]
    SignatureNotFound { signature: String },

    #[error("logged verifier does not match the bundle certificate")]
    VerifierMismatch,
}

/// Result of cross-checking one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlogCheck {
    Passed,
    Failed(TlogFailure),
}

impl TlogCheck {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn failure(&self) -> Option<&TlogFailure> {
        match self {
            Self::Passed => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> VerifyResult<()> {
        match self {
            Self::Passed => Ok(()),
            Self::Failed(failure) => Err(VerifyError::Tlog(failure)),
        }
    }
}

/// Fetch the record for `entry` and cross-check it.
///
/// Check failures come back as [`TlogCheck::Failed`]; only transport errors are `Err`.
pub async fn verify_tlog_entry<S>(
    source: &S,
    entry: &TlogEntry,
    envelope: &Envelope,
    certificate_der: &[u8],
) -> VerifyResult<TlogCheck>
where
    S: LogRecordSource + ?Sized,
{
    let Some(record) = source.fetch_record(entry.log_index).await? else {
        return Ok(TlogCheck::Failed(TlogFailure::EntryNotFound {
            log_index: entry.log_index,
        }));
    };

    let check = match check_record(&record, entry, envelope, certificate_der) {
        Ok(()) => TlogCheck::Passed,
        Err(failure) => TlogCheck::Failed(failure),
    };
    debug!(log_index = entry.log_index, passed = check.is_passed(), "checked log entry");
    Ok(check)
}

/// Compare a fetched record against the bundle's claims. Stops at the first failing check.
///
/// A `dsse` body that logs no signatures is rejected with
/// [`TlogFailure::NoLoggedSignatures`] rather than passing with nothing checked.
pub fn check_record(
    record: &RemoteLogRecord,
    entry: &TlogEntry,
    envelope: &Envelope,
    certificate_der: &[u8],
) -> Result<(), TlogFailure> {
    if record.integrated_time != entry.integrated_time {
        return Err(TlogFailure::TimeMismatch {
            expected: entry.integrated_time,
            actual: record.integrated_time,
        });
    }
    if record.log_index != entry.log_index {
        return Err(TlogFailure::IndexMismatch {
            expected: entry.log_index,
            actual: record.log_index,
        });
    }

    let body = decode_body(&record.body)?;
    if body.kind != DSSE_KIND {
        return Err(TlogFailure::WrongEntryKind { kind: body.kind });
    }

    let spec = body.dsse_spec().map_err(|e| TlogFailure::MalformedBody {
        message: format!("invalid dsse spec: {}", e),
    })?;
    if spec.signatures.is_empty() {
        return Err(TlogFailure::NoLoggedSignatures);
    }

    for logged in &spec.signatures {
        check_logged_signature(logged, envelope, certificate_der)?;
    }
    Ok(())
}

fn decode_body(body: &str) -> Result<LogEntryBody, TlogFailure> {
    let bytes = decode_base64(body).map_err(|e| TlogFailure::MalformedBody {
        message: format!("body is not base64: {}", e),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| TlogFailure::MalformedBody {
        message: format!("body is not JSON: {}", e),
    })
}

fn check_logged_signature(
    logged: &LoggedSignature,
    envelope: &Envelope,
    certificate_der: &[u8],
) -> Result<(), TlogFailure> {
    if !envelope
        .signatures
        .iter()
        .any(|signature| signature.sig == logged.signature)
    {
        return Err(TlogFailure::SignatureNotFound {
            signature: logged.signature.clone(),
        });
    }

    // verifier: base64 of a PEM certificate
    let pem_bytes = decode_base64(&logged.verifier).map_err(|e| TlogFailure::MalformedBody {
        message: format!("verifier is not base64: {}", e),
    })?;
    let pem_text = String::from_utf8_lossy(&pem_bytes);
    let logged_der = decode_base64(&strip_certificate_content(&pem_text)).map_err(|e| {
        TlogFailure::MalformedBody {
            message: format!("verifier is not a PEM certificate: {}", e),
        }
    })?;

    if logged_der != certificate_der {
        return Err(TlogFailure::VerifierMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    use super::*;
    use crate::pem::{to_pem, CERTIFICATE_LABEL};
    use crate::types::Signature;

    const CERT_DER: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x05];
    const OTHER_DER: &[u8] = &[0x30, 0x00];

    #[async_trait]
    impl LogRecordSource for HashMap<u64, RemoteLogRecord> {
        async fn fetch_record(&self, log_index: u64) -> VerifyResult<Option<RemoteLogRecord>> {
            Ok(self.get(&log_index).cloned())
        }
    }

    fn envelope() -> Envelope {
        Envelope {
            payload: "aGk=".into(),
            payload_type: "text/plain".into(),
            signatures: vec![Signature::new("c2lnLTE="), Signature::new("c2lnLTI=")],
        }
    }

    fn body(kind: &str, signatures: &[(&str, &[u8])]) -> String {
        let sigs: Vec<_> = signatures
            .iter()
            .map(|(sig, der)| {
                serde_json::json!({
                    "signature": sig,
                    "verifier": BASE64.encode(to_pem(CERTIFICATE_LABEL, der)),
                })
            })
            .collect();
        let json = serde_json::json!({
            "apiVersion": "0.0.1",
            "kind": kind,
            "spec": { "signatures": sigs },
        });
        BASE64.encode(json.to_string())
    }

    fn record(body: String) -> RemoteLogRecord {
        RemoteLogRecord {
            integrated_time: 1_700_000_000,
            log_index: 42,
            body,
            log_id: None,
        }
    }

    fn entry() -> TlogEntry {
        TlogEntry::new(42, 1_700_000_000)
    }

    #[test]
    fn matching_record_passes() {
        let record = record(body("dsse", &[("c2lnLTI=", CERT_DER)]));
        assert_eq!(check_record(&record, &entry(), &envelope(), CERT_DER), Ok(()));
    }

    #[test]
    fn time_is_checked_before_index() {
        let mut record = record(body("dsse", &[("c2lnLTI=", CERT_DER)]));
        record.integrated_time += 1;
        record.log_index += 1;
        assert!(matches!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::TimeMismatch { .. })
        ));
    }

    #[test]
    fn index_mismatch() {
        let mut record = record(body("dsse", &[("c2lnLTI=", CERT_DER)]));
        record.log_index = 43;
        assert_eq!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::IndexMismatch {
                expected: 42,
                actual: 43
            })
        );
    }

    #[test]
    fn wrong_kind() {
        let record = record(body("hashedrekord", &[("c2lnLTI=", CERT_DER)]));
        assert_eq!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::WrongEntryKind {
                kind: "hashedrekord".into()
            })
        );
    }

    #[test]
    fn undecodable_body() {
        let garbage = record("%%%".into());
        assert!(matches!(
            check_record(&garbage, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::MalformedBody { .. })
        ));

        // {"kind":"dsse"} has no signatures at all
        let bare = record("eyJraW5kIjoiZHNzZSJ9".into());
        assert_eq!(
            check_record(&bare, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::NoLoggedSignatures)
        );
    }

    #[test]
    fn unknown_signature() {
        let record = record(body("dsse", &[("c2lnLTM=", CERT_DER)]));
        assert!(matches!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::SignatureNotFound { .. })
        ));
    }

    #[test]
    fn other_certificate() {
        let record = record(body("dsse", &[("c2lnLTE=", OTHER_DER)]));
        assert_eq!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::VerifierMismatch)
        );
    }

    #[test]
    fn every_logged_signature_must_match() {
        let record = record(body(
            "dsse",
            &[("c2lnLTE=", CERT_DER), ("c2lnLTE=", OTHER_DER)],
        ));
        assert_eq!(
            check_record(&record, &entry(), &envelope(), CERT_DER),
            Err(TlogFailure::VerifierMismatch)
        );
    }

    #[tokio::test]
    async fn missing_record_is_entry_not_found() {
        let source: HashMap<u64, RemoteLogRecord> = HashMap::new();
        let check = verify_tlog_entry(&source, &entry(), &envelope(), CERT_DER)
            .await
            .unwrap();
        assert_eq!(
            check,
            TlogCheck::Failed(TlogFailure::EntryNotFound { log_index: 42 })
        );
        assert!(matches!(
            check.into_result(),
            Err(VerifyError::Tlog(TlogFailure::EntryNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn fetched_record_is_checked() {
        let mut source = HashMap::new();
        source.insert(42, record(body("dsse", &[("c2lnLTE=", CERT_DER)])));
        let check = verify_tlog_entry(&source, &entry(), &envelope(), CERT_DER)
            .await
            .unwrap();
        assert!(check.is_passed());
        assert!(check.failure().is_none());
    }
}
