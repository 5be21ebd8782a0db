//! Signature verification dispatch.
//!
//! The envelope payload is decoded and PAE-encoded once, then routed to the
//! verifier family matching the [`KeyHandle`] tag. Every family walks the
//! signature list in order and stops at the first signature that verifies.

pub mod digest;
pub mod ecdsa;
pub mod pgp;

use tracing::debug;

use crate::error::{VerifyError, VerifyResult};
use crate::keys::KeyHandle;
use crate::pae;
use crate::payload::{decode_base64, decode_payload};
use crate::types::{Envelope, Signature};

pub use digest::{DigestAlgorithm, DigestKey};

/// Why a single signature did not verify.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not valid base64: {message}")]
    Encoding { message: String },

    #[error("malformed signature: {message}")]
    Malformed { message: String },

    #[error("signature does not verify ({scheme})")]
    Mismatch { scheme: &'static str },

    #[error("openpgp signature rejected: {message}")]
    OpenPgp { message: String },
}

/// A signature that failed, by envelope position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFailure {
    pub index: usize,
    pub keyid: Option<String>,
    pub error: SignatureError,
}

/// Result of checking every signature of an envelope against one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// Index of the first signature that verified.
    pub verified_index: Option<usize>,

    /// Signatures tried before the verified one (or all of them).
    pub failures: Vec<SignatureFailure>,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        self.verified_index.is_some()
    }
}

/// Verify an envelope against a resolved key.
///
/// Fails only with [`VerifyError::NoSignatures`]; per-signature problems are
/// reported in the returned outcome.
pub fn verify_envelope(envelope: &Envelope, key: &KeyHandle) -> VerifyResult<VerificationOutcome> {
    if envelope.signatures.is_empty() {
        return Err(VerifyError::NoSignatures);
    }

    let payload = decode_payload(&envelope.payload);
    let message = pae::encode(&envelope.payload_type, &payload);

    let outcome = match key {
        KeyHandle::Pgp { cert, .. } => pgp::verify(&message, &envelope.signatures, cert),
        KeyHandle::EcdsaFallback { key, .. } => ecdsa::verify(&message, &envelope.signatures, key),
        KeyHandle::Rsa { key, .. } | KeyHandle::CertificateWrapped { key, .. } => {
            digest::verify(&message, &envelope.signatures, DigestKey::Rsa(key))
        }
        KeyHandle::EcdsaNative { key, .. } => {
            digest::verify(&message, &envelope.signatures, DigestKey::Ec(key))
        }
    };

    debug!(
        tag = key.tag(),
        signatures = envelope.signatures.len(),
        verified_index = ?outcome.verified_index,
        "envelope verification finished"
    );
    Ok(outcome)
}

/// Boolean form of [`verify_envelope`].
pub fn verify_dsse_signature(envelope: &Envelope, key: &KeyHandle) -> VerifyResult<bool> {
    verify_envelope(envelope, key).map(|outcome| outcome.is_verified())
}

/// Run `check` over the signatures in order; the first `Ok` wins.
pub(crate) fn first_success<F>(signatures: &[Signature], mut check: F) -> VerificationOutcome
where
    F: FnMut(&Signature) -> Result<(), SignatureError>,
{
    let mut failures = Vec::new();
    let verified_index = signatures
        .iter()
        .enumerate()
        .find_map(|(index, signature)| match check(signature) {
            Ok(()) => Some(index),
            Err(error) => {
                debug!(index, keyid = ?signature.keyid, error = %error, "signature did not verify");
                failures.push(SignatureFailure {
                    index,
                    keyid: signature.keyid.clone(),
                    error,
                });
                None
            }
        });

    VerificationOutcome {
        verified_index,
        failures,
    }
}

pub(crate) fn decode_signature(signature: &Signature) -> Result<Vec<u8>, SignatureError> {
    decode_base64(&signature.sig).map_err(|e| SignatureError::Encoding {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs(values: &[&str]) -> Vec<Signature> {
        values.iter().map(|v| Signature::new(*v)).collect()
    }

    #[test]
    fn first_success_stops_at_first_ok() {
        let mut seen = Vec::new();
        let outcome = first_success(&sigs(&["a", "b", "c"]), |sig| {
            seen.push(sig.sig.clone());
            if sig.sig == "b" {
                Ok(())
            } else {
                Err(SignatureError::Mismatch { scheme: "test" })
            }
        });
        assert_eq!(outcome.verified_index, Some(1));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 0);
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn first_success_on_empty_list_is_unverified() {
        let outcome = first_success(&[], |_| Ok(()));
        assert!(!outcome.is_verified());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn decode_signature_reports_encoding() {
        let err = decode_signature(&Signature::new("invalid-signature")).unwrap_err();
        assert!(matches!(err, SignatureError::Encoding { .. }));
    }
}
