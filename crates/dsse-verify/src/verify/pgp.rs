//! OpenPGP detached signatures over the PAE.

use std::time::SystemTime;

use anyhow::anyhow;
use sequoia_openpgp::parse::stream::{
    DetachedVerifierBuilder, MessageLayer, MessageStructure, VerificationHelper,
};
use sequoia_openpgp::parse::Parse;
use sequoia_openpgp::policy::StandardPolicy;
use sequoia_openpgp::{Cert, KeyHandle as PgpKeyHandle};

use super::{decode_signature, first_success, SignatureError, VerificationOutcome};
use crate::types::Signature;

/// Hands the one resolved certificate to the verifier and accepts any good signature.
struct SingleCertHelper<'a> {
    cert: &'a Cert,
}

impl VerificationHelper for SingleCertHelper<'_> {
    fn get_certs(&mut self, _ids: &[PgpKeyHandle]) -> sequoia_openpgp::Result<Vec<Cert>> {
        Ok(vec![self.cert.clone()])
    }

    fn check(&mut self, structure: MessageStructure<'_>) -> sequoia_openpgp::Result<()> {
        for layer in structure.into_iter() {
            if let MessageLayer::SignatureGroup { results } = layer {
                if results.iter().any(|result| result.is_ok()) {
                    return Ok(());
                }
                let reasons: Vec<String> = results
                    .iter()
                    .filter_map(|result| result.as_ref().err())
                    .map(ToString::to_string)
                    .collect();
                return Err(anyhow!("no good signature: {}", reasons.join("; ")));
            }
        }
        Err(anyhow!("no signature found"))
    }
}

pub fn verify(message: &[u8], signatures: &[Signature], cert: &Cert) -> VerificationOutcome {
    let policy = StandardPolicy::new();
    first_success(signatures, |signature| {
        let sig = decode_signature(signature)?;
        verify_detached(message, &sig, cert, &policy).map_err(|e| SignatureError::OpenPgp {
            message: e.to_string(),
        })
    })
}

fn verify_detached(
    message: &[u8],
    sig: &[u8],
    cert: &Cert,
    policy: &StandardPolicy<'_>,
) -> sequoia_openpgp::Result<()> {
    let helper = SingleCertHelper { cert };
    let mut verifier = DetachedVerifierBuilder::from_bytes(sig)?.with_policy(
        policy,
        None::<SystemTime>,
        helper,
    )?;
    verifier.verify_bytes(message)
}
