//! ECDSA over the raw PAE, for keys from the dedicated curve parser.

use super::{decode_signature, first_success, VerificationOutcome};
use crate::keys::EcVerifyingKey;
use crate::types::Signature;

pub fn verify(message: &[u8], signatures: &[Signature], key: &EcVerifyingKey) -> VerificationOutcome {
    first_success(signatures, |signature| {
        let sig = decode_signature(signature)?;
        key.verify_der(message, &sig)
    })
}
