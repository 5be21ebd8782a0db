//! Digest-then-verify path for RSA keys, certificate keys and natively
//! imported EC keys.
//!
//! The digest is picked from the signature's `keyid`. A primary encoding is
//! tried first and a secondary one with the same digest if it fails:
//! PKCS#1 v1.5 then PSS for RSA, DER then fixed-width `r || s` for ECDSA.

use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::{decode_signature, first_success, SignatureError, VerificationOutcome};
use crate::keys::EcVerifyingKey;
use crate::types::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Case-insensitive substring match on the key id; SHA-256 when nothing matches.
    pub fn from_keyid(keyid: Option<&str>) -> Self {
        let keyid = keyid.unwrap_or_default().to_ascii_lowercase();
        if keyid.contains("sha1") {
            Self::Sha1
        } else if keyid.contains("sha384") {
            Self::Sha384
        } else if keyid.contains("sha512") {
            Self::Sha512
        } else {
            Self::Sha256
        }
    }

    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(message).to_vec(),
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
        }
    }

    fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            Self::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Self::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Self::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    fn pss(self) -> Pss {
        match self {
            Self::Sha1 => Pss::new::<Sha1>(),
            Self::Sha256 => Pss::new::<Sha256>(),
            Self::Sha384 => Pss::new::<Sha384>(),
            Self::Sha512 => Pss::new::<Sha512>(),
        }
    }
}

/// Keys accepted by the digest verifier.
#[derive(Debug, Clone, Copy)]
pub enum DigestKey<'a> {
    Rsa(&'a RsaPublicKey),
    Ec(&'a EcVerifyingKey),
}

pub fn verify(message: &[u8], signatures: &[Signature], key: DigestKey<'_>) -> VerificationOutcome {
    first_success(signatures, |signature| {
        let sig = decode_signature(signature)?;
        let algorithm = DigestAlgorithm::from_keyid(signature.keyid.as_deref());
        let hashed = algorithm.digest(message);

        match key {
            DigestKey::Rsa(key) => verify_rsa(key, algorithm, &hashed, &sig),
            DigestKey::Ec(key) => key
                .verify_prehash_der(&hashed, &sig)
                .or_else(|_| key.verify_prehash_fixed(&hashed, &sig)),
        }
    })
}

fn verify_rsa(
    key: &RsaPublicKey,
    algorithm: DigestAlgorithm,
    hashed: &[u8],
    sig: &[u8],
) -> Result<(), SignatureError> {
    key.verify(algorithm.pkcs1v15(), hashed, sig)
        .or_else(|_| key.verify(algorithm.pss(), hashed, sig))
        .map_err(|_| SignatureError::Mismatch {
            scheme: "rsa-pkcs1v15/pss",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_from_keyid() {
        assert_eq!(DigestAlgorithm::from_keyid(None), DigestAlgorithm::Sha256);
        assert_eq!(
            DigestAlgorithm::from_keyid(Some("KEY-ALIAS")),
            DigestAlgorithm::Sha256
        );
        assert_eq!(
            DigestAlgorithm::from_keyid(Some("legacy-SHA1")),
            DigestAlgorithm::Sha1
        );
        assert_eq!(
            DigestAlgorithm::from_keyid(Some("ecdsa-sha384")),
            DigestAlgorithm::Sha384
        );
        assert_eq!(
            DigestAlgorithm::from_keyid(Some("rsa-Sha512-prod")),
            DigestAlgorithm::Sha512
        );
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha1.digest(b"x").len(), 20);
        assert_eq!(DigestAlgorithm::Sha256.digest(b"x").len(), 32);
        assert_eq!(DigestAlgorithm::Sha384.digest(b"x").len(), 48);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"x").len(), 64);
    }
}
