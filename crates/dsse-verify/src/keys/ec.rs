//! Elliptic-curve keys on the NIST curves.

use std::borrow::Cow;
use std::fmt;

use ecdsa::signature::hazmat::PrehashVerifier;
use ecdsa::signature::Verifier;
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};
use spki::der::Decode;
use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};
use tracing::debug;

use super::{certificate, KeyMaterialError};
use crate::pem::{self, CERTIFICATE_LABEL, PUBLIC_KEY_LABEL};
use crate::verify::SignatureError;

const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Order in which certificate keys are imported when the curve is not known up front.
    pub const IMPORT_ORDER: [EcCurve; 3] = [EcCurve::P256, EcCurve::P384, EcCurve::P521];

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            Self::P256 => SECP256R1_OID,
            Self::P384 => SECP384R1_OID,
            Self::P521 => SECP521R1_OID,
        }
    }

    pub fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        Self::IMPORT_ORDER.into_iter().find(|curve| curve.oid() == oid)
    }

    /// Curve named by the parameters of an EC SubjectPublicKeyInfo.
    pub fn from_spki(spki_der: &[u8]) -> Result<Self, KeyMaterialError> {
        let info = SubjectPublicKeyInfoRef::from_der(spki_der)?;
        if info.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(KeyMaterialError::NotEcKey {
                oid: info.algorithm.oid.to_string(),
            });
        }
        let curve_oid = info.algorithm.parameters_oid()?;
        Self::from_oid(curve_oid).ok_or_else(|| KeyMaterialError::UnsupportedCurve {
            oid: curve_oid.to_string(),
        })
    }

    /// Import a DER SPKI as a verifying key on this curve.
    pub fn import(self, spki_der: &[u8]) -> Result<EcVerifyingKey, KeyMaterialError> {
        let key = match self {
            Self::P256 => {
                EcVerifyingKey::P256(p256::ecdsa::VerifyingKey::from_public_key_der(spki_der)?)
            }
            Self::P384 => {
                EcVerifyingKey::P384(p384::ecdsa::VerifyingKey::from_public_key_der(spki_der)?)
            }
            // p521 wraps the generic key in its own newtype
            Self::P521 => EcVerifyingKey::P521(
                ecdsa::VerifyingKey::<p521::NistP521>::from_public_key_der(spki_der)?.into(),
            ),
        };
        Ok(key)
    }

    /// Scalar field width in bytes.
    pub fn field_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        })
    }
}

/// ECDSA verifying key on one of the supported curves.
#[derive(Clone)]
pub enum EcVerifyingKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
}

impl EcVerifyingKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
            Self::P521(_) => EcCurve::P521,
        }
    }

    /// Left-pad a digest shorter than the field (SHA-256 on P-521) to the same integer value.
    fn field_prehash<'a>(&self, prehash: &'a [u8]) -> Cow<'a, [u8]> {
        let width = self.curve().field_size();
        if prehash.len() >= width {
            return Cow::Borrowed(prehash);
        }
        let mut padded = vec![0u8; width - prehash.len()];
        padded.extend_from_slice(prehash);
        Cow::Owned(padded)
    }

    /// Verify a DER signature over an already computed digest.
    pub fn verify_prehash_der(&self, prehash: &[u8], sig: &[u8]) -> Result<(), SignatureError> {
        let prehash = self.field_prehash(prehash);
        let prehash = prehash.as_ref();
        match self {
            Self::P256(vk) => {
                let sig = p256::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-der"))
            }
            Self::P384(vk) => {
                let sig = p384::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-der"))
            }
            Self::P521(vk) => {
                let sig = p521::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-der"))
            }
        }
    }

    /// Verify a fixed-width `r || s` signature over an already computed digest.
    pub fn verify_prehash_fixed(&self, prehash: &[u8], sig: &[u8]) -> Result<(), SignatureError> {
        let prehash = self.field_prehash(prehash);
        let prehash = prehash.as_ref();
        match self {
            Self::P256(vk) => {
                let sig = p256::ecdsa::Signature::from_slice(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-fixed"))
            }
            Self::P384(vk) => {
                let sig = p384::ecdsa::Signature::from_slice(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-fixed"))
            }
            Self::P521(vk) => {
                let sig = p521::ecdsa::Signature::from_slice(sig).map_err(malformed)?;
                vk.verify_prehash(prehash, &sig).map_err(|_| mismatch("ecdsa-fixed"))
            }
        }
    }

    /// Verify a DER signature over the message.
    ///
    /// SHA-256 is tried on every curve; P-384 and P-521 then retry with the
    /// curve's own digest.
    pub fn verify_der(&self, message: &[u8], sig: &[u8]) -> Result<(), SignatureError> {
        let prehash = Sha256::digest(message);
        match self.verify_prehash_der(&prehash, sig) {
            Err(SignatureError::Mismatch { .. }) if self.curve() != EcCurve::P256 => {
                self.verify_der_curve_digest(message, sig)
            }
            result => result,
        }
    }

    fn verify_der_curve_digest(&self, message: &[u8], sig: &[u8]) -> Result<(), SignatureError> {
        match self {
            Self::P256(vk) => {
                let sig = p256::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify(message, &sig).map_err(|_| mismatch("ecdsa-sha256"))
            }
            Self::P384(vk) => {
                let sig = p384::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify(message, &sig).map_err(|_| mismatch("ecdsa-sha384"))
            }
            Self::P521(vk) => {
                let sig = p521::ecdsa::Signature::from_der(sig).map_err(malformed)?;
                vk.verify(message, &sig).map_err(|_| mismatch("ecdsa-sha512"))
            }
        }
    }
}

impl fmt::Debug for EcVerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcVerifyingKey({})", self.curve())
    }
}

fn malformed(err: ecdsa::Error) -> SignatureError {
    SignatureError::Malformed {
        message: err.to_string(),
    }
}

fn mismatch(scheme: &'static str) -> SignatureError {
    SignatureError::Mismatch { scheme }
}

/// Key from a `PUBLIC KEY` block, or from a certificate's SPKI, on the curve its OID names.
pub(crate) fn parse_pem(text: &str) -> Result<EcVerifyingKey, KeyMaterialError> {
    let spki = match pem::decode_block(text, PUBLIC_KEY_LABEL) {
        Ok(der) => der,
        Err(pem::PemError::MissingBlock { .. }) => {
            let cert = pem::decode_block(text, CERTIFICATE_LABEL)?;
            certificate::spki_der(&cert)?
        }
        Err(e) => return Err(e.into()),
    };
    let curve = EcCurve::from_spki(&spki)?;
    curve.import(&spki)
}

/// Key from certificate (or SPKI) DER, trying each curve in [`EcCurve::IMPORT_ORDER`].
pub(crate) fn import_native(der: &[u8]) -> Result<EcVerifyingKey, KeyMaterialError> {
    let spki = certificate::spki_from_der_key_or_cert(der);
    for curve in EcCurve::IMPORT_ORDER {
        match curve.import(&spki) {
            Ok(key) => return Ok(key),
            Err(e) => debug!(curve = %curve, error = %e, "curve import failed"),
        }
    }
    Err(KeyMaterialError::NoMatchingCurve)
}

#[cfg(test)]
mod tests {
    use super::*;

    const P256_SPKI: &str = include_str!("../../tests/fixtures/ecdsa_p256_public_key.pem");
    const P384_CERT: &str = include_str!("../../tests/fixtures/ecdsa_p384_certificate.pem");
    const P521_SPKI: &str = include_str!("../../tests/fixtures/ecdsa_p521_public_key.pem");
    const RSA_SPKI: &str = include_str!("../../tests/fixtures/rsa_public_key.pem");

    #[test]
    fn curve_comes_from_spki_oid() {
        let der = pem::decode_block(P521_SPKI, PUBLIC_KEY_LABEL).unwrap();
        assert_eq!(EcCurve::from_spki(&der).unwrap(), EcCurve::P521);

        let der = pem::decode_block(P256_SPKI, PUBLIC_KEY_LABEL).unwrap();
        assert_eq!(EcCurve::from_spki(&der).unwrap(), EcCurve::P256);
    }

    #[test]
    fn rsa_spki_is_not_ec() {
        let der = pem::decode_block(RSA_SPKI, PUBLIC_KEY_LABEL).unwrap();
        assert!(matches!(
            EcCurve::from_spki(&der),
            Err(KeyMaterialError::NotEcKey { .. })
        ));
        assert!(matches!(
            import_native(&der),
            Err(KeyMaterialError::NoMatchingCurve)
        ));
    }

    #[test]
    fn native_import_walks_curves_in_order() {
        let der = pem::decode_block(P384_CERT, CERTIFICATE_LABEL).unwrap();
        assert_eq!(import_native(&der).unwrap().curve(), EcCurve::P384);
        assert!(EcCurve::P256.import(&certificate::spki_der(&der).unwrap()).is_err());
    }

    #[test]
    fn pem_parser_reads_certificates_too() {
        assert_eq!(parse_pem(P384_CERT).unwrap().curve(), EcCurve::P384);
        assert_eq!(parse_pem(P256_SPKI).unwrap().curve(), EcCurve::P256);
    }

    #[test]
    fn debug_names_the_curve() {
        let key = parse_pem(P521_SPKI).unwrap();
        assert_eq!(format!("{:?}", key), "EcVerifyingKey(P-521)");
        let handle = crate::keys::resolve(P521_SPKI).unwrap();
        assert!(format!("{:?}", handle).contains("EcVerifyingKey(P-521)"));
    }

    #[test]
    fn short_digest_is_padded_to_field_width() {
        let key = parse_pem(P521_SPKI).unwrap();
        let padded = key.field_prehash(&[0xab; 32]);
        assert_eq!(padded.len(), 66);
        assert!(padded[..34].iter().all(|b| *b == 0));
        assert_eq!(&padded[34..], &[0xab; 32][..]);

        let p256 = parse_pem(P256_SPKI).unwrap();
        assert!(matches!(p256.field_prehash(&[1; 32]), Cow::Borrowed(_)));
    }

    #[test]
    fn oid_lookup() {
        assert_eq!(EcCurve::from_oid(SECP384R1_OID), Some(EcCurve::P384));
        assert_eq!(EcCurve::from_oid(EC_PUBLIC_KEY_OID), None);
    }
}
