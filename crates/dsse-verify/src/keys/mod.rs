//! Key resolution: classify PEM-ish text and parse it into a [`KeyHandle`].
//!
//! Each recognized format owns an ordered list of [`ParseStrategy`] values.
//! Strategies run in order, the first success wins, and every failure is
//! kept so a total failure can report all of them.

pub mod certificate;
pub mod ec;
pub mod pgp;
pub mod rsa;

use std::fmt;

use ::rsa::RsaPublicKey;
use sequoia_openpgp::Cert;
use tracing::debug;

use crate::error::{VerifyError, VerifyResult};
use crate::pem::{
    self, CERTIFICATE_LABEL, PGP_PUBLIC_KEY_LABEL, PUBLIC_KEY_LABEL, RSA_PUBLIC_KEY_LABEL,
};

pub use ec::{EcCurve, EcVerifyingKey};

/// Key encodings recognized by their PEM boundary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    PublicKey,
    Certificate,
    RsaPublicKey,
    PgpPublicKeyBlock,
}

impl KeyFormat {
    /// Detection priority. Only the first format whose marker is present is used.
    pub const DETECTION_ORDER: [KeyFormat; 4] = [
        KeyFormat::PublicKey,
        KeyFormat::Certificate,
        KeyFormat::RsaPublicKey,
        KeyFormat::PgpPublicKeyBlock,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PublicKey => PUBLIC_KEY_LABEL,
            Self::Certificate => CERTIFICATE_LABEL,
            Self::RsaPublicKey => RSA_PUBLIC_KEY_LABEL,
            Self::PgpPublicKeyBlock => PGP_PUBLIC_KEY_LABEL,
        }
    }

    /// Full `-----BEGIN ...-----` line for this format.
    pub fn marker(self) -> String {
        pem::begin_marker(self.label())
    }

    pub fn detect(text: &str) -> Option<Self> {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|format| text.contains(&format.marker()))
    }

    /// Parsing strategies for this format, in the order they are tried.
    pub fn strategies(self) -> &'static [ParseStrategy] {
        match self {
            Self::PublicKey => &[ParseStrategy::RsaSpki, ParseStrategy::EcPem],
            Self::Certificate => &[
                ParseStrategy::RsaCertificate,
                ParseStrategy::EcCertificateDer,
                ParseStrategy::EcPem,
            ],
            Self::RsaPublicKey => &[ParseStrategy::RsaPkcs1],
            Self::PgpPublicKeyBlock => &[ParseStrategy::PgpArmored],
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One way of turning key text into a [`KeyHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseStrategy {
    /// RSA SubjectPublicKeyInfo in a `PUBLIC KEY` block.
    RsaSpki,
    /// Elliptic-curve key from a `PUBLIC KEY` or `CERTIFICATE` block, curve taken from the SPKI.
    EcPem,
    /// RSA key inside an X.509 certificate.
    RsaCertificate,
    /// Certificate DER imported on P-256, P-384 then P-521.
    EcCertificateDer,
    /// PKCS#1 `RSA PUBLIC KEY` block.
    RsaPkcs1,
    /// ASCII-armored OpenPGP certificate.
    PgpArmored,
}

impl ParseStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::RsaSpki => "rsa-spki",
            Self::EcPem => "ec-pem",
            Self::RsaCertificate => "rsa-certificate",
            Self::EcCertificateDer => "ec-certificate-der",
            Self::RsaPkcs1 => "rsa-pkcs1",
            Self::PgpArmored => "pgp-armored",
        }
    }

    fn parse(self, text: &str) -> Result<KeyHandle, KeyMaterialError> {
        let source = text.to_string();
        let handle = match self {
            Self::RsaSpki => KeyHandle::Rsa {
                key: rsa::parse_spki(text)?,
                source,
            },
            Self::RsaPkcs1 => KeyHandle::Rsa {
                key: rsa::parse_pkcs1(text)?,
                source,
            },
            Self::EcPem => KeyHandle::EcdsaFallback {
                key: ec::parse_pem(text)?,
                source,
            },
            Self::RsaCertificate => {
                let der = pem::decode_block(text, CERTIFICATE_LABEL)?;
                let spki = certificate::spki_der(&der)?;
                KeyHandle::CertificateWrapped {
                    key: rsa::from_spki_der(&spki)?,
                    source,
                }
            }
            Self::EcCertificateDer => {
                let der = pem::decode_block(text, CERTIFICATE_LABEL)?;
                KeyHandle::EcdsaNative {
                    key: ec::import_native(&der)?,
                    source,
                }
            }
            Self::PgpArmored => KeyHandle::Pgp {
                cert: Box::new(pgp::parse_armored(text)?),
                source,
            },
        };
        Ok(handle)
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed strategy and why it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAttempt {
    pub strategy: ParseStrategy,
    pub reason: String,
}

impl ParseAttempt {
    pub fn new(strategy: ParseStrategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Errors raised inside individual strategies.
#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error(transparent)]
    Pem(#[from] pem::PemError),

    #[error("invalid SubjectPublicKeyInfo: {0}")]
    Spki(#[from] spki::Error),

    #[error("invalid DER: {0}")]
    Der(#[from] x509_cert::der::Error),

    #[error("invalid PKCS#1 key: {0}")]
    Pkcs1(#[from] ::rsa::pkcs1::Error),

    #[error("key algorithm {oid} is not an elliptic-curve key")]
    NotEcKey { oid: String },

    #[error("unsupported curve {oid}")]
    UnsupportedCurve { oid: String },

    #[error("key does not import on any supported curve")]
    NoMatchingCurve,

    #[error("openpgp: {0}")]
    OpenPgp(#[from] anyhow::Error),
}

/// Parsed verification key, tagged by the verifier family that consumes it.
///
/// Built fresh per call; every variant keeps the text it was parsed from.
#[derive(Debug, Clone)]
pub enum KeyHandle {
    /// RSA key from SPKI or PKCS#1. Digest verifier.
    Rsa { key: RsaPublicKey, source: String },
    /// EC key imported from certificate DER. Digest verifier.
    EcdsaNative { key: EcVerifyingKey, source: String },
    /// EC key from the dedicated curve parser. Verified over the raw message.
    EcdsaFallback { key: EcVerifyingKey, source: String },
    /// OpenPGP certificate.
    Pgp { cert: Box<Cert>, source: String },
    /// RSA key taken from an X.509 certificate. Digest verifier.
    CertificateWrapped { key: RsaPublicKey, source: String },
}

impl KeyHandle {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "rsa",
            Self::EcdsaNative { .. } => "ecdsa-native",
            Self::EcdsaFallback { .. } => "ecdsa-fallback",
            Self::Pgp { .. } => "pgp",
            Self::CertificateWrapped { .. } => "certificate-wrapped",
        }
    }

    /// The key text this handle was resolved from.
    pub fn source(&self) -> &str {
        match self {
            Self::Rsa { source, .. }
            | Self::EcdsaNative { source, .. }
            | Self::EcdsaFallback { source, .. }
            | Self::Pgp { source, .. }
            | Self::CertificateWrapped { source, .. } => source,
        }
    }
}

/// Resolve key text into a [`KeyHandle`].
///
/// Fails with [`VerifyError::UnsupportedFormat`] when no marker is present, or
/// [`VerifyError::KeyParse`] listing every strategy attempt when none succeeds.
pub fn resolve(text: &str) -> VerifyResult<KeyHandle> {
    let format = KeyFormat::detect(text).ok_or(VerifyError::UnsupportedFormat)?;

    let mut attempts = Vec::new();
    for &strategy in format.strategies() {
        match strategy.parse(text) {
            Ok(handle) => {
                debug!(format = %format, strategy = %strategy, tag = handle.tag(), "resolved key");
                return Ok(handle);
            }
            Err(e) => {
                debug!(format = %format, strategy = %strategy, error = %e, "key strategy failed");
                attempts.push(ParseAttempt::new(strategy, e.to_string()));
            }
        }
    }

    Err(VerifyError::KeyParse { format, attempts })
}
