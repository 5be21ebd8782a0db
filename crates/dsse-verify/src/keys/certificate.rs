//! X.509 certificate helpers.

use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use super::KeyMaterialError;
use crate::pem::{self, PUBLIC_KEY_LABEL};

/// DER SubjectPublicKeyInfo of a DER certificate.
pub fn spki_der(cert_der: &[u8]) -> Result<Vec<u8>, KeyMaterialError> {
    let cert = Certificate::from_der(cert_der)?;
    Ok(cert.tbs_certificate.subject_public_key_info.to_der()?)
}

/// Accept either a DER certificate or a bare DER SPKI and return the SPKI.
pub fn spki_from_der_key_or_cert(der: &[u8]) -> Vec<u8> {
    spki_der(der).unwrap_or_else(|_| der.to_vec())
}

/// The certificate's public key as a `PUBLIC KEY` PEM block.
pub fn public_key_pem(cert_der: &[u8]) -> Result<String, KeyMaterialError> {
    Ok(pem::to_pem(PUBLIC_KEY_LABEL, &spki_der(cert_der)?))
}
