//! RSA key parsing.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

use super::KeyMaterialError;
use crate::pem::{self, PUBLIC_KEY_LABEL, RSA_PUBLIC_KEY_LABEL};

pub(crate) fn parse_spki(text: &str) -> Result<RsaPublicKey, KeyMaterialError> {
    let der = pem::decode_block(text, PUBLIC_KEY_LABEL)?;
    from_spki_der(&der)
}

pub(crate) fn parse_pkcs1(text: &str) -> Result<RsaPublicKey, KeyMaterialError> {
    let der = pem::decode_block(text, RSA_PUBLIC_KEY_LABEL)?;
    Ok(RsaPublicKey::from_pkcs1_der(&der)?)
}

pub(crate) fn from_spki_der(spki_der: &[u8]) -> Result<RsaPublicKey, KeyMaterialError> {
    Ok(RsaPublicKey::from_public_key_der(spki_der)?)
}
