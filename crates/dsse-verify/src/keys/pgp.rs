//! OpenPGP certificate parsing.

use sequoia_openpgp::parse::Parse;
use sequoia_openpgp::Cert;

use super::KeyMaterialError;
use crate::pem::{self, PGP_PUBLIC_KEY_LABEL};

/// Parse the armored certificate starting at the `PGP PUBLIC KEY BLOCK` marker.
pub(crate) fn parse_armored(text: &str) -> Result<Cert, KeyMaterialError> {
    let start = text
        .find(&pem::begin_marker(PGP_PUBLIC_KEY_LABEL))
        .ok_or_else(|| pem::PemError::MissingBlock {
            label: PGP_PUBLIC_KEY_LABEL.to_string(),
        })?;
    Ok(Cert::from_bytes(text[start..].as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PGP_KEY: &str = include_str!("../../tests/fixtures/pgp_public_key.asc");

    #[test]
    fn parses_armored_block_after_leading_text() {
        let text = format!("exported from keyserver\n\n{}", PGP_KEY);
        let cert = parse_armored(&text).unwrap();
        assert!(cert.keys().count() >= 1);
    }

    #[test]
    fn truncated_armor_fails() {
        let truncated = &PGP_KEY[..PGP_KEY.len() / 2];
        assert!(matches!(
            parse_armored(truncated),
            Err(KeyMaterialError::OpenPgp(_))
        ));
    }
}
