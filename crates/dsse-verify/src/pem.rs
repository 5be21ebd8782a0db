//! PEM helpers: marker detection, block extraction, certificate armor.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::payload::decode_base64;

pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
pub const PGP_PUBLIC_KEY_LABEL: &str = "PGP PUBLIC KEY BLOCK";

const LINE_WIDTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PemError {
    #[error("no {label} block found")]
    MissingBlock { label: String },

    #[error("invalid base64 in PEM body: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub fn begin_marker(label: &str) -> String {
    format!("-----BEGIN {}-----", label)
}

pub fn end_marker(label: &str) -> String {
    format!("-----END {}-----", label)
}

/// Body text between the first `BEGIN label` and the following `END label`.
pub fn extract_block<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let begin = begin_marker(label);
    let end = end_marker(label);

    let start = text.find(&begin)? + begin.len();
    let len = text[start..].find(&end)?;
    Some(&text[start..start + len])
}

/// DER bytes of the first `label` block.
pub fn decode_block(text: &str, label: &str) -> Result<Vec<u8>, PemError> {
    let body = extract_block(text, label).ok_or_else(|| PemError::MissingBlock {
        label: label.to_string(),
    })?;
    Ok(decode_base64(body)?)
}

/// Remove certificate armor and all whitespace, leaving the bare base64 body.
pub fn strip_certificate_content(text: &str) -> String {
    text.replace(&begin_marker(CERTIFICATE_LABEL), "")
        .replace(&end_marker(CERTIFICATE_LABEL), "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Render DER bytes as PEM with 64-column lines and a trailing newline.
pub fn to_pem(label: &str, der: &[u8]) -> String {
    let body = BASE64.encode(der);

    let mut pem = begin_marker(label);
    pem.push('\n');
    // base64 output is ASCII, so byte chunks are char boundaries
    for line in body.as_bytes().chunks(LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(&end_marker(label));
    pem.push('\n');
    pem
}
