//! Payload decoding and display.

use base64::engine::general_purpose::{GeneralPurpose, STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::{DecodeError, Engine};
use tracing::warn;

use crate::error::{VerifyError, VerifyResult};

const ENGINES: [&GeneralPurpose; 4] = [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD];

/// Decode base64 in any of the standard or URL-safe alphabets, padded or not.
/// Embedded whitespace (line-wrapped input) is ignored.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let mut last_err = DecodeError::InvalidLength(compact.len());
    for engine in ENGINES {
        match engine.decode(&compact) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

/// Decode an envelope payload, failing on invalid base64.
pub fn decode_payload_strict(payload: &str) -> VerifyResult<Vec<u8>> {
    decode_base64(payload).map_err(|e| VerifyError::PayloadDecode {
        message: format!("payload is not valid base64: {}", e),
    })
}

/// Decode an envelope payload. Text that is not base64 is used verbatim.
pub fn decode_payload(payload: &str) -> Vec<u8> {
    match decode_payload_strict(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "using raw payload text");
            payload.as_bytes().to_vec()
        }
    }
}

/// Human-readable payload: pretty-printed JSON, or the decoded text as-is.
pub fn extract_payload(payload: &str) -> String {
    let bytes = decode_payload(payload);
    let text = String::from_utf8_lossy(&bytes);

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.into_owned()),
        Err(_) => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_alphabet() {
        assert_eq!(decode_base64("aGk/Pz8=").unwrap(), b"hi???");
        assert_eq!(decode_base64("aGk/Pz8").unwrap(), b"hi???");
        assert_eq!(decode_base64("aGk_Pz8=").unwrap(), b"hi???");
        assert_eq!(decode_base64("aGk_Pz8").unwrap(), b"hi???");
        assert_eq!(decode_base64("aGk/\nPz8=\n").unwrap(), b"hi???");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_base64("invalid-signature").is_err());
        assert!(decode_payload_strict("%%%").is_err());
    }

    #[test]
    fn raw_text_survives_decode_failure() {
        assert_eq!(decode_payload("not base64!"), b"not base64!");
    }

    #[test]
    fn extract_pretty_prints_json_in_source_order() {
        // {"b":1,"a":[true]}
        let out = extract_payload("eyJiIjoxLCJhIjpbdHJ1ZV19");
        assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}");
    }

    #[test]
    fn extract_returns_plain_text() {
        // "hello world"
        assert_eq!(extract_payload("aGVsbG8gd29ybGQ="), "hello world");
    }
}
