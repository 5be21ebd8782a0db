//! Wire types: DSSE envelopes, Sigstore bundles and Rekor log records.

use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, VerifyResult};

/// DSSE envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64-encoded payload.
    #[serde(default)]
    pub payload: String,

    /// Payload media type (e.g. "application/vnd.in-toto+json").
    #[serde(rename = "payloadType", default)]
    pub payload_type: String,

    /// Signatures, in envelope order.
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

/// A single DSSE signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Base64-encoded signature bytes.
    pub sig: String,

    /// Optional key hint. Also selects the digest for RSA and certificate keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyid: Option<String>,
}

impl Signature {
    pub fn new(sig: impl Into<String>) -> Self {
        Self {
            sig: sig.into(),
            keyid: None,
        }
    }

    pub fn with_keyid(mut self, keyid: impl Into<String>) -> Self {
        self.keyid = Some(keyid.into());
        self
    }
}

impl Envelope {
    /// Parse and validate an envelope from JSON text.
    pub fn from_json(json: &str) -> VerifyResult<Self> {
        let envelope: Self =
            serde_json::from_str(json).map_err(|e| VerifyError::InvalidEnvelope {
                message: format!("failed to parse envelope JSON: {}", e),
            })?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Reject envelopes without a payload or payload type.
    pub fn validate(&self) -> VerifyResult<()> {
        if self.payload.is_empty() {
            return Err(VerifyError::InvalidEnvelope {
                message: "missing payload".to_string(),
            });
        }
        if self.payload_type.is_empty() {
            return Err(VerifyError::InvalidEnvelope {
                message: "missing payloadType".to_string(),
            });
        }
        Ok(())
    }
}

/// Sigstore bundle (v0.1 through v0.3 DSSE bundles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigstoreBundle {
    #[serde(rename = "mediaType", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(rename = "verificationMaterial")]
    pub verification_material: VerificationMaterial,

    #[serde(rename = "dsseEnvelope")]
    pub dsse_envelope: Envelope,
}

impl SigstoreBundle {
    /// Parse a bundle from JSON text.
    pub fn from_json(json: &str) -> VerifyResult<Self> {
        serde_json::from_str(json).map_err(|e| VerifyError::InvalidBundle {
            message: format!("failed to parse bundle JSON: {}", e),
        })
    }
}

/// Key material and log entries of a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationMaterial {
    /// Leaf certificate (v0.3 bundles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateMaterial>,

    /// Certificate chain, leaf first (v0.1 / v0.2 bundles).
    #[serde(
        rename = "x509CertificateChain",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub x509_certificate_chain: Option<CertificateChain>,

    /// Transparency-log entries.
    #[serde(rename = "tlogEntries", default)]
    pub tlog_entries: Vec<TlogEntry>,
}

impl VerificationMaterial {
    /// DER bytes of the signing certificate, preferring `certificate` over the chain.
    pub fn leaf_certificate(&self) -> Option<&[u8]> {
        self.certificate
            .as_ref()
            .or_else(|| {
                self.x509_certificate_chain
                    .as_ref()
                    .and_then(|chain| chain.certificates.first())
            })
            .map(|cert| cert.raw_bytes.as_slice())
    }
}

/// A DER certificate, base64 in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMaterial {
    #[serde(rename = "rawBytes", with = "base64_bytes")]
    pub raw_bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateChain {
    #[serde(default)]
    pub certificates: Vec<CertificateMaterial>,
}

/// Transparency-log entry claimed by a bundle.
///
/// Sigstore serializes int64 fields as decimal strings; plain numbers are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlogEntry {
    #[serde(rename = "logIndex", with = "number_or_string")]
    pub log_index: u64,

    #[serde(rename = "integratedTime", with = "number_or_string")]
    pub integrated_time: i64,
}

impl TlogEntry {
    pub fn new(log_index: u64, integrated_time: i64) -> Self {
        Self {
            log_index,
            integrated_time,
        }
    }
}

/// Record returned by Rekor for one log index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLogRecord {
    #[serde(rename = "integratedTime")]
    pub integrated_time: i64,

    #[serde(rename = "logIndex")]
    pub log_index: u64,

    /// Base64-encoded canonical entry body.
    pub body: String,

    #[serde(rename = "logID", default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
}

/// Decoded record body. `spec` stays untyped until `kind` is known.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntryBody {
    pub kind: String,

    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub spec: serde_json::Value,
}

impl LogEntryBody {
    pub fn dsse_spec(&self) -> Result<DsseEntrySpec, serde_json::Error> {
        if self.spec.is_null() {
            return Ok(DsseEntrySpec::default());
        }
        DsseEntrySpec::deserialize(&self.spec)
    }
}

/// `spec` of a `dsse` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DsseEntrySpec {
    #[serde(default)]
    pub signatures: Vec<LoggedSignature>,
}

/// Signature recorded in the log, with its verifier (base64 PEM certificate).
#[derive(Debug, Clone, Deserialize)]
pub struct LoggedSignature {
    pub signature: String,
    pub verifier: String,
}

/// Rekor client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RekorConfig {
    /// Base URL for the transparency log.
    #[serde(default = "default_rekor_url")]
    pub url: String,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_rekor_url() -> String {
    "https://rekor.sigstore.dev".to_string()
}

impl Default for RekorConfig {
    fn default() -> Self {
        Self {
            url: default_rekor_url(),
            timeout_secs: None,
        }
    }
}

impl RekorConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `DSSE_VERIFY_REKOR_URL` | Rekor base URL |
    /// | `DSSE_VERIFY_REKOR_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("DSSE_VERIFY_REKOR_URL").unwrap_or_else(|_| default_rekor_url()),
            timeout_secs: std::env::var("DSSE_VERIFY_REKOR_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::payload::decode_base64(&text).map_err(D::Error::custom)
    }
}

mod number_or_string {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    pub(super) fn serialize<T: Display, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Number(value) => Ok(value),
            Raw::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }
}
