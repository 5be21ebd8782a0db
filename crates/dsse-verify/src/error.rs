//! Error types for envelope verification.

use crate::keys::{KeyFormat, ParseAttempt};
use crate::tlog::TlogFailure;

/// Verification errors.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Key text carries none of the recognized PEM markers.
    #[error("unsupported key format: no PUBLIC KEY, CERTIFICATE, RSA PUBLIC KEY or PGP PUBLIC KEY BLOCK marker found")]
    UnsupportedFormat,

    /// Every parsing strategy for the detected format failed.
    #[error("could not parse {format} key material ({})", render_attempts(.attempts))]
    KeyParse {
        format: KeyFormat,
        attempts: Vec<ParseAttempt>,
    },

    /// Envelope has an empty signature list.
    #[error("envelope carries no signatures")]
    NoSignatures,

    /// Envelope JSON is malformed or lacks payload / payloadType.
    #[error("invalid envelope: {message}")]
    InvalidEnvelope { message: String },

    /// Sigstore bundle JSON is malformed or lacks required material.
    #[error("invalid bundle: {message}")]
    InvalidBundle { message: String },

    /// Certificate bytes could not be decoded.
    #[error("certificate error: {message}")]
    Certificate { message: String },

    /// Payload is not valid base64.
    #[error("payload decode error: {message}")]
    PayloadDecode { message: String },

    /// Network failure while talking to the transparency log.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Invalid client configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A transparency-log entry failed cross-checking.
    #[error("transparency log check failed: {0}")]
    Tlog(#[from] TlogFailure),
}

impl VerifyError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Bad input
            Self::UnsupportedFormat => 1,
            Self::KeyParse { .. } => 1,
            Self::InvalidEnvelope { .. } => 1,
            Self::InvalidBundle { .. } => 1,
            Self::Certificate { .. } => 1,
            Self::PayloadDecode { .. } => 1,
            Self::Config { .. } => 1,

            // Verification failures
            Self::NoSignatures => 4,
            Self::Tlog(_) => 4,

            // Network
            Self::Transport { .. } => 5,
        }
    }

    /// Whether the error came from the network rather than the material.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

fn render_attempts(attempts: &[ParseAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;
