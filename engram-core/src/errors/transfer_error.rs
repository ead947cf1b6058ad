/// Export/import subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("signature mismatch: expected {expected}, computed {computed}")]
    SignatureMismatch { expected: String, computed: String },

    #[error("unsupported document version {found}, this build reads version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("namespace violation in document scope '{scope}': {reason}")]
    NamespaceViolation { scope: String, reason: String },

    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },
}
