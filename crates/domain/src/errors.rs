use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    Encoding(String),

    #[error("Malformed DNS message: {0}")]
    MalformedMessage(String),

    #[error("Truncated DNS message: {0}")]
    TruncatedMessage(String),

    #[error("Query timeout waiting for {server}")]
    Timeout { server: String },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Resolution failed: {kind}")]
    Resolution { kind: ResolutionErrorKind },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    #[error("all upstream servers exhausted after {attempts} attempts")]
    AllServersExhausted { attempts: u32 },

    #[error("name does not exist (NXDOMAIN)")]
    NameNotFound,

    #[error("no records of the requested type")]
    NoRecords,

    #[error("no upstream servers configured")]
    NoServers,
}

impl DomainError {
    pub fn resolution(kind: ResolutionErrorKind) -> Self {
        Self::Resolution { kind }
    }

    /// Failures the multiplexer retries or fails over on. Anything else ends
    /// the dispatch immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage(_)
                | Self::TruncatedMessage(_)
                | Self::Timeout { .. }
                | Self::IoError(_)
        )
    }

    pub fn resolution_kind(&self) -> Option<ResolutionErrorKind> {
        match self {
            Self::Resolution { kind } => Some(*kind),
            _ => None,
        }
    }
}
