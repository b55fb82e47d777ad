use serde::Serialize;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FgtErrorKind {
    InvalidConfig,
    Transport,
    Timeout,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct FgtError {
    pub kind: FgtErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FgtError {
    pub fn new(kind: FgtErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(FgtErrorKind::InvalidConfig, "INVALID_CONFIG", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FgtErrorKind::Transport, "TRANSPORT", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FgtErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FgtErrorKind::Internal, "INTERNAL", message)
    }

    /// Transport faults and timeouts never escape a verb; they become `Outcome::NoResponse`.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.kind, FgtErrorKind::Transport | FgtErrorKind::Timeout)
    }
}

impl fmt::Display for FgtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for FgtError {}

impl From<std::io::Error> for FgtError {
    fn from(err: std::io::Error) -> Self {
        FgtError::internal(err.to_string())
    }
}
