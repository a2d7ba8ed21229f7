//! Error types of the match pipeline.

use itertools::Itertools;

/// The client sent a malformed or semantically invalid query.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameters: {}", .0.iter().join(", "))]
    MissingParameters(Vec<&'static str>),
    #[error("Invalid assemblyId: {0}")]
    InvalidAssemblyId(String),
    #[error("Invalid referenceName: {0}")]
    InvalidReferenceName(String),
    #[error("Invalid start: {0}")]
    InvalidStart(String),
}

/// The caller could not be authenticated as a registered node.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid authorization header")]
    InvalidHeader,
    #[error("Invalid token scheme")]
    InvalidScheme,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Credential Check Error")]
    CredentialCheck,
    #[error("Invalid Client ID {0}")]
    InvalidClientId(String),
}

/// Any failure surfacing at the HTTP boundary.
#[derive(thiserror::Error, Debug)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Identity provider or count store failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
