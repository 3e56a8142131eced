//! Error types shared by the clustering engines

use thiserror::Error;

/// Errors raised while configuring or running a clustering engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// Invalid `k`, or an unrecognized algorithm / center-mode token.
    /// Always detected before any computation starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A center was requested for an empty cluster. Engines never build empty
    /// clusters, so this signals a broken internal invariant.
    #[error("invalid cluster: {0}")]
    InvalidCluster(String),
}

/// Result alias used by the library
pub type Result<T> = std::result::Result<T, ClusterError>;
