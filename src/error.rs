//! Errors reported by the container runtime adapter.

use bollard::errors::Error as BollardError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The requested container or image does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The runtime socket could not be reached.
    #[error("docker connection error: {0}")]
    Connection(String),

    /// Any other runtime API failure.
    #[error("docker api error: {0}")]
    Api(String),

    /// The registry could not be queried or returned no digest.
    #[error("registry error: {0}")]
    Registry(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }

    /// Maps a bollard error, turning HTTP 404 into [`RuntimeError::NotFound`].
    pub fn from_bollard(subject: &str, err: BollardError) -> Self {
        match err {
            BollardError::DockerResponseServerError {
                status_code: 404, ..
            } => RuntimeError::NotFound(subject.to_string()),
            other => RuntimeError::Api(format!("{}: {}", subject, other)),
        }
    }
}
