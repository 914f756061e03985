//! Error taxonomy shared by the staging, catalog and approval workflows.

use thiserror::Error;

/// Failure of a user-triggered operation.
///
/// Validation and identity failures are detected locally before anything is
/// written. `Remote` carries a data-layer failure whose message is shown to
/// the user as-is.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Could not resolve the signed-in user. Please log in again.")]
    Unauthenticated,

    #[error("Your account is {0}. Visits cannot be submitted until an administrator activates it.")]
    AccountInactive(&'static str),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_pass_message_through() {
        let err = TrackerError::from(anyhow::anyhow!("FOREIGN KEY constraint failed"));
        assert_eq!(err.to_string(), "FOREIGN KEY constraint failed");
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(
            TrackerError::NotFound("Medicine".into()).to_string(),
            "Medicine not found"
        );
    }
}
