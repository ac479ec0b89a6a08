use serde::Serialize;

use crate::models::NotificationKind;
use crate::store::StoreError;

/// Serializable error body handed to the presentation layer.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// All failures here are expected user-input conditions; the controller
/// surfaces each as a transient notification and nothing is retried.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("required field is empty: {0}")]
    Validation(&'static str),
    #[error("already voted for this option")]
    AlreadyVoted,
    #[error("not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Error::NotFound,
        }
    }
}

impl Error {
    /// Notification severity used when surfacing the error to the user.
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Error::Validation(_) | Error::NotFound => NotificationKind::Error,
            Error::AlreadyVoted => NotificationKind::Warning,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody { error: self.to_string() }
    }
}
