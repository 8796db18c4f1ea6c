use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad credentials, an expired token, or acting on a story the user does not own.
    #[error("not authorized: {0}")]
    Auth(String),

    /// Rejected signup or submit fields, including a taken username.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::Auth(message),
            400 | 409 | 422 => Error::Validation(message),
            _ => Error::Api { status, message },
        }
    }

    pub fn not_logged_in() -> Self {
        Error::Auth("you need to log in first".into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Error::from_status(status.as_u16(), err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
