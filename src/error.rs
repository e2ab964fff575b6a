use thiserror::Error;

/// Failure of the one-shot startup fetch. Always fatal.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to retrieve response from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream {url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced to API callers as `{ error: { message } }`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("must provide a valid authorization token in the headers")]
    Unauthorized,

    #[error("no user with the user id ({0}) found")]
    UserNotFound(String),

    #[error("there was not a user found for both user id ({0}) and user id ({1})")]
    UsersNotFound(String, String),

    #[error("no chat with the chat id ({0}) found")]
    ChatNotFound(String),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
