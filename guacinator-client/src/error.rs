use guacinator_api::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("talking to Guacamole: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid Guacamole URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0:?} cannot be used as a path segment")]
    InvalidPathSegment(String),

    #[error("Guacamole answered {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("user {username} was created but could not be made an administrator")]
    PartialAdmin {
        username: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The gateway-side error this boils down to, if any
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            Error::PartialAdmin { source, .. } => source.api(),
            _ => None,
        }
    }
}
