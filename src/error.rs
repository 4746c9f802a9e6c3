use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    Api(String),

    #[error("authentication failed: {0} (check that the token has repo and admin:org scopes)")]
    Auth(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("rate limited by GitHub, retry after {0} seconds")]
    RateLimited(u64),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backup data error: {0}")]
    BackupData(String),

    #[error("state file error: {0}")]
    State(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors that abort the whole run instead of failing a single repository.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Auth(_)
                | Error::Network(_)
                | Error::RateLimited(_)
                | Error::State(_)
                | Error::Config(_)
                | Error::Io(_)
                | Error::InvalidHeader(_)
        )
    }

    /// Fatal errors that a re-run of the same command can recover from.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::RateLimited(_))
    }
}
