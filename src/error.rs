use derive_more::{Display, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{_0}")]
    Custom(String),

    /// Upstream page or payload could not be retrieved in the expected form.
    #[display("retrieval failed: {_0}")]
    #[from(skip)]
    Retrieval(String),

    /// An upstream JSON document lacked a field, or had it with the wrong type.
    #[display("schema mismatch at `{path}`")]
    #[from(skip)]
    SchemaMismatch { path: String },

    #[display("{service} returned HTTP {status}: {body}")]
    #[from(skip)]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[display("{_0}")]
    Io(std::io::Error),

    #[display("{_0}")]
    Json(serde_json::Error),

    #[display("{_0}")]
    Http(reqwest::Error),

    #[display("{_0}")]
    Regex(regex::Error),
}

impl Error {
    pub fn custom(val: impl std::fmt::Display) -> Self {
        Self::Custom(val.to_string())
    }

    pub fn retrieval(val: impl std::fmt::Display) -> Self {
        Self::Retrieval(val.to_string())
    }

    pub fn schema(path: impl Into<String>) -> Self {
        Self::SchemaMismatch { path: path.into() }
    }
}

impl From<&str> for Error {
    fn from(val: &str) -> Self {
        Self::Custom(val.to_string())
    }
}

impl std::error::Error for Error {}
