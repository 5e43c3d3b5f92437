use derive_more::{Display, Error, From};

#[derive(Debug, Display, From, Error)]
pub enum Error {
    #[display("IO error: {_0}")]
    #[from]
    Io(std::io::Error),

    #[display("HTTP error: {_0}")]
    #[from]
    Http(reqwest::Error),

    #[display("JSON error: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("Configuration error: {message}")]
    Config { message: String },

    /// The video platform answered with a non-success status.
    #[display("Video platform error {status}: {message}")]
    Platform { status: u16, message: String },

    #[display("Storage error for {path}: {message}")]
    Storage { path: String, message: String },

    /// The summarization service replied with a status other than 200/201.
    #[display("Summarization service returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[display("Summarization service error: {message}")]
    Remote { message: String },

    #[display("{message}")]
    Custom { message: String },
}

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn remote_status_mentions_code() {
        let err = Error::RemoteStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
