use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur when using the VanceAI SDK.
#[derive(Error, Debug)]
pub enum VanceError {
    /// A local file could not be read or written.
    #[error("file error for {}: {message}", path.display())]
    File { path: PathBuf, message: String },

    /// A parameter was rejected before any network call was made
    /// (oversized upload, scale outside the supported set, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A job config template was missing, malformed, or an override
    /// violated the module's documented constraints.
    #[error("config error: {0}")]
    Config(String),

    /// The service answered with a non-2xx HTTP status.
    #[error("remote error {code}: {message}")]
    Remote { code: u16, message: &'static str },

    /// The service response was malformed, or the job reported a fatal status.
    #[error("transform failed: {0}")]
    Transform(String),

    /// The polling budget ran out before the job finished.
    #[error("timeout exceeded for transform id {trans_id}")]
    Timeout { trans_id: String },

    /// The source image's dimensions could not be read.
    #[error("image error for {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    /// A transport-level HTTP error from reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A convenience alias for `Result<T, VanceError>`.
pub type Result<T> = std::result::Result<T, VanceError>;

/// Error codes documented for the web API.
const ERROR_CODES: &[(u16, &str)] = &[
    (10001, "Illegal parameter"),
    (10010, "Internal error"),
    (10011, "File does not exist"),
    (10012, "Job exceeds limitation"),
    (10013, "jconfig parse error"),
    (10014, "Job failed for an unknown reason"),
    (30001, "Invalid api token"),
    (30004, "Limit exceeded"),
];

/// Look up the documented description for a service error code.
///
/// Codes the table does not know map to `"Unknown error"`.
pub fn error_message(code: u16) -> &'static str {
    ERROR_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, m)| *m)
        .unwrap_or("Unknown error")
}

impl VanceError {
    pub(crate) fn remote(code: u16) -> Self {
        VanceError::Remote {
            code,
            message: error_message(code),
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        VanceError::File {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        VanceError::Image {
            path: path.into(),
            message: message.into(),
        }
    }
}
