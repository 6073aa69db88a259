use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Every failure the submission pipeline can report to the user.
#[derive(Debug, ThisError)]
pub enum SubmitError {
    /// Bad or conflicting command-line input, including institution/project
    /// choices that cannot be inferred from the user profile.
    #[error("{0}")]
    Usage(String),

    #[error("The server should be 'http://localhost:<port>' or 'https://<cgap-hostname>', not: {0}")]
    InvalidServer(String),

    #[error(
        "Your credentials were rejected by {server}. Either this is not the right server, \
         or you need to obtain up-to-date access keys."
    )]
    PermissionDenied { server: String },

    #[error("The file '{}' does not exist.", .0.display())]
    MissingBundle(PathBuf),

    #[error("Access keys: {0}")]
    Keys(String),

    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response from portal: {0}")]
    MalformedResponse(String),

    #[error("Unable to obtain upload credentials for file {}.", .0.display())]
    UploadCredentials(PathBuf),

    #[error("Upload specification is not in good form. {0}")]
    BadUploadSpecification(String),

    #[error("Failed to launch upload command: {0}")]
    UploadLaunch(String),

    #[error("Upload failed with exit code {0}")]
    UploadFailed(i32),

    #[error("Aborting submission.")]
    Aborted,

    #[error("Timed out after {0} tries.")]
    TimedOut(u32),
}

impl SubmitError {
    /// Errors whose message the user has already seen on the console.
    pub fn already_reported(&self) -> bool {
        matches!(self, SubmitError::Aborted | SubmitError::TimedOut(_))
    }
}

pub type Result<T, E = SubmitError> = std::result::Result<T, E>;
