//! # contract: seams between the submission pipeline and the outside world
//!
//! The pipeline talks to three collaborators, each behind a trait:
//!
//! - [`Portal`]: the CGAP portal's JSON-over-HTTP API (user record, ingestion
//!   submissions, upload credentials).
//! - [`Console`]: the person running the command (progress lines, yes/no questions).
//! - [`CloudCopier`]: the cloud storage copy tool that moves data files to the
//!   pre-signed upload location.
//!
//! The CLI crate supplies real implementations. Tests use the `mockall` mocks
//! generated here (exported under the `test-export-mocks` feature) and
//! [`crate::testing::RecordingConsole`].
//!
//! Payload types mirror the portal's JSON. The portal owns their schema, so
//! only the fields the client reads are modelled and everything else is ignored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::Result;

/// A `{"@id": ...}` link to another portal item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
}

/// The subset of the `/me` record used to infer submission defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Institutions this user may submit on behalf of.
    #[serde(default)]
    pub submits_for: Vec<ItemRef>,
    #[serde(default)]
    pub project: Option<ItemRef>,
}

/// Everything posted to `/submit_for_ingestion` for one bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSubmission {
    pub bundle: PathBuf,
    pub institution: String,
    pub project: String,
    pub validate_only: bool,
}

impl BundleSubmission {
    pub const INGESTION_TYPE: &'static str = "metadata_bundle";

    /// Text fields of the multipart form, in the order the portal documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ingestion_type", Self::INGESTION_TYPE.to_string()),
            ("institution", self.institution.clone()),
            ("project", self.project.clone()),
            ("validate_only", self.validate_only.to_string()),
        ]
    }
}

/// One file the portal expects to receive after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSpec {
    pub uuid: String,
    pub filename: String,
}

/// Short-lived credentials issued by the portal for a single file upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadCredentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    pub upload_url: String,
}

impl UploadCredentials {
    pub fn cloud_credentials(&self) -> CloudCredentials {
        CloudCredentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        }
    }
}

/// Credentials handed to the copy tool through its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl CloudCredentials {
    /// Environment variables understood by the `aws` CLI. The token is set under
    /// both its legacy and current names.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("AWS_ACCESS_KEY_ID", self.access_key_id.clone()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.clone()),
            ("AWS_SECURITY_TOKEN", self.session_token.clone()),
            ("AWS_SESSION_TOKEN", self.session_token.clone()),
        ]
    }
}

/// The `processing_status` block of an ingestion submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub progress: Option<Value>,
}

impl ProcessingStatus {
    pub const DONE: &'static str = "done";

    pub fn is_done(&self) -> bool {
        self.state.as_deref() == Some(Self::DONE)
    }
}

/// Client for the CGAP portal, already bound to one server and one key pair.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Portal: Send + Sync {
    /// Fetch the authenticated user's record (`/me`).
    ///
    /// Rejected credentials (401/403) must surface as
    /// [`crate::SubmitError::PermissionDenied`].
    async fn get_user_record(&self) -> Result<UserRecord>;

    /// Post a bundle for ingestion and return the submission uuid used for tracking.
    async fn submit_for_ingestion(&self, submission: &BundleSubmission) -> Result<String>;

    /// Fetch the ingestion submission item as raw JSON.
    async fn get_ingestion_submission(&self, uuid: &str) -> Result<Value>;

    /// Patch the file item with its filename, returning the raw response that
    /// carries the upload credentials.
    async fn request_upload_credentials(&self, uuid: &str, filename: &str) -> Result<Value>;
}

/// The person at the terminal.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Console: Send + Sync {
    /// Show a line of output.
    fn show(&self, line: &str);

    /// Show a line of output prefixed with the current local time.
    fn show_timed(&self, line: &str);

    /// Ask a yes/no question and return the answer.
    fn yes_or_no(&self, question: &str) -> bool;
}

/// Copies a local file to a pre-signed cloud storage location.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CloudCopier: Send + Sync {
    /// Run the copy and return the tool's exit code. Failing to start the tool
    /// at all is an error; a non-zero exit code is not.
    async fn copy(
        &self,
        source: &Path,
        target: &str,
        credentials: &CloudCredentials,
    ) -> Result<i32>;
}
