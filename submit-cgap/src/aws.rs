//! Cloud copies through the `aws` command-line tool.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use submit_cgap_core::contract::{CloudCopier, CloudCredentials};
use submit_cgap_core::{Result, SubmitError};

pub struct AwsCli {
    program: String,
}

impl AwsCli {
    pub fn new(program: impl Into<String>) -> Self {
        AwsCli {
            program: program.into(),
        }
    }

    /// Arguments for `aws s3 cp`, quiet apart from errors.
    pub fn copy_args(source: &Path, target: &str) -> Vec<OsString> {
        vec![
            "s3".into(),
            "cp".into(),
            "--only-show-errors".into(),
            source.as_os_str().to_owned(),
            target.into(),
        ]
    }
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new("aws")
    }
}

#[async_trait]
impl CloudCopier for AwsCli {
    async fn copy(
        &self,
        source: &Path,
        target: &str,
        credentials: &CloudCredentials,
    ) -> Result<i32> {
        let args = Self::copy_args(source, target);
        tracing::info!(program = %self.program, ?args, "Running cloud copy");
        // The child inherits our environment, with the credentials added on top.
        let status = Command::new(&self.program)
            .args(&args)
            .envs(credentials.env_vars())
            .status()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, program = %self.program, "Failed to launch copy tool");
                SubmitError::UploadLaunch(format!("{}: {e}", self.program))
            })?;
        // Killed by a signal: no exit code.
        let code = status.code().unwrap_or(-1);
        tracing::info!(code, source = %source.display(), target, "Cloud copy finished");
        Ok(code)
    }
}
