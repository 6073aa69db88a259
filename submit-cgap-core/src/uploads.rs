//! Uploading the data files a submission refers to.
//!
//! For every file the portal is waiting for, the client asks the portal for
//! short-lived credentials and hands the file to the cloud copy tool. A failed
//! upload is reported and the remaining files are still attempted.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::contract::{CloudCopier, Console, Portal, UploadCredentials, UploadSpec};
use crate::error::{Result, SubmitError};
use crate::report::{get_section, is_empty, n_of};
use crate::session::Session;

/// Tally of a batch of uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Upload the files listed in a submission's `upload_info`, if there are any
/// and the user agrees.
pub async fn do_any_uploads<P, C, A>(
    session: &Session<P, C, A>,
    res: &Value,
    folder: Option<&Path>,
) -> Result<UploadSummary>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let specs = match get_section(res, "upload_info").filter(|info| !is_empty(info)) {
        Some(info) => serde_json::from_value::<Vec<UploadSpec>>(info.clone())
            .map_err(|e| SubmitError::MalformedResponse(format!("upload_info: {e}")))?,
        None => {
            info!("No uploads requested by the submission");
            return Ok(UploadSummary::default());
        }
    };
    if session.confirm(&format!("Upload {}?", n_of(specs.len(), "file"))) {
        Ok(do_uploads(session, &specs, folder).await)
    } else {
        session.console.show("No uploads attempted.");
        Ok(UploadSummary {
            skipped: specs.len(),
            ..UploadSummary::default()
        })
    }
}

/// Upload each file from `folder` (the current directory when absent).
pub async fn do_uploads<P, C, A>(
    session: &Session<P, C, A>,
    specs: &[UploadSpec],
    folder: Option<&Path>,
) -> UploadSummary
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let folder = folder
        .filter(|f| !f.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut summary = UploadSummary::default();
    for spec in specs {
        let path = folder.join(&spec.filename);
        if !session.no_query && !session.console.yes_or_no(&format!("Upload {}?", spec.filename)) {
            session.console.show("OK, not uploading it.");
            summary.skipped += 1;
            continue;
        }
        session
            .console
            .show(&format!("Uploading {} to item {} ...", path.display(), spec.uuid));
        match upload_file_to_uuid(session, &path, &spec.uuid).await {
            Ok(()) => {
                session.console.show(&format!(
                    "Upload of {} to item {} was successful.",
                    path.display(),
                    spec.uuid
                ));
                summary.uploaded += 1;
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), uuid = %spec.uuid, "Upload failed");
                session.console.show(&format!("Error: {e}"));
                summary.failed += 1;
            }
        }
    }
    info!(?summary, "Finished uploads");
    summary
}

/// Obtain upload credentials for item `uuid` and upload `path` with them.
pub async fn upload_file_to_uuid<P, C, A>(
    session: &Session<P, C, A>,
    path: &Path,
    uuid: &str,
) -> Result<()>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let response = session
        .portal
        .request_upload_credentials(uuid, &filename)
        .await?;
    let credentials = extract_upload_credentials(&response)
        .ok_or_else(|| SubmitError::UploadCredentials(path.to_path_buf()))?;
    execute_prearranged_upload(session, path, &credentials).await
}

/// The `upload_credentials` of the single item in a PATCH response's `@graph`.
pub fn extract_upload_credentials(response: &Value) -> Option<Value> {
    match response.get("@graph")?.as_array()?.as_slice() {
        [item] => item.get("upload_credentials").cloned(),
        _ => None,
    }
}

/// Copy `path` to the location named in `credentials`, authorised by them.
pub async fn execute_prearranged_upload<P, C, A>(
    session: &Session<P, C, A>,
    path: &Path,
    credentials: &Value,
) -> Result<()>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let credentials: UploadCredentials = serde_json::from_value(credentials.clone())
        .map_err(|e| SubmitError::BadUploadSpecification(e.to_string()))?;
    let started = Instant::now();
    session.console.show(&format!(
        "Going to upload {} to {}.",
        path.display(),
        credentials.upload_url
    ));
    let code = session
        .copier
        .copy(path, &credentials.upload_url, &credentials.cloud_credentials())
        .await?;
    if code != 0 {
        warn!(code, path = %path.display(), "Copy tool exited unsuccessfully");
        return Err(SubmitError::UploadFailed(code));
    }
    session.console.show(&format!(
        "Uploaded in {:.2} seconds",
        started.elapsed().as_secs_f64()
    ));
    Ok(())
}

/// Pick up the uploads of an earlier submission.
pub async fn resume_uploads<P, C, A>(
    session: &Session<P, C, A>,
    uuid: &str,
    folder: Option<&Path>,
) -> Result<UploadSummary>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    info!(uuid, server = %session.server, "Resuming uploads");
    let res = session.portal.get_ingestion_submission(uuid).await?;
    do_any_uploads(session, &res, folder).await
}

/// Upload a single file to an existing file item.
pub async fn upload_item_data<P, C, A>(
    session: &Session<P, C, A>,
    part_filename: &Path,
    uuid: &str,
) -> Result<()>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let question = format!("Upload {} to {}?", part_filename.display(), session.server);
    if !session.confirm(&question) {
        session.console.show("Aborting submission.");
        return Err(SubmitError::Aborted);
    }
    upload_file_to_uuid(session, part_filename, uuid).await
}

/// The folder uploads are read from: an explicit folder, else the bundle's own folder.
pub fn upload_folder(bundle_filename: Option<&Path>, upload_folder: Option<&Path>) -> Option<PathBuf> {
    upload_folder
        .map(Path::to_path_buf)
        .or_else(|| bundle_filename.and_then(bundle_folder).map(Path::to_path_buf))
}

/// The folder a bundle lives in, or `None` for a bare file name.
pub fn bundle_folder(bundle_filename: &Path) -> Option<&Path> {
    bundle_filename.parent().filter(|p| !p.as_os_str().is_empty())
}
