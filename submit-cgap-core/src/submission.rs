//! Submitting a metadata bundle and following it through ingestion.
//!
//! The pipeline is linear and fail-fast:
//!   - confirm with the user, then authenticate and settle institution/project
//!   - post the bundle, which the portal answers with a submission uuid
//!   - poll the submission at a fixed interval for a fixed number of tries
//!   - show the portal's report sections, then offer to upload the data files
//!     the bundle refers to
//!
//! Validation of the bundle's content happens entirely on the portal; the
//! client only relays what the portal reports.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::contract::{BundleSubmission, CloudCopier, Console, Portal, ProcessingStatus};
use crate::error::{Result, SubmitError};
use crate::profile::{check_institution, check_project};
use crate::report::{display_value, get_section, is_empty, show_section};
use crate::session::Session;
use crate::uploads::{bundle_folder, do_any_uploads, UploadSummary};

pub const SUCCESS: &str = "success";
pub const ERROR: &str = "error";

/// What the user asked to submit. Institution and project are inferred from
/// the user profile when absent.
#[derive(Debug, Clone)]
pub struct SubmissionRequest<'a> {
    pub bundle: &'a Path,
    pub institution: Option<&'a str>,
    pub project: Option<&'a str>,
    pub validate_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub submission_id: String,
    pub outcome: String,
    /// Present when uploads were offered.
    pub uploads: Option<UploadSummary>,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == SUCCESS
    }
}

pub async fn submit_metadata_bundle<P, C, A>(
    session: &Session<P, C, A>,
    request: &SubmissionRequest<'_>,
) -> Result<SubmissionReport>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let qualifier = if request.validate_only { " (for validation only)" } else { "" };
    let question = format!(
        "Submit {} to {}{qualifier}?",
        request.bundle.display(),
        session.server
    );
    if !session.confirm(&question) {
        session.console.show("Aborting submission.");
        return Err(SubmitError::Aborted);
    }

    let user = session.portal.get_user_record().await?;
    session.console.show("Portal credentials were accepted.");
    debug!(title = ?user.title, email = ?user.contact_email, "Fetched user record");

    let institution = check_institution(&session.console, request.institution, &user)?;
    let project = check_project(&session.console, request.project, &user)?;

    if !request.bundle.exists() {
        return Err(SubmitError::MissingBundle(request.bundle.to_path_buf()));
    }

    let submission = BundleSubmission {
        bundle: request.bundle.to_path_buf(),
        institution,
        project,
        validate_only: request.validate_only,
    };
    info!(bundle = %submission.bundle.display(), server = %session.server, "Submitting bundle");
    let submission_id = session.portal.submit_for_ingestion(&submission).await?;
    session.console.show_timed(&format!(
        "Bundle uploaded, assigned uuid {submission_id} for tracking. Awaiting processing..."
    ));

    let (outcome, res) = wait_for_processing(session, &submission_id).await?;
    session.console.show_timed(&format!("Final status: {outcome}"));

    if outcome == ERROR && get_section(&res, "errors").is_some_and(|errors| !is_empty(errors)) {
        show_section(&session.console, &res, "errors", None);
    }

    let caveat = (outcome != SUCCESS).then_some(outcome.as_str());
    show_section(&session.console, &res, "validation_output", caveat);

    let mut report = SubmissionReport {
        submission_id,
        outcome: outcome.clone(),
        uploads: None,
    };
    if request.validate_only {
        return Ok(report);
    }

    show_section(&session.console, &res, "post_output", caveat);

    if report.succeeded() {
        show_section(&session.console, &res, "upload_info", None);
        let folder = bundle_folder(request.bundle);
        report.uploads = Some(do_any_uploads(session, &res, folder).await?);
    }
    Ok(report)
}

/// Poll a submission until its processing is done, returning the outcome
/// and the final submission record.
///
/// Sleeps before every check, including the first: the portal never has an
/// answer immediately.
pub async fn wait_for_processing<P, C, A>(
    session: &Session<P, C, A>,
    submission_id: &str,
) -> Result<(String, Value)>
where
    P: Portal,
    C: Console,
    A: CloudCopier,
{
    let tries = session.poll.max_tries;
    for attempt in 1..=tries {
        tokio::time::sleep(session.poll.interval()).await;
        let res = session.portal.get_ingestion_submission(submission_id).await?;
        let status = processing_status(&res)?;
        debug!(attempt, state = ?status.state, "Checked ingestion submission");
        if status.is_done() {
            let outcome = status.outcome.unwrap_or_else(|| "unknown".to_string());
            info!(submission_id, %outcome, attempt, "Ingestion processing finished");
            return Ok((outcome, res));
        }
        let progress = status.progress.as_ref().map(display_value).unwrap_or_else(|| "None".to_string());
        session
            .console
            .show_timed(&format!("Progress is {progress}. Continuing to wait..."));
    }
    error!(submission_id, tries, "Gave up waiting for ingestion processing");
    session.console.show_timed(&format!("Timed out after {tries} tries."));
    Err(SubmitError::TimedOut(tries))
}

fn processing_status(res: &Value) -> Result<ProcessingStatus> {
    let status = res.get("processing_status").ok_or_else(|| {
        SubmitError::MalformedResponse("ingestion submission has no processing_status".to_string())
    })?;
    Ok(serde_json::from_value(status.clone())?)
}
