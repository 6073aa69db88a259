//! Default institution and project, inferred from the user's portal profile.

use crate::contract::{Console, UserRecord};
use crate::error::{Result, SubmitError};

/// The institution to submit for. An explicit choice wins; otherwise the
/// profile must name exactly one institution the user submits for.
pub fn check_institution<C: Console + ?Sized>(
    console: &C,
    institution: Option<&str>,
    user: &UserRecord,
) -> Result<String> {
    if let Some(institution) = institution.filter(|i| !i.is_empty()) {
        return Ok(institution.to_string());
    }
    let ids: Vec<&str> = user
        .submits_for
        .iter()
        .filter_map(|item| item.id.as_deref())
        .collect();
    match ids.as_slice() {
        [] => Err(SubmitError::Usage(
            "Your user profile declares no institution on behalf of which you are authorized to make submissions."
                .to_string(),
        )),
        [only] => {
            console.show(&format!("Using institution: {only}"));
            Ok(only.to_string())
        }
        many => Err(SubmitError::Usage(format!(
            "You must use --institution to specify which institution you are submitting for (probably one of: {}).",
            many.join(", ")
        ))),
    }
}

/// The project to submit for. An explicit choice wins; otherwise the
/// profile's project is used.
pub fn check_project<C: Console + ?Sized>(
    console: &C,
    project: Option<&str>,
    user: &UserRecord,
) -> Result<String> {
    if let Some(project) = project.filter(|p| !p.is_empty()) {
        return Ok(project.to_string());
    }
    match user
        .project
        .as_ref()
        .and_then(|p| p.id.as_deref())
        .filter(|id| !id.is_empty())
    {
        Some(project) => {
            console.show(&format!("Using project: {project}"));
            Ok(project.to_string())
        }
        None => Err(SubmitError::Usage(
            "Your user profile has no project declared, so you must specify a --project explicitly."
                .to_string(),
        )),
    }
}
