//! Choosing which portal server a command talks to.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::{PortalConfig, ENV_PREFIX};
use crate::error::{Result, SubmitError};

/// Servers the client is willing to talk to: a local portal, or any host that is
/// recognisably a CGAP deployment.
pub static SERVER_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(localhost(:[0-9]+)?|[a-z0-9.-]*cgap[a-z0-9.-]*)/?$")
        .expect("server regexp is valid")
});

/// Resolve the server for a command from `--env` / `--server`.
///
/// At most one of the two may be given. With neither, the configured default
/// environment is used, falling back to the production server.
pub fn resolve_server(
    config: &PortalConfig,
    env: Option<&str>,
    server: Option<&str>,
) -> Result<String> {
    match (env, server) {
        (Some(_), Some(_)) => Err(SubmitError::Usage(
            "You may only specify either --server or --env, but not both.".to_string(),
        )),
        (None, Some(server)) => {
            if !SERVER_REGEXP.is_match(server) {
                return Err(SubmitError::InvalidServer(server.to_string()));
            }
            let server = server.trim_end_matches('/').to_string();
            debug!(%server, "Using explicitly given server");
            Ok(server)
        }
        (Some(env), None) => server_for_env(config, env),
        (None, None) => match config.default_env.as_deref() {
            Some(env) => server_for_env(config, env),
            None => {
                info!(server = %config.production_server, "No env or server given, using production");
                Ok(config.production_server.clone())
            }
        },
    }
}

/// Full environment name, allowing the `fourfront-` prefix to be omitted.
pub fn full_env_name(env: &str) -> String {
    if env.starts_with(ENV_PREFIX) {
        env.to_string()
    } else {
        format!("{ENV_PREFIX}{env}")
    }
}

fn server_for_env(config: &PortalConfig, env: &str) -> Result<String> {
    let full_env = full_env_name(env);
    match config.environments.get(&full_env) {
        Some(server) => {
            info!(env = %full_env, %server, "Resolved env to server");
            Ok(server.trim_end_matches('/').to_string())
        }
        None => Err(SubmitError::Usage(format!(
            "The specified env is not a valid CGAP environment: {env}"
        ))),
    }
}

/// URL of the JSON view of an ingestion submission.
pub fn ingestion_submission_item_url(server: &str, uuid: &str) -> String {
    format!("{server}/ingestion-submissions/{uuid}?format=json")
}
