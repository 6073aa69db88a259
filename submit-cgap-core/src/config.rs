use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const PRODUCTION_SERVER: &str = "https://cgap.hms.harvard.edu";
pub const PRODUCTION_ENV: &str = "fourfront-cgap";
pub const ENV_PREFIX: &str = "fourfront-";

/// Seconds to wait before each check on an ingestion submission.
pub const PROGRESS_CHECK_INTERVAL: u64 = 15;
/// Number of checks before giving up on an ingestion submission.
pub const PROGRESS_CHECK_TRIES: u32 = 8;

const BEANSTALK_SUFFIX: &str = "9wzadzju3p.us-east-1.elasticbeanstalk.com";
const NON_PRODUCTION_ENVS: [&str; 3] = ["fourfront-cgapdev", "fourfront-cgaptest", "fourfront-cgapwolf"];

/// Everything that decides where and how the client talks to a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub production_server: String,
    /// Environment used when neither `--env` nor `--server` is given.
    pub default_env: Option<String>,
    /// Known environment names and the server each one is served from.
    pub environments: BTreeMap<String, String>,
    pub poll: PollConfig,
    /// Program used for cloud storage copies.
    pub aws_program: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(PRODUCTION_ENV.to_string(), PRODUCTION_SERVER.to_string());
        for env in NON_PRODUCTION_ENVS {
            environments.insert(env.to_string(), format!("http://{env}.{BEANSTALK_SUFFIX}"));
        }
        PortalConfig {
            production_server: PRODUCTION_SERVER.to_string(),
            default_env: None,
            environments,
            poll: PollConfig::default(),
            aws_program: "aws".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn trace_loaded(&self) {
        info!(
            production_server = %self.production_server,
            default_env = self.default_env.as_deref().unwrap_or("<none>"),
            environments_count = self.environments.len(),
            poll_interval_secs = self.poll.interval_secs,
            poll_max_tries = self.poll.max_tries,
            "Loaded PortalConfig"
        );
        debug!(?self, "PortalConfig loaded (full debug)");
    }
}

/// Fixed-interval, fixed-count polling of an ingestion submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub max_tries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval_secs: PROGRESS_CHECK_INTERVAL,
            max_tries: PROGRESS_CHECK_TRIES,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}
