#![doc = "Portal client: the reqwest implementation of the core `Portal` trait."]
//
//! # Portal client
//!
//! [`PortalClient`] talks JSON over HTTP to one CGAP portal server, authenticating
//! every request with HTTP basic auth from the key pair in the user's key file.
//!
//! - `GET  /me?format=json`: the user record, used to infer institution/project.
//! - `POST /submit_for_ingestion`: multipart upload of the bundle.
//! - `GET  /ingestion-submissions/<uuid>?format=json`: processing status and results.
//! - `PATCH /<uuid>?format=json`: registers a file name and returns upload credentials.
//!
//! Status codes are mapped onto [`SubmitError`]; response bodies are passed back
//! to the core untouched.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use submit_cgap_core::contract::{BundleSubmission, Portal, UserRecord};
use submit_cgap_core::keys::KeyDict;
use submit_cgap_core::server::ingestion_submission_item_url;
use submit_cgap_core::{Result, SubmitError};

pub struct PortalClient {
    client: Client,
    server: String,
    keydict: KeyDict,
}

impl PortalClient {
    pub fn new(server: impl Into<String>, keydict: KeyDict) -> Result<Self> {
        let server = server.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("submit-cgap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SubmitError::Transport {
                url: server.clone(),
                message: e.to_string(),
            })?;
        tracing::info!(server = %server, key = %keydict.key, "Initialized PortalClient");
        Ok(PortalClient {
            client,
            server,
            keydict,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn user_url(&self) -> String {
        format!("{}/me?format=json", self.server)
    }

    pub fn submission_url(&self) -> String {
        format!("{}/submit_for_ingestion", self.server)
    }

    pub fn item_url(&self, uuid: &str) -> String {
        format!("{}/{}?format=json", self.server, uuid)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        let (key, secret) = self.keydict.keypair();
        request.basic_auth(key, Some(secret))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<reqwest::Response> {
        self.authed(request).send().await.map_err(|e| {
            tracing::error!(error = ?e, url, "HTTP request failed");
            SubmitError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Send, require a 2xx status and decode the JSON body.
    async fn send_for_json(&self, request: RequestBuilder, url: &str) -> Result<Value> {
        let response = self.send(request, url).await?;
        let status = response.status();
        if !status.is_success() {
            tracing::error!(url, status = status.as_u16(), "Portal returned an error status");
            return Err(SubmitError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<Value>().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Portal response was not JSON");
            SubmitError::MalformedResponse(format!("{url}: {e}"))
        })
    }
}

#[async_trait]
impl Portal for PortalClient {
    async fn get_user_record(&self) -> Result<UserRecord> {
        let url = self.user_url();
        tracing::info!(%url, "Fetching user record");
        let response = self.send(self.client.get(&url), &url).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            if body.get("Title").and_then(Value::as_str) == Some("Not logged in.") {
                tracing::warn!(server = %self.server, "Server did not recognize you with the given credentials");
            }
            return Err(SubmitError::PermissionDenied {
                server: self.server.clone(),
            });
        }
        if !status.is_success() {
            return Err(SubmitError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        response.json::<UserRecord>().await.map_err(|e| {
            tracing::error!(error = ?e, %url, "User record was not in the expected form");
            SubmitError::MalformedResponse(format!("{url}: {e}"))
        })
    }

    async fn submit_for_ingestion(&self, submission: &BundleSubmission) -> Result<String> {
        let url = self.submission_url();
        let content = tokio::fs::read(&submission.bundle).await?;
        let file_name = submission
            .bundle
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        tracing::info!(
            %url,
            bundle = %submission.bundle.display(),
            size = content.len(),
            institution = %submission.institution,
            project = %submission.project,
            validate_only = submission.validate_only,
            "Posting bundle for ingestion"
        );
        let mut form = Form::new();
        for (name, value) in submission.form_fields() {
            form = form.text(name, value);
        }
        form = form.part("datafile", Part::bytes(content).file_name(file_name));

        let res = self
            .send_for_json(self.client.post(&url).multipart(form), &url)
            .await?;
        match res.get("submission_id").and_then(Value::as_str) {
            Some(submission_id) => {
                tracing::info!(submission_id, "Bundle accepted for ingestion");
                Ok(submission_id.to_string())
            }
            None => {
                tracing::error!(response = %res, "Submission response had no submission_id");
                Err(SubmitError::MalformedResponse(
                    "submission response has no submission_id".to_string(),
                ))
            }
        }
    }

    async fn get_ingestion_submission(&self, uuid: &str) -> Result<Value> {
        let url = ingestion_submission_item_url(&self.server, uuid);
        tracing::debug!(%url, "Fetching ingestion submission");
        self.send_for_json(self.client.get(&url), &url).await
    }

    async fn request_upload_credentials(&self, uuid: &str, filename: &str) -> Result<Value> {
        let url = self.item_url(uuid);
        tracing::info!(%url, filename, "Requesting upload credentials");
        let body = json!({ "filename": filename });
        self.send_for_json(self.client.patch(&url).json(&body), &url)
            .await
    }
}
