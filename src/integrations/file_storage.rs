//! HTTP object storage for workout files.
//!
//! Files are read with a plain GET from the bucket. Uploads first ask the
//! upload endpoint for a signed URL, then PUT the document there.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{FileStorage, SyncError};
use crate::storage::config::RemoteSettings;

/// Content type the bucket expects on uploaded workout files.
const WORKOUT_CONTENT_TYPE: &str = "zwo";

/// Object storage client over HTTP.
pub struct HttpFileStorage {
    http: reqwest::Client,
    files_base_url: String,
    upload_endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlRequest<'a> {
    file_type: &'a str,
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    #[serde(rename = "uploadURL")]
    upload_url: String,
}

impl HttpFileStorage {
    /// Create a client from the remote settings.
    pub fn new(settings: &RemoteSettings) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            files_base_url: settings.files_base_url.trim_end_matches('/').to_string(),
            upload_endpoint: settings.upload_endpoint.clone(),
        })
    }

    /// Public URL of a workout file.
    pub fn file_url(&self, id: &str) -> String {
        format!("{}/{}.zwo", self.files_base_url, id)
    }

    async fn signed_upload_url(&self, file_name: &str) -> Result<String, SyncError> {
        let response = self
            .http
            .post(&self.upload_endpoint)
            .json(&UploadUrlRequest {
                file_type: WORKOUT_CONTENT_TYPE,
                file_name,
            })
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UploadFailed(format!(
                "Upload endpoint returned status {}",
                status
            )));
        }

        let body: UploadUrlResponse = response
            .json()
            .await
            .map_err(|e| SyncError::UploadFailed(e.to_string()))?;
        Ok(body.upload_url)
    }
}

fn network_error(e: reqwest::Error) -> SyncError {
    SyncError::NetworkError(e.to_string())
}

impl FileStorage for HttpFileStorage {
    async fn fetch_workout_file(&self, id: &str) -> Result<String, SyncError> {
        let url = self.file_url(id);
        tracing::debug!(%url, "Fetching workout file");

        let response = self.http.get(&url).send().await.map_err(network_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::FORBIDDEN {
            // Missing objects come back as 403 from a private bucket.
            return Err(SyncError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(SyncError::DownloadFailed(format!(
                "{} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SyncError::DownloadFailed(e.to_string()))
    }

    async fn upload_workout_file(&self, id: &str, xml: &str) -> Result<(), SyncError> {
        let file_name = format!("{}.zwo", id);
        let upload_url = self.signed_upload_url(&file_name).await?;

        let response = self
            .http
            .put(&upload_url)
            .header("Content-Type", WORKOUT_CONTENT_TYPE)
            .body(xml.to_string())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UploadFailed(format!(
                "Storage returned status {}",
                status
            )));
        }

        tracing::info!(file = %file_name, bytes = xml.len(), "Uploaded workout file");
        Ok(())
    }
}
