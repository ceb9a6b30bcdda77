use async_trait::async_trait;
use log::info;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::AsrError;

/// Durable home for finished transcripts. `save` returns an opaque reference
/// to the stored object; whether a failure matters is the caller's call.
#[async_trait]
pub trait TextStore: Send + Sync {
    async fn save(&self, text: &str) -> Result<String, AsrError>;
}

/// Google Cloud Storage through the JSON media-upload endpoint. One request,
/// no retry. Objects are keyed by a fresh UUID with a `.txt` suffix.
pub struct GcsTextStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl GcsTextStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self, object: &str) -> String {
        format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.config.bucket, object
        )
    }
}

#[async_trait]
impl TextStore for GcsTextStore {
    async fn save(&self, text: &str) -> Result<String, AsrError> {
        let object = format!("{}.txt", Uuid::new_v4());

        let mut request = self
            .client
            .post(self.upload_url(&object))
            .header("content-type", "text/plain")
            .body(text.to_string());
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AsrError::Store(format!("upload request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AsrError::Store(format!(
                "upload rejected with {}",
                response.status()
            )));
        }

        info!("Stored transcript as {object}");
        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.config.bucket, object
        ))
    }
}
