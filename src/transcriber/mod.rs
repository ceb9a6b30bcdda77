pub mod download;
pub mod local;
pub mod remote;
pub mod resampler;

use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::{AppConfig, Profile};
use crate::error::AsrError;

/// Speech-to-text capability. Implementations get a path to a staged audio
/// file and return the final transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, AsrError>;
}

pub fn build_transcriber(config: &AppConfig) -> anyhow::Result<Arc<dyn Transcriber>> {
    match config.profile {
        Profile::Local => Ok(Arc::new(local::LocalTranscriber::new(config.model.clone()))),
        Profile::Remote => {
            let remote = config
                .remote
                .clone()
                .context("remote profile requires REMOTE_ASR_* settings")?;
            Ok(Arc::new(remote::RemoteCliTranscriber::new(remote)))
        }
    }
}
