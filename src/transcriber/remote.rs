use async_trait::async_trait;
use log::{error, info};
use std::path::Path;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::RemoteConfig;
use crate::error::AsrError;
use crate::extract::extract_transcript;
use crate::transcriber::Transcriber;

/// Shells out to the remote transcription server's wrapper CLI and parses the
/// transcript out of whatever it prints. One process per request, nothing
/// shared between calls.
pub struct RemoteCliTranscriber {
    config: RemoteConfig,
}

impl RemoteCliTranscriber {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for RemoteCliTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, AsrError> {
        // The auth token travels in the argument list and stays out of the logs.
        info!(
            "Invoking {} against {} for {}",
            self.config.command,
            self.config.server,
            audio.display()
        );

        let mut command = Command::new(&self.config.command);
        command
            .arg("--server")
            .arg(&self.config.server)
            .arg("--auth-token")
            .arg(&self.config.auth_token)
            .arg("--language")
            .arg(&self.config.language)
            .arg(audio);

        let output = timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| {
                AsrError::Process(format!(
                    "{} timed out after {}s",
                    self.config.command,
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| AsrError::Process(format!("failed to run {}: {e}", self.config.command)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "{} exited with {}; stdout: {}; stderr: {}",
                self.config.command,
                output.status,
                stdout.trim(),
                stderr.trim()
            );
            return Err(AsrError::Process(format!(
                "{} exited with {}",
                self.config.command, output.status
            )));
        }

        extract_transcript(&stdout)
    }
}
