use log::debug;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

use crate::config::AppConfig;
use crate::error::AsrError;

/// Checks the declared filename against the configured extension set and
/// returns the normalized extension.
pub fn validate_upload(filename: &str, config: &AppConfig) -> Result<String, AsrError> {
    if filename.is_empty() {
        return Err(AsrError::InvalidInput("No file selected".to_string()));
    }
    match file_extension(filename) {
        Some(ext) if config.is_allowed(&ext) => Ok(ext),
        _ => Err(AsrError::InvalidInput(config.invalid_type_message())),
    }
}

/// Lowercased substring after the last dot. A name without a dot, or with
/// nothing after it, has no extension.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Writes the upload to a uniquely named temp file carrying the original
/// extension. The file is removed when the handle drops, so every exit path
/// out of the request cleans up.
pub fn stage_upload(bytes: &[u8], extension: &str) -> Result<NamedTempFile, AsrError> {
    let mut staged = Builder::new()
        .prefix("asr-upload-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    staged.write_all(bytes)?;
    staged.flush()?;
    debug!(
        "Staged upload: {} bytes at {}",
        bytes.len(),
        staged.path().display()
    );
    Ok(staged)
}
