use anyhow::{Result, anyhow};
use log::info;
use std::path::{Path, PathBuf};

const AVAILABLE_MODELS: &[&str] = &[
    "tiny",
    "tiny.en",
    "base",
    "base.en",
    "small",
    "small.en",
    "medium",
    "medium.en",
    "large-v2",
    "large-v3",
    "large-v3-turbo",
];

const HF_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub fn validate_model(model: &str) -> Result<()> {
    if AVAILABLE_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(anyhow!(
            "invalid model '{}', expected one of: {}",
            model,
            AVAILABLE_MODELS.join(", ")
        ))
    }
}

/// Returns the path to the ggml model file, fetching it from Hugging Face
/// when it is not already on disk.
pub async fn ensure_model(model: &str, models_dir: &Path) -> Result<PathBuf> {
    validate_model(model)?;

    let path = models_dir.join(format!("ggml-{model}.bin"));
    if path.exists() {
        return Ok(path);
    }

    std::fs::create_dir_all(models_dir)?;

    let url = format!("{HF_BASE}/ggml-{model}.bin");
    info!("Downloading ggml model '{model}'...");

    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP {} while fetching model '{}'",
            response.status(),
            model
        ));
    }
    let bytes = response.bytes().await?;

    // Write to a sibling temp name first so a partial download never
    // masquerades as a complete model.
    let partial = path.with_extension("bin.tmp");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, &path).await?;

    info!("Model '{}' saved to {}", model, path.display());
    Ok(path)
}
