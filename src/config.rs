use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;

/// Which transcription backend the service fronts. The two deployments also
/// differ in what they accept and what they return, so the profile drives
/// the extension defaults and the response shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Locally loaded model, WAV only, response is `{text}`.
    Local,
    /// Remote server via CLI wrapper, WAV/OPUS/OGG, response is `{text, text_url}`.
    Remote,
}

impl Profile {
    pub fn default_extensions(self) -> Vec<String> {
        match self {
            Profile::Local => vec!["wav".to_string()],
            Profile::Remote => ["wav", "opus", "ogg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Profile::Local),
            "remote" => Ok(Profile::Remote),
            other => bail!("unknown profile '{other}', expected 'local' or 'remote'"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub bucket: String,
    pub access_token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub model: String,
    pub models_dir: PathBuf,
    pub language: String,
    pub num_threads: i32,
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub command: String,
    pub server: String,
    pub auth_token: String,
    pub language: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub profile: Profile,
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: usize,
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub remote: Option<RemoteConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let profile: Profile = match std::env::var("ASR_PROFILE") {
            Ok(v) => v.parse()?,
            Err(_) => Profile::Local,
        };

        let allowed_extensions = match std::env::var("ASR_ALLOWED_EXTENSIONS") {
            Ok(v) => {
                let exts: Vec<String> = v
                    .split(',')
                    .map(|e| e.trim().to_ascii_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect();
                if exts.is_empty() {
                    bail!("ASR_ALLOWED_EXTENSIONS is set but names no extensions");
                }
                exts
            }
            Err(_) => profile.default_extensions(),
        };

        let store = StoreConfig {
            bucket: std::env::var("GCS_BUCKET_NAME").context("GCS_BUCKET_NAME is not set")?,
            access_token: std::env::var("GCS_ACCESS_TOKEN").ok(),
        };

        let model = ModelConfig {
            model: std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "base.en".to_string()),
            models_dir: PathBuf::from(
                std::env::var("WHISPER_MODELS_DIR").unwrap_or_else(|_| "models".to_string()),
            ),
            language: std::env::var("WHISPER_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
            num_threads: std::env::var("WHISPER_NUM_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_num_threads),
        };

        let remote = if profile == Profile::Remote {
            Some(RemoteConfig {
                command: std::env::var("REMOTE_ASR_COMMAND")
                    .context("REMOTE_ASR_COMMAND is not set")?,
                server: std::env::var("REMOTE_ASR_SERVER")
                    .context("REMOTE_ASR_SERVER is not set")?,
                auth_token: std::env::var("REMOTE_ASR_TOKEN")
                    .context("REMOTE_ASR_TOKEN is not set")?,
                language: std::env::var("REMOTE_ASR_LANGUAGE")
                    .unwrap_or_else(|_| "en".to_string()),
                timeout: Duration::from_secs(
                    std::env::var("REMOTE_ASR_TIMEOUT_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(300),
                ),
            })
        } else {
            None
        };

        Ok(Self {
            profile,
            allowed_extensions,
            max_upload_bytes: std::env::var("ASR_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100 * 1024 * 1024), // 100MB
            store,
            model,
            remote,
        })
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }

    /// Rejection message naming the accepted formats, e.g.
    /// "Invalid file type. Please upload a WAV file."
    pub fn invalid_type_message(&self) -> String {
        let names: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|e| e.to_ascii_uppercase())
            .collect();
        let list = match names.as_slice() {
            [single] => single.clone(),
            [rest @ .., last] => format!("{} or {}", rest.join(", "), last),
            [] => String::new(),
        };
        format!("Invalid file type. Please upload a {list} file.")
    }
}

/// Host-sized thread count, used when the operator does not pin one.
fn default_num_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|p| (p.get() as i32).max(1))
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(profile: Profile) -> AppConfig {
        AppConfig {
            profile,
            allowed_extensions: profile.default_extensions(),
            max_upload_bytes: 100 * 1024 * 1024,
            store: StoreConfig {
                bucket: "bucket".to_string(),
                access_token: None,
            },
            model: ModelConfig {
                model: "base.en".to_string(),
                models_dir: PathBuf::from("models"),
                language: "en".to_string(),
                num_threads: 2,
            },
            remote: None,
        }
    }

    #[test]
    fn profile_parsing() {
        assert_eq!("local".parse::<Profile>().unwrap(), Profile::Local);
        assert_eq!("REMOTE".parse::<Profile>().unwrap(), Profile::Remote);
        assert!("cloud".parse::<Profile>().is_err());
    }

    #[test]
    fn single_extension_message() {
        let config = config_with(Profile::Local);
        assert_eq!(
            config.invalid_type_message(),
            "Invalid file type. Please upload a WAV file."
        );
    }

    #[test]
    fn multi_extension_message() {
        let config = config_with(Profile::Remote);
        assert_eq!(
            config.invalid_type_message(),
            "Invalid file type. Please upload a WAV, OPUS or OGG file."
        );
    }

    #[test]
    fn thread_default_is_positive() {
        assert!(default_num_threads() >= 1);
    }

    #[test]
    fn extension_lookup_is_exact() {
        let config = config_with(Profile::Remote);
        assert!(config.is_allowed("opus"));
        assert!(!config.is_allowed("txt"));
    }
}
