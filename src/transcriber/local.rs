use async_trait::async_trait;
use futures_util::future::BoxFuture;
use log::info;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::ModelConfig;
use crate::error::AsrError;
use crate::transcriber::{Transcriber, download, resampler};

/// A loaded model, ready to run inference on prepared 16 kHz mono samples.
trait InferenceEngine: Send + Sync {
    fn infer(&self, samples: &[f32], language: &str, num_threads: i32)
    -> Result<String, AsrError>;
}

type EngineFuture = BoxFuture<'static, Result<Arc<dyn InferenceEngine>, AsrError>>;
type EngineLoader = Box<dyn Fn(ModelConfig) -> EngineFuture + Send + Sync>;

/// Whisper-backed transcriber. The engine is loaded lazily on the first
/// request and shared read-only afterwards; each call gets its own inference
/// state, so concurrent requests only contend on the one-time load.
pub struct LocalTranscriber {
    config: ModelConfig,
    loader: EngineLoader,
    engine: OnceCell<Arc<dyn InferenceEngine>>,
}

impl LocalTranscriber {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_loader(
            config,
            Box::new(|config| {
                let fut: EngineFuture = Box::pin(load_whisper_engine(config));
                fut
            }),
        )
    }

    fn with_loader(config: ModelConfig, loader: EngineLoader) -> Self {
        Self {
            config,
            loader,
            engine: OnceCell::new(),
        }
    }

    /// First caller fetches and loads the model; concurrent first requests
    /// wait on that same initialization instead of racing it.
    async fn engine(&self) -> Result<Arc<dyn InferenceEngine>, AsrError> {
        self.engine
            .get_or_try_init(|| (self.loader)(self.config.clone()))
            .await
            .cloned()
    }
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, AsrError> {
        let engine = self.engine().await?;
        let path = audio.to_path_buf();
        let language = self.config.language.clone();
        let num_threads = self.config.num_threads;

        tokio::task::spawn_blocking(move || {
            let samples = decode_wav_mono_16khz(&path)?;
            engine.infer(&samples, &language, num_threads)
        })
        .await
        .map_err(|e| AsrError::Model(format!("inference task failed: {e}")))?
    }
}

async fn load_whisper_engine(config: ModelConfig) -> Result<Arc<dyn InferenceEngine>, AsrError> {
    let path = download::ensure_model(&config.model, &config.models_dir)
        .await
        .map_err(|e| AsrError::Model(format!("model fetch failed: {e}")))?;

    info!("Loading whisper model from {}", path.display());
    let ctx = tokio::task::spawn_blocking(move || {
        let mut params = WhisperContextParameters::default();
        // GPU is attempted when available, CPU otherwise; nothing to configure.
        params.use_gpu(true);

        let model_path = path
            .to_str()
            .ok_or_else(|| "model path is not valid UTF-8".to_string())?;
        WhisperContext::new_with_params(model_path, params)
            .map_err(|e| format!("failed to load model: {e}"))
    })
    .await
    .map_err(|e| AsrError::Model(format!("model load task failed: {e}")))?
    .map_err(AsrError::Model)?;

    info!("Whisper model loaded");
    Ok(Arc::new(WhisperEngine { ctx }))
}

struct WhisperEngine {
    ctx: WhisperContext,
}

impl InferenceEngine for WhisperEngine {
    fn infer(
        &self,
        samples: &[f32],
        language: &str,
        num_threads: i32,
    ) -> Result<String, AsrError> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language));
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_threads);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| AsrError::Model(format!("failed to create whisper state: {e}")))?;
        state
            .full(params, samples)
            .map_err(|e| AsrError::Model(format!("inference failed: {e}")))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| AsrError::Model(format!("failed to get segment count: {e}")))?;

        let mut combined = String::new();
        for i in 0..num_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| AsrError::Model(format!("failed to get segment text: {e}")))?;
            combined.push_str(&text);
        }

        Ok(combined.trim().to_string())
    }
}

/// Decodes the staged WAV, downmixes interleaved channels to mono, and
/// resamples to the model's 16 kHz rate.
fn decode_wav_mono_16khz(path: &Path) -> Result<Vec<f32>, AsrError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AsrError::Model(format!("failed to read audio: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AsrError::Model(format!("failed to decode audio: {e}")))?,
        hound::SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| AsrError::Model(format!("failed to decode audio: {e}")))?
        }
    };

    let channels = spec.channels as usize;
    let mono: Vec<f32> = if channels <= 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    resampler::resample_to_16khz(&mono, spec.sample_rate)
        .map_err(|e| AsrError::Model(format!("resampling failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..channels {
                writer.write_sample(((i % 100) as i16) * 100).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn model_config() -> ModelConfig {
        ModelConfig {
            model: "base.en".to_string(),
            models_dir: PathBuf::from("models"),
            language: "en".to_string(),
            num_threads: 2,
        }
    }

    struct CountingEngine;

    impl InferenceEngine for CountingEngine {
        fn infer(
            &self,
            _samples: &[f32],
            _language: &str,
            _num_threads: i32,
        ) -> Result<String, AsrError> {
            Ok("counted words".to_string())
        }
    }

    #[test]
    fn stereo_wav_downmixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16000, 1600);

        let samples = decode_wav_mono_16khz(&path).unwrap();
        assert_eq!(samples.len(), 1600);
    }

    #[test]
    fn non_16khz_wav_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("8k.wav");
        write_wav(&path, 1, 8000, 800);

        let samples = decode_wav_mono_16khz(&path).unwrap();
        assert!(samples.len() > 1400 && samples.len() <= 1600);
    }

    #[test]
    fn unreadable_audio_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.wav");
        std::fs::write(&path, b"not a riff header").unwrap();

        match decode_wav_mono_16khz(&path) {
            Err(AsrError::Model(_)) => {}
            other => panic!("expected model error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_first_requests_load_the_engine_once() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("clip.wav");
        write_wav(&wav, 1, 16000, 1600);

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let transcriber = Arc::new(LocalTranscriber::with_loader(
            model_config(),
            Box::new(move |_config| {
                let counter = Arc::clone(&counter);
                let fut: EngineFuture = Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    // Hold the load open long enough for every request to pile up on it.
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Arc::new(CountingEngine) as Arc<dyn InferenceEngine>)
                });
                fut
            }),
        ));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let transcriber = Arc::clone(&transcriber);
            let wav = wav.clone();
            tasks.push(tokio::spawn(
                async move { transcriber.transcribe(&wav).await },
            ));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "counted words");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeat_calls_reuse_the_loaded_engine() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("clip.wav");
        write_wav(&wav, 1, 16000, 1600);

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let transcriber = LocalTranscriber::with_loader(
            model_config(),
            Box::new(move |_config| {
                let counter = Arc::clone(&counter);
                let fut: EngineFuture = Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(CountingEngine) as Arc<dyn InferenceEngine>)
                });
                fut
            }),
        );

        for _ in 0..3 {
            assert_eq!(transcriber.transcribe(&wav).await.unwrap(), "counted words");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
