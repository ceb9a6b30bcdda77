use anyhow::{Result, anyhow};
use rubato::{Resampler, SincFixedIn, SincInterpolationType, WindowFunction};

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Resamples mono audio to the 16 kHz the model expects. Input at the target
/// rate passes through untouched.
pub fn resample_to_16khz(samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
    if sample_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Err(anyhow!("no audio frames to resample"));
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = TARGET_SAMPLE_RATE as f64 / sample_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)?;

    let resampled = resampler.process(&[samples.to_vec()], None)?;
    let channel = &resampled[0];

    // Skip the filter delay and keep the expected number of output frames.
    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio) as usize;
    let end = (delay + expected).min(channel.len());
    let start = delay.min(end);

    Ok(channel[start..end].to_vec())
}
