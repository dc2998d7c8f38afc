//! A concrete [`Annotator`] built on the `earshot` voice-activity detector.
//!
//! Each `annotate` call constructs a fresh `earshot::Detector`, runs it over
//! the window's samples one native 16 ms frame at a time, thresholds the
//! resulting per-frame speech probability, and run-length-encodes the
//! consecutive speech frames into ascending `(begin, end)` intervals in
//! window-local seconds. No state survives across calls: the window
//! boundary is the only unit of continuity this collaborator needs, matching
//! spec.md's "stateless per-window collaborator" framing.

use earshot::Detector;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use segment_core::{Annotator, AnnotatorError};
use tracing::debug;

/// earshot's native analysis sample rate.
const EARSHOT_SAMPLE_RATE: u32 = 16_000;

/// Samples per native earshot analysis frame (16 ms at 16 kHz).
const FRAME_SAMPLES: usize = 256;
const FRAME_DURATION_S: f64 = 0.016;

/// Threshold above which a frame is classified as speech.
const DEFAULT_THRESHOLD: f32 = 0.5;

pub struct EarshotAnnotator {
    threshold: f32,
}

impl Default for EarshotAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl EarshotAnnotator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Annotator for EarshotAnnotator {
    fn annotate(&self, mono: &[f32], sample_rate: u32) -> Result<Vec<(f64, f64)>, AnnotatorError> {
        let resampled = resample_to_earshot_rate(mono, sample_rate)?;

        let mut detector = Detector::default();
        let samples_i16: Vec<i16> = resampled
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();

        let mut intervals = Vec::new();
        let mut open_begin: Option<usize> = None;
        let mut frame_index = 0usize;

        for chunk in samples_i16.chunks(FRAME_SAMPLES) {
            let probability = if chunk.len() == FRAME_SAMPLES {
                detector.predict_i16(chunk)
            } else {
                // A short trailing remainder can't form a full earshot
                // frame; treat it as a continuation of whatever was open.
                match open_begin {
                    Some(_) => 1.0,
                    None => 0.0,
                }
            };

            let is_speech = probability >= self.threshold;

            match (open_begin, is_speech) {
                (None, true) => open_begin = Some(frame_index),
                (Some(begin), false) => {
                    intervals.push(frames_to_seconds(begin, frame_index));
                    open_begin = None;
                }
                _ => {}
            }

            frame_index += 1;
        }

        if let Some(begin) = open_begin {
            intervals.push(frames_to_seconds(begin, frame_index));
        }

        debug!(
            frames = frame_index,
            intervals = intervals.len(),
            "earshot annotation complete"
        );

        Ok(intervals)
    }
}

fn frames_to_seconds(begin_frame: usize, end_frame: usize) -> (f64, f64) {
    (
        begin_frame as f64 * FRAME_DURATION_S,
        end_frame as f64 * FRAME_DURATION_S,
    )
}

/// Resamples `mono` from `sample_rate` to earshot's native 16 kHz using a
/// windowed sinc filter. A no-op when the source is already 16 kHz.
fn resample_to_earshot_rate(mono: &[f32], sample_rate: u32) -> Result<Vec<f32>, AnnotatorError> {
    if sample_rate == EARSHOT_SAMPLE_RATE || mono.is_empty() {
        return Ok(mono.to_vec());
    }

    let ratio = EARSHOT_SAMPLE_RATE as f64 / sample_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 256,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, mono.len(), 1)
        .map_err(|e| AnnotatorError::Backend(format!("resampler init failed: {e}")))?;

    let output = resampler
        .process(&[mono], None)
        .map_err(|e| AnnotatorError::Backend(format!("resample failed: {e}")))?;

    Ok(output.into_iter().next().unwrap_or_default())
}
