use thiserror::Error;

/// The external VAD / speaker-diarization collaborator.
///
/// Implementations receive one normalized analysis window at a time and
/// return ascending, non-overlapping, window-local `(begin, end)` speech
/// intervals in seconds. The core never depends on a specific model's
/// vocabulary — only on this signature.
pub trait Annotator: Send + Sync {
    fn annotate(&self, mono: &[f32], sample_rate: u32) -> Result<Vec<(f64, f64)>, AnnotatorError>;
}

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("annotator backend failure: {0}")]
    Backend(String),
}
