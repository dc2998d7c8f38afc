use serde::Deserialize;

/// Query parameters accepted on the `/segment` upgrade, matching the wire
/// names the original service used (`minsd`, `maxsd`, ...) with the longer
/// aliases also accepted.
#[derive(Debug, Deserialize)]
pub struct SegmentQuery {
    #[serde(rename = "minsd", alias = "min-speech-duration")]
    pub min_speech_duration: f64,

    #[serde(rename = "maxsd", alias = "max-segment-duration")]
    pub max_segment_duration: f64,

    #[serde(rename = "nc", alias = "channels")]
    pub channels: u32,

    #[serde(rename = "sr", alias = "sample-rate")]
    pub sample_rate: u32,

    #[serde(rename = "st", alias = "sample-type")]
    pub sample_type: SampleType,

    #[serde(rename = "wd", alias = "window-duration", default = "default_window_duration")]
    pub window_duration: f64,
}

fn default_window_duration() -> f64 {
    5.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    I16,
    I32,
    F32,
}

impl SampleType {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::I16 => 2,
            SampleType::I32 => 4,
            SampleType::F32 => 4,
        }
    }
}

/// A validation failure and the WebSocket close code it should surface as.
#[derive(Debug)]
pub struct QueryValidationError {
    pub close_code: u16,
    pub reason: String,
}

impl QueryValidationError {
    fn protocol(reason: impl Into<String>) -> Self {
        Self { close_code: 1002, reason: reason.into() }
    }
}

impl SegmentQuery {
    /// Range-checks every field per the documented query table. Type
    /// coercion (e.g. a non-numeric `sr`) is rejected earlier by the axum
    /// extractor itself; this only checks the ranges a typed extractor
    /// can't express.
    pub fn validate(&self) -> Result<(), QueryValidationError> {
        if !(1.0..=60.0).contains(&self.min_speech_duration) {
            return Err(QueryValidationError::protocol(format!(
                "minsd must be in [1, 60], got {}",
                self.min_speech_duration
            )));
        }
        if !(5.0..=300.0).contains(&self.max_segment_duration) {
            return Err(QueryValidationError::protocol(format!(
                "maxsd must be in [5, 300], got {}",
                self.max_segment_duration
            )));
        }
        if self.max_segment_duration < self.min_speech_duration {
            return Err(QueryValidationError::protocol(
                "maxsd must be >= minsd",
            ));
        }
        if !(1..=8).contains(&self.channels) {
            return Err(QueryValidationError::protocol(format!(
                "nc must be in [1, 8], got {}",
                self.channels
            )));
        }
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(QueryValidationError::protocol(format!(
                "sr must be in [8000, 192000], got {}",
                self.sample_rate
            )));
        }
        if !(1.0..=10.0).contains(&self.window_duration) {
            return Err(QueryValidationError::protocol(format!(
                "wd must be in [1, 10], got {}",
                self.window_duration
            )));
        }
        Ok(())
    }

    /// Per-window byte count: `W = D * channels * sample_rate * sample_size`.
    pub fn window_len_bytes(&self) -> usize {
        (self.window_duration
            * self.channels as f64
            * self.sample_rate as f64
            * self.sample_type.bytes_per_sample() as f64)
            .round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SegmentQuery {
        SegmentQuery {
            min_speech_duration: 5.0,
            max_segment_duration: 150.0,
            channels: 1,
            sample_rate: 16_000,
            sample_type: SampleType::I16,
            window_duration: 5.0,
        }
    }

    #[test]
    fn valid_query_passes() {
        assert!(query().validate().is_ok());
    }

    #[test]
    fn min_speech_duration_out_of_range_is_rejected() {
        let mut q = query();
        q.min_speech_duration = 0.5;
        let err = q.validate().unwrap_err();
        assert_eq!(err.close_code, 1002);
    }

    #[test]
    fn max_below_min_is_rejected() {
        let mut q = query();
        q.max_segment_duration = 2.0;
        q.min_speech_duration = 5.0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn window_len_bytes_accounts_for_channels_and_sample_size() {
        let q = query();
        // 5s * 1 channel * 16000 Hz * 2 bytes = 160000 bytes.
        assert_eq!(q.window_len_bytes(), 160_000);
    }
}
