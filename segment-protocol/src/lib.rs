use serde::{Deserialize, Serialize};

/// Mandatory content type for inbound LPCM audio frames.
pub const CONTENT_TYPE_LPCM: &str = "audio/lpcm";

/// Comma-separated list of capability names the client is willing to accept.
pub const CAPABILITIES_HEADER: &str = "X-Blobfish-Capabilities";

/// Byte suffix that, when found at the end of a binary frame, triggers the
/// end-of-stream flush path.
pub const TERMINATOR_HEADER: &str = "X-Blobfish-Terminator";

/// One side of a causal speech/void timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Speech,
    Void,
}

/// An immutable-by-convention timeline entry.
///
/// `end` is always strictly greater than `begin`; zero-length segments are
/// never constructed (see `segment-core`'s append/merge helper).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub begin: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(kind: SegmentKind, begin: f64, end: f64) -> Self {
        Self { kind, begin, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }

    /// `{"kind":"speech","begin":0.0,"end":1.5}\n`
    pub fn to_json_line(&self) -> String {
        let mut line = serde_json::to_string(self).expect("Segment serializes infallibly");
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        let s = Segment::new(SegmentKind::Speech, 0.0, 1.5);
        assert_eq!(
            serde_json::to_string(&s).unwrap(),
            r#"{"kind":"speech","begin":0.0,"end":1.5}"#
        );
        let v = Segment::new(SegmentKind::Void, 1.5, 2.0);
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"kind":"void","begin":1.5,"end":2.0}"#
        );
    }

    #[test]
    fn to_json_line_appends_newline() {
        let s = Segment::new(SegmentKind::Speech, 0.0, 1.0);
        assert!(s.to_json_line().ends_with('\n'));
    }

    #[test]
    fn duration_is_end_minus_begin() {
        let s = Segment::new(SegmentKind::Speech, 1.0, 3.5);
        assert_eq!(s.duration(), 2.5);
    }
}
