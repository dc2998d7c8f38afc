use segment_protocol::{Segment, SegmentKind};

/// Converts an annotator's per-window speech intervals into a monotonic,
/// non-overlapping, globally-continuous timeline of `{speech, void}`
/// segments.
///
/// `SegmentProducer` is a single-threaded, purely synchronous state
/// machine: one call to [`next_window`](Self::next_window) per analysis
/// window, in order. It never re-emits or rewrites a previously returned
/// segment.
pub struct SegmentProducer {
    window_duration: f64,
    min_speech_duration: f64,
    max_segment_duration: f64,
    time_epsilon: f64,

    time_offset: f64,
    trailing_begin: f64,
    trailing_kind: SegmentKind,
    pending_short: Option<Segment>,
}

impl SegmentProducer {
    /// `window_duration` (`D`), `min_speech_duration` (`m`),
    /// `max_segment_duration` (`M`) and `time_epsilon` (`ε`) are all in
    /// seconds and must satisfy `0 < ε < m <= M` and `D > 0`.
    pub fn new(
        window_duration: f64,
        min_speech_duration: f64,
        max_segment_duration: f64,
        time_epsilon: f64,
    ) -> Self {
        assert!(window_duration > 0.0, "window_duration must be positive");
        assert!(time_epsilon > 0.0, "time_epsilon must be positive");
        assert!(
            time_epsilon < min_speech_duration,
            "time_epsilon must be well below min_speech_duration"
        );
        assert!(
            min_speech_duration <= max_segment_duration,
            "min_speech_duration must not exceed max_segment_duration"
        );

        Self {
            window_duration,
            min_speech_duration,
            max_segment_duration,
            time_epsilon,
            time_offset: 0.0,
            trailing_begin: 0.0,
            trailing_kind: SegmentKind::Void,
            pending_short: None,
        }
    }

    /// Feeds one window's worth of window-local `(begin, end)` intervals
    /// (ascending, ideally non-overlapping) and returns the segments this
    /// call has newly committed to the timeline. `last` flushes any
    /// trailing speech and any still-pending short speech fragment.
    pub fn next_window(
        &mut self,
        intervals: impl IntoIterator<Item = (f64, f64)>,
        last: bool,
    ) -> Vec<Segment> {
        let cleaned = coalesce_overlaps(intervals);
        let t = self.time_offset;
        let d = self.window_duration;
        let mut out = Vec::new();

        if cleaned.is_empty() {
            append(&mut out, self.trailing_kind, self.trailing_begin, t);
            append(&mut out, SegmentKind::Void, t, t + d);
            self.trailing_begin = t + d;
            self.trailing_kind = SegmentKind::Void;
        } else {
            for (b, e) in cleaned {
                let g_b = t + b;
                let g_e = t + e;
                let open_begin = b < self.time_epsilon;
                let open_end = e > d - self.time_epsilon;

                match (open_begin, open_end) {
                    (false, false) => {
                        append(&mut out, self.trailing_kind, self.trailing_begin, g_b);
                        append(&mut out, SegmentKind::Speech, g_b, g_e);
                        self.trailing_begin = g_e;
                        self.trailing_kind = SegmentKind::Void;
                    }
                    (true, false) => {
                        append(&mut out, SegmentKind::Speech, self.trailing_begin, g_e);
                        self.trailing_begin = g_e;
                        self.trailing_kind = SegmentKind::Void;
                    }
                    (false, true) => {
                        append(&mut out, self.trailing_kind, self.trailing_begin, g_b);
                        self.trailing_begin = g_b;
                        self.trailing_kind = SegmentKind::Speech;
                        break;
                    }
                    (true, true) => break,
                }
            }

            if self.trailing_kind == SegmentKind::Void {
                append(&mut out, SegmentKind::Void, self.trailing_begin, t + d);
                self.trailing_begin = t + d;
            } else {
                while (t + d) - self.trailing_begin > self.max_segment_duration {
                    let begin = self.trailing_begin;
                    let end = begin + self.max_segment_duration;
                    append(&mut out, SegmentKind::Speech, begin, end);
                    self.trailing_begin = end;
                }
            }
        }

        if last && self.trailing_kind == SegmentKind::Speech {
            append(&mut out, SegmentKind::Speech, self.trailing_begin, t + d);
            self.trailing_begin = t + d;
            self.trailing_kind = SegmentKind::Void;
        }

        let merged = self.merge_short_speech(out, last);
        let split = split_long_segments(merged, self.max_segment_duration);

        self.time_offset += d;
        split
    }

    /// Absorbs sub-`min_speech_duration` speech fragments into whatever
    /// segment follows, emitting the accumulated run once it reaches
    /// `min_speech_duration` (or at end of stream).
    fn merge_short_speech(&mut self, raw: Vec<Segment>, last: bool) -> Vec<Segment> {
        let mut out = Vec::with_capacity(raw.len());

        for seg in raw {
            if let Some(pending) = self.pending_short.as_mut() {
                pending.end = seg.end;
                if pending.duration() >= self.min_speech_duration {
                    out.push(self.pending_short.take().unwrap());
                }
            } else if seg.kind == SegmentKind::Speech && seg.duration() < self.min_speech_duration {
                self.pending_short = Some(seg);
            } else {
                out.push(seg);
            }
        }

        if last {
            if let Some(p) = self.pending_short.take() {
                out.push(p);
            }
        }

        out
    }
}

fn append(out: &mut Vec<Segment>, kind: SegmentKind, begin: f64, end: f64) {
    if end <= begin {
        return;
    }
    if let Some(tail) = out.last_mut() {
        if tail.kind == kind && tail.end == begin {
            tail.end = end;
            return;
        }
    }
    out.push(Segment::new(kind, begin, end));
}

/// Replaces overlapping or touching input intervals with their union,
/// keeping ascending order. The contract assumes already-sorted,
/// non-overlapping input; this is defensive coalescing for the case
/// (left open by the source material) where the annotator emits
/// overlapping intervals.
fn coalesce_overlaps(intervals: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    let mut result: Vec<(f64, f64)> = Vec::new();
    for (b, e) in intervals {
        if e <= b {
            continue;
        }
        if let Some(tail) = result.last_mut() {
            if b <= tail.1 {
                if e > tail.1 {
                    tail.1 = e;
                }
                continue;
            }
        }
        result.push((b, e));
    }
    result
}

fn split_long_segments(segments: Vec<Segment>, max_duration: f64) -> Vec<Segment> {
    let mut result = Vec::with_capacity(segments.len());
    for seg in segments {
        let mut begin = seg.begin;
        let end = seg.end;
        while end - begin > max_duration {
            result.push(Segment::new(seg.kind, begin, begin + max_duration));
            begin += max_duration;
        }
        result.push(Segment::new(seg.kind, begin, end));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use SegmentKind::{Speech, Void};

    fn producer() -> SegmentProducer {
        SegmentProducer::new(100.0, 5.0, 150.0, 2.0)
    }

    fn seg(kind: SegmentKind, begin: f64, end: f64) -> Segment {
        Segment::new(kind, begin, end)
    }

    #[test]
    fn s1_three_intervals_in_first_window() {
        let mut p = producer();
        let out = p.next_window([(0.0, 10.0), (20.0, 50.0), (75.0, 99.0)], false);
        assert_eq!(
            out,
            vec![
                seg(Speech, 0.0, 10.0),
                seg(Void, 10.0, 20.0),
                seg(Speech, 20.0, 50.0),
                seg(Void, 50.0, 75.0),
            ]
        );
    }

    #[test]
    fn s2_continuation_then_new_open_end() {
        let mut p = producer();
        p.next_window([(0.0, 10.0), (20.0, 50.0), (75.0, 99.0)], false);
        let out = p.next_window([(1.0, 15.0), (35.0, 70.0), (85.0, 110.0)], false);
        assert_eq!(
            out,
            vec![
                seg(Speech, 75.0, 115.0),
                seg(Void, 115.0, 135.0),
                seg(Speech, 135.0, 170.0),
                seg(Void, 170.0, 185.0),
            ]
        );
    }

    #[test]
    fn s3_wholly_open_interval_extends_silently() {
        let mut p = producer();
        p.next_window([(0.0, 10.0), (20.0, 50.0), (75.0, 99.0)], false);
        p.next_window([(1.0, 15.0), (35.0, 70.0), (85.0, 110.0)], false);
        let out = p.next_window([(0.0, 100.0)], false);
        assert!(out.is_empty());
    }

    #[test]
    fn s4_split_at_max_duration_of_extended_run() {
        let mut p = producer();
        p.next_window([(0.0, 10.0), (20.0, 50.0), (75.0, 99.0)], false);
        p.next_window([(1.0, 15.0), (35.0, 70.0), (85.0, 110.0)], false);
        p.next_window([(0.0, 100.0)], false);
        let out = p.next_window([(25.0, 55.0), (65.0, 101.0)], false);
        assert_eq!(
            out,
            vec![
                seg(Speech, 185.0, 335.0),
                seg(Speech, 335.0, 355.0),
                seg(Void, 355.0, 365.0),
            ]
        );
    }

    #[test]
    fn s5_empty_window_after_trailing_speech_closes_and_pads() {
        let mut p = producer();
        // Open-end interval leaves a trailing speech run at begin=70.
        p.next_window([(70.0, 100.0)], false);
        // An empty interval list always closes whatever is trailing (S5's
        // rule), unlike a wholly-open interval (S3), which silently extends.
        let out = p.next_window(std::iter::empty(), false);
        assert_eq!(out, vec![seg(Speech, 70.0, 100.0), seg(Void, 100.0, 200.0)]);
    }

    #[test]
    fn s6_final_flush_emits_trailing_speech() {
        let mut p = producer();
        // A single window carrying two intervals, the second left open at
        // the window's end, with `last=true`: the final flush must close
        // the trailing speech run at T+D instead of leaving it open.
        let out = p.next_window([(20.0, 30.0), (50.0, 99.0)], true);
        assert_eq!(
            out,
            vec![
                seg(Void, 0.0, 20.0),
                seg(Speech, 20.0, 30.0),
                seg(Void, 30.0, 50.0),
                seg(Speech, 50.0, 100.0),
            ]
        );
    }

    #[test]
    fn s7_min_speech_merging_glues_short_fragments() {
        let mut p = SegmentProducer::new(100.0, 40.0, 150.0, 2.0);
        let out = p.next_window([(0.0, 10.0), (20.0, 50.0), (75.0, 99.0)], false);
        assert_eq!(out, vec![seg(Speech, 0.0, 50.0), seg(Void, 50.0, 75.0)]);
    }

    #[test]
    fn empty_intervals_pad_a_full_void_window() {
        let mut p = producer();
        let out = p.next_window(std::iter::empty(), false);
        assert_eq!(out, vec![seg(Void, 0.0, 100.0)]);
    }

    #[test]
    fn contiguity_holds_across_many_windows() {
        let mut p = producer();
        let mut all = Vec::new();
        let inputs: [&[(f64, f64)]; 4] = [
            &[(10.0, 40.0)],
            &[],
            &[(5.0, 90.0)],
            &[(0.0, 20.0), (60.0, 80.0)],
        ];
        for (i, intervals) in inputs.iter().enumerate() {
            let last = i == inputs.len() - 1;
            all.extend(p.next_window(intervals.iter().copied(), last));
        }
        for w in all.windows(2) {
            assert_eq!(w[0].end, w[1].begin, "contiguity violated: {:?}", all);
            assert_ne!(w[0].kind, w[1].kind, "same-kind neighbors: {:?}", all);
        }
    }

    #[test]
    fn no_emitted_segment_exceeds_max_duration() {
        let mut p = producer();
        let mut all = Vec::new();
        for _ in 0..5 {
            all.extend(p.next_window([(0.0, 100.0)], false));
        }
        all.extend(p.next_window(std::iter::empty(), true));
        for s in &all {
            assert!(s.duration() <= 150.0 + 1e-9, "segment too long: {s:?}");
        }
    }

    #[test]
    fn overlapping_intervals_are_coalesced_into_their_union() {
        let mut p = producer();
        let out = p.next_window([(10.0, 30.0), (20.0, 40.0), (35.0, 60.0)], false);
        assert_eq!(
            out,
            vec![
                seg(Void, 0.0, 10.0),
                seg(Speech, 10.0, 60.0),
                seg(Void, 60.0, 100.0),
            ]
        );
    }
}
