/// One reassembled analysis window handed back to the caller by
/// [`ChunkDivider::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub bytes: Vec<u8>,
    pub last: bool,
}

/// Reframes an arbitrary stream of byte chunks into a strict sequence of
/// fixed-length analysis windows.
///
/// This implements the divider as an explicit output rather than a
/// suspendable callback (design note §9, option (a)): `add` returns the
/// windows completed by this call, in arrival order, and the caller awaits
/// each one's processing before moving to the next. That preserves the
/// same serialization guarantee a callback would give, without requiring
/// `segment-core` to depend on an async runtime.
pub struct ChunkDivider {
    window_len: usize,
    buf: Vec<u8>,
}

impl ChunkDivider {
    /// `window_len` is the number of bytes per window. Zero is a programmer
    /// error.
    pub fn new(window_len: usize) -> Self {
        assert!(window_len > 0, "ChunkDivider window length must be non-zero");
        Self {
            window_len,
            buf: Vec::with_capacity(window_len),
        }
    }

    /// Appends `chunk` and returns every window it completes, in order.
    /// If `last` is true and residual bytes remain after appending, a final
    /// short window marked `last = true` is appended to the result; an
    /// empty residual produces no window.
    pub fn add(&mut self, mut chunk: &[u8], last: bool) -> Vec<Window> {
        let mut windows = Vec::new();

        while !chunk.is_empty() {
            let need = self.window_len - self.buf.len();
            let take = need.min(chunk.len());
            self.buf.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];

            if self.buf.len() == self.window_len {
                let full = std::mem::replace(&mut self.buf, Vec::with_capacity(self.window_len));
                windows.push(Window { bytes: full, last: false });
            }
        }

        if last && !self.buf.is_empty() {
            let residual = std::mem::take(&mut self.buf);
            windows.push(Window { bytes: residual, last: true });
        }

        windows
    }
}
