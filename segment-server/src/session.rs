use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::http::HeaderMap;
use futures_util::{SinkExt, StreamExt};
use segment_core::{
    Annotator, ChunkDivider, SegmentProducer, Window, CAPABILITIES_HEADER, CONTENT_TYPE_LPCM,
    TERMINATOR_HEADER,
};
use tracing::{debug, info, warn};

use crate::capability;
use crate::error::SessionError;
use crate::pcm;
use crate::query::SegmentQuery;
use crate::AppState;

/// Boundary tolerance in seconds, matching the upstream fixed `0.1`.
const TIME_EPSILON: f64 = 0.1;

/// Owns one connection's `ChunkDivider` + `SegmentProducer`, neither of
/// which is shared across sessions or entered concurrently.
pub struct Session {
    divider: ChunkDivider,
    producer: SegmentProducer,
    annotator: Arc<dyn Annotator>,
    channels: u32,
    sample_rate: u32,
    sample_type: crate::query::SampleType,
    terminator: Option<Vec<u8>>,
}

impl Session {
    pub fn new(query: &SegmentQuery, annotator: Arc<dyn Annotator>, terminator: Option<Vec<u8>>) -> Self {
        Self {
            divider: ChunkDivider::new(query.window_len_bytes()),
            producer: SegmentProducer::new(
                query.window_duration,
                query.min_speech_duration,
                query.max_segment_duration,
                TIME_EPSILON,
            ),
            annotator,
            channels: query.channels,
            sample_rate: query.sample_rate,
            sample_type: query.sample_type,
            terminator,
        }
    }

    /// Feeds one inbound binary frame through the divider. If the frame
    /// ends with the configured terminator, the terminator bytes are
    /// stripped and the residual is flushed as the final window; the caller
    /// is responsible for closing the socket afterwards.
    ///
    /// Returns `true` if this frame triggered the terminator flush.
    pub async fn handle_frame(
        &mut self,
        frame: &[u8],
        socket: &mut WebSocket,
    ) -> Result<bool, SessionError> {
        let (payload, is_terminal) = match &self.terminator {
            Some(t) if !t.is_empty() && frame.ends_with(t.as_slice()) => {
                debug!("detected pcm stream terminator");
                (&frame[..frame.len() - t.len()], true)
            }
            _ => (frame, false),
        };

        for window in self.divider.add(payload, is_terminal) {
            self.process_window(window, socket).await?;
        }

        Ok(is_terminal)
    }

    async fn process_window(
        &mut self,
        window: Window,
        socket: &mut WebSocket,
    ) -> Result<(), SessionError> {
        let mono = pcm::normalize(&window.bytes, self.channels, self.sample_type);
        let annotator = self.annotator.clone();
        let sample_rate = self.sample_rate;

        let intervals = tokio::task::spawn_blocking(move || annotator.annotate(&mono, sample_rate))
            .await
            .map_err(|e| SessionError::Programmer(format!("annotator task panicked: {e}")))??;

        let segments = self.producer.next_window(intervals, window.last);

        for segment in segments {
            if segment.duration() <= TIME_EPSILON {
                continue;
            }
            debug!(
                kind = ?segment.kind,
                begin = segment.begin,
                end = segment.end,
                "sending segment"
            );
            let line = segment.to_json_line();
            socket
                .send(Message::Text(line.into()))
                .await
                .map_err(SessionError::Transport)?;
        }

        Ok(())
    }
}

/// Drives one accepted WebSocket connection end to end: validates the
/// already-upgraded request, then loops on inbound binary frames until the
/// client disconnects, sends a terminator, or a session error forces an
/// abnormal close.
///
/// The upgrade happens unconditionally before any of this runs (spec.md §6:
/// "accept the upgrade before validation"), so every rejection path below
/// closes the now-open socket with a specific code and reason rather than
/// failing the HTTP handshake.
pub async fn run(mut socket: WebSocket, query: SegmentQuery, headers: HeaderMap, state: AppState) {
    if let Err(e) = query.validate() {
        close_with(&mut socket, e.close_code, e.reason).await;
        return;
    }

    match headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(CONTENT_TYPE_LPCM) => {}
        _ => {
            close_with(
                &mut socket,
                1008,
                format!("unsupported audio type, expected '{CONTENT_TYPE_LPCM}'"),
            )
            .await;
            return;
        }
    }

    let capabilities_header = match headers.get(CAPABILITIES_HEADER).and_then(|v| v.to_str().ok()) {
        Some(v) => v,
        None => {
            close_with(
                &mut socket,
                1002,
                format!("missing '{CAPABILITIES_HEADER}' header"),
            )
            .await;
            return;
        }
    };

    if capability::find_request_capability(&state.enabled_capabilities, capabilities_header).is_none() {
        close_with(
            &mut socket,
            1002,
            format!(
                "missing, unknown or disabled capability, expected one of {:?} in '{CAPABILITIES_HEADER}' header",
                state.enabled_capabilities
            ),
        )
        .await;
        return;
    }

    // The header's raw octets already are the ISO-8859-1 byte sequence
    // (spec.md §6); going through `to_str()` first would reject any byte
    // above 0x7f as invalid UTF-8 and silently disable the terminator.
    let terminator = headers
        .get(TERMINATOR_HEADER)
        .map(|v| v.as_bytes().to_vec());

    let mut session = Session::new(&query, state.annotator.clone(), terminator);
    info!("segment session opened");

    loop {
        let frame = match socket.next().await {
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Close(_))) | None => {
                debug!("client closed the connection");
                break;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(error = %e, "transport error, dropping session");
                break;
            }
        };

        match session.handle_frame(&frame, &mut socket).await {
            Ok(true) => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            Ok(false) => {}
            Err(e) => {
                if let Some(code) = e.close_code() {
                    warn!(error = %e, "session error, closing abnormally");
                    close_with(&mut socket, code, e.to_string()).await;
                } else {
                    debug!(error = %e, "transport error, dropping session");
                }
                break;
            }
        }
    }

    info!("segment session closed");
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: String) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}
