use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::query::SegmentQuery;
use crate::session;
use crate::AppState;

/// `GET /segment` — upgrades to a WebSocket and hands the connection to
/// [`session::run`]. Malformed query *types* (e.g. a non-numeric `sr`) are
/// rejected by the `Query` extractor before the upgrade, same as upstream's
/// own pre-dispatch type coercion; range and policy validation happen after
/// accepting the upgrade so the reason can ride on the close frame.
pub async fn segment_ws(
    ws: WebSocketUpgrade,
    Query(query): Query<SegmentQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| session::run(socket, query, headers, state))
}
