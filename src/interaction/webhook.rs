//! HTTP endpoints receiving pull-request events from CI.

use axum::{Router, body::Bytes, extract::State, http::StatusCode, response::{IntoResponse, Response}, routing::post};
use tracing::{error, info, instrument, warn};

use crate::{base::types::EventKind, notification, runtime::Runtime};

/// Build the webhook router: one `POST` route per event kind.
pub fn router(runtime: Runtime) -> Router {
    EventKind::ALL
        .into_iter()
        .fold(Router::<Runtime>::new(), |router, kind| {
            router.route(kind.path(), post(move |State(runtime): State<Runtime>, body: Bytes| handle_event(runtime, kind, body)))
        })
        .with_state(runtime)
}

/// Decode, render and dispatch one event.
///
/// The body is decoded as JSON whatever its content type. Malformed bodies
/// answer 400 before anything is rendered or sent.
#[instrument(skip_all, fields(kind = %kind))]
async fn handle_event(runtime: Runtime, kind: EventKind, body: Bytes) -> Response {
    let event = match kind.decode(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!("Rejecting `{}` event with malformed body: {}", kind, err);
            return (StatusCode::BAD_REQUEST, "Invalid request parameters").into_response();
        }
    };

    let Some(message) = notification::render(&event, &runtime.names, &runtime.titles).await else {
        info!("Skipping suppressed `{}` event.", kind);
        return StatusCode::OK.into_response();
    };

    if let Err(err) = runtime.dispatcher.dispatch(kind, message).await {
        error!("Error while dispatching `{}` notification: {}", kind, err);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to deliver notification").into_response();
    }

    StatusCode::OK.into_response()
}
