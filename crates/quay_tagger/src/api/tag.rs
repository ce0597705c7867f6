use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{debug, error};

use crate::app_state::AppState;
use crate::dto::build::BuildEvent;
use crate::publisher::PublishOutcome;

/// Receives Quay's build completion webhook and tags the built image with the
/// build name.
///
/// The caller always gets a `200 OK`, the result of the tagging only shows up
/// in the logs.
///
/// full endpoint: `/tag`
pub async fn tag_build_post(
    state: State<Arc<AppState>>,
    body: Bytes,
) -> StatusCode {
    let event = match BuildEvent::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            error!("error: {}", e);
            return StatusCode::OK;
        }
    };
    debug!(
        "Build {} of {} finished (trigger: {}, ref: '{}', commit: '{}')",
        event.build_id, event.repository, event.trigger_kind,
        event.trigger_metadata.git_ref, event.trigger_metadata.commit
    );

    let outcome = state.publisher.publish_build_tag(&event).await;
    debug!("Finished build {} of {}, success: {}", event.build_id, event.repository, outcome.is_success());

    match outcome {
        PublishOutcome::Published(images) if images.is_empty() => {
            debug!("No active image found for {}, nothing was tagged", event.repository);
        },
        PublishOutcome::Published(images) => {
            debug!(repository = %event.repository, tag = %event.build_name, "Published {} image(s)", images.len());
        },
        PublishOutcome::PublishFailed { published, failures } => {
            error!(repository = %event.repository, tag = %event.build_name, "{} of {} publish calls failed",
                failures.len(), failures.len() + published.len());
        },
        // already logged where they happened
        PublishOutcome::NoTaggableImage | PublishOutcome::LookupFailed(_) => {},
    }

    StatusCode::OK
}
