// marketplace/src/web/handlers/event_handlers.rs

use actix_web::{http::header, web, HttpResponse};
use adaze_core::Actor;
use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info, warn};

use crate::events::MarketEvent;
use crate::state::AppState;
use crate::web::AuthenticatedUser;

const CONNECTED_FRAME: &str = ": connected\n\n";

/// Waits for the next event this actor may see. `None` once the bus is gone.
async fn next_visible(rx: &mut Receiver<MarketEvent>, actor: &Actor) -> Option<MarketEvent> {
  loop {
    match rx.recv().await {
      Ok(event) if event.visible_to(actor) => return Some(event),
      Ok(_) => continue,
      Err(RecvError::Lagged(skipped)) => {
        warn!(user_id = %actor.user_id, skipped, "Event subscriber lagged, dropping missed events.");
      }
      Err(RecvError::Closed) => return None,
    }
  }
}

/// Server-sent events for the caller. Subscribes before responding so nothing
/// published after the request is accepted is missed.
pub async fn events_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
  let rx = app_state.events.subscribe();
  let actor = user.actor;
  info!(
    user_id = %actor.user_id,
    subscribers = app_state.events.subscriber_count(),
    "Event stream opened."
  );

  let events = stream::unfold((rx, actor), |(mut rx, actor)| async move {
    let event = next_visible(&mut rx, &actor).await?;
    debug!(user_id = %actor.user_id, event = event.kind.name(), "Streaming event.");
    let frame = web::Bytes::from(event.to_sse_frame());
    Some((Ok::<_, actix_web::Error>(frame), (rx, actor)))
  });
  let body = stream::once(async { Ok::<_, actix_web::Error>(web::Bytes::from_static(CONNECTED_FRAME.as_bytes())) })
    .chain(events);

  HttpResponse::Ok()
    .content_type("text/event-stream")
    .insert_header((header::CACHE_CONTROL, "no-cache"))
    .streaming(body)
}
