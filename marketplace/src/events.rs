// marketplace/src/events.rs

//! Realtime notifications. Every state change worth telling a dashboard about
//! is published once on a broadcast channel; each SSE subscriber filters the
//! stream down to the events addressed to it.

use adaze_core::{Actor, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{event, Level};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEventKind {
  OrderPlaced {
    order_id: Uuid,
    total_cents: i64,
  },
  OrderStatusChanged {
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
  },
  OrderClaimed {
    order_id: Uuid,
    transporter_id: Uuid,
  },
  ReviewPosted {
    review_id: Uuid,
    product_id: Uuid,
    rating: i16,
  },
  ReviewResponded {
    review_id: Uuid,
    product_id: Uuid,
  },
  SettingsUpdated,
}

impl MarketEventKind {
  pub fn name(&self) -> &'static str {
    match self {
      MarketEventKind::OrderPlaced { .. } => "order_placed",
      MarketEventKind::OrderStatusChanged { .. } => "order_status_changed",
      MarketEventKind::OrderClaimed { .. } => "order_claimed",
      MarketEventKind::ReviewPosted { .. } => "review_posted",
      MarketEventKind::ReviewResponded { .. } => "review_responded",
      MarketEventKind::SettingsUpdated => "settings_updated",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketEvent {
  #[serde(flatten)]
  pub kind: MarketEventKind,
  /// Users this event is addressed to. Empty means everyone.
  #[serde(skip)]
  pub audience: Vec<Uuid>,
  pub at: DateTime<Utc>,
}

impl MarketEvent {
  pub fn new(kind: MarketEventKind, audience: impl IntoIterator<Item = Uuid>) -> Self {
    let mut audience: Vec<Uuid> = audience.into_iter().collect();
    audience.sort_unstable();
    audience.dedup();
    Self {
      kind,
      audience,
      at: Utc::now(),
    }
  }

  pub fn broadcast(kind: MarketEventKind) -> Self {
    Self::new(kind, std::iter::empty())
  }

  pub fn visible_to(&self, actor: &Actor) -> bool {
    actor.is_admin() || self.audience.is_empty() || self.audience.contains(&actor.user_id)
  }

  /// One `text/event-stream` frame.
  pub fn to_sse_frame(&self) -> String {
    let data = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
    format!("event: {}\ndata: {}\n\n", self.kind.name(), data)
  }
}

#[derive(Clone)]
pub struct EventBus {
  sender: broadcast::Sender<MarketEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  /// Returns how many subscribers received the event. Nobody listening is fine.
  pub fn publish(&self, event: MarketEvent) -> usize {
    let name = event.kind.name();
    match self.sender.send(event) {
      Ok(receivers) => {
        event!(Level::DEBUG, event = name, receivers, "Published market event.");
        receivers
      }
      Err(_) => {
        event!(Level::TRACE, event = name, "No subscribers for market event.");
        0
      }
    }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
    self.sender.subscribe()
  }

  pub fn subscriber_count(&self) -> usize {
    self.sender.receiver_count()
  }
}
