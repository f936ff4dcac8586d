// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live event streaming for connected clients.
//!
//! Events tell clients that something changed, such as a class starting or
//! a booking arriving. They are informational only: clients fetch the
//! current data over HTTP when an event arrives, and nothing is executed
//! over the socket.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use poachcoach_domain::LifecycleTransition;
use poachcoach_persistence::format_timestamp;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Events buffered per subscriber. Slow clients lose the oldest events.
const EVENT_BUFFER_SIZE: usize = 100;

/// Live event types, serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A class became active. Clients load its roster.
    ClassStarted {
        /// The session.
        session_id: i64,
    },
    /// A class ended.
    ClassEnded {
        /// The session.
        session_id: i64,
    },
    /// The coach cancelled a class.
    ClassCancelled {
        /// The session.
        session_id: i64,
    },
    /// A student booked a class.
    BookingCreated {
        /// The session.
        session_id: i64,
        /// The student.
        student_id: i64,
    },
    /// A student cancelled a booking.
    BookingCancelled {
        /// The session.
        session_id: i64,
        /// The student.
        student_id: i64,
    },
    /// A coach recorded attendance.
    AttendanceRecorded {
        /// The session.
        session_id: i64,
        /// Students whose record changed.
        student_ids: Vec<i64>,
    },
    /// Sent once when a client connects.
    Connected {
        /// Server timestamp (RFC 3339, UTC).
        timestamp: String,
    },
}

impl From<LifecycleTransition> for LiveEvent {
    fn from(transition: LifecycleTransition) -> Self {
        match transition {
            LifecycleTransition::ClassStarted { session_id } => Self::ClassStarted { session_id },
            LifecycleTransition::ClassEnded { session_id } => Self::ClassEnded { session_id },
        }
    }
}

/// Fans live events out to every connected client.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    /// Creates a broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Sends an event to every subscriber. Without subscribers the event is
    /// dropped.
    pub fn broadcast(&self, event: LiveEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "Broadcast live event"),
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Subscribes to events sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for GET `/api/live`. Upgrades to a WebSocket and streams events.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let broadcaster: LiveEventBroadcaster = app_state.live.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

fn encode(event: &LiveEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!(?e, "Failed to serialize live event");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, broadcaster: LiveEventBroadcaster) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected: LiveEvent = LiveEvent::Connected {
        timestamp: format_timestamp(OffsetDateTime::now_utc())
            .unwrap_or_else(|_| String::from("unknown")),
    };
    let Some(message) = encode(&connected) else {
        return;
    };
    if sender.send(message).await.is_err() {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(message) = encode(&event) else {
                        continue;
                    };
                    if sender.send(message).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Ignoring message from live client");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_receivers_is_dropped() {
        let broadcaster = LiveEventBroadcaster::new();
        broadcaster.broadcast(LiveEvent::ClassStarted { session_id: 1 });
        assert_eq!(broadcaster.tx.receiver_count(), 0);
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let broadcaster = LiveEventBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.broadcast(LiveEvent::BookingCreated {
            session_id: 3,
            student_id: 9,
        });

        let expected = LiveEvent::BookingCreated {
            session_id: 3,
            student_id: 9,
        };
        assert_eq!(first.try_recv().unwrap(), expected);
        assert_eq!(second.try_recv().unwrap(), expected);
    }

    #[test]
    fn test_events_are_tagged_by_type() {
        let json: String = serde_json::to_string(&LiveEvent::from(
            LifecycleTransition::ClassStarted { session_id: 5 },
        ))
        .unwrap();
        assert_eq!(json, r#"{"type":"class_started","session_id":5}"#);

        let json: String = serde_json::to_string(&LiveEvent::AttendanceRecorded {
            session_id: 2,
            student_ids: vec![4, 6],
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"attendance_recorded","session_id":2,"student_ids":[4,6]}"#
        );
    }
}
