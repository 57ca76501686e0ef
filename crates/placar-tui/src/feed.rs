// SSE subscriptions: one long-lived task per channel, forwarding what the
// server pushes to the app as `FeedEvent`s.

use futures_util::{Stream, StreamExt};
use placar_core::Channel;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::protocol::FeedEvent;

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// The set of running channel subscriptions.
///
/// Reconnects after transport failures are left to `reqwest-eventsource`'s
/// retry policy. A task only ends on a fatal response (bad status or content
/// type), when the app stops listening, or on `close`.
#[derive(Default)]
pub struct Subscriptions {
    handles: Vec<(Channel, JoinHandle<()>)>,
}

impl Subscriptions {
    /// Open all five channels. Any subscriptions already held are closed
    /// first, so reconnecting never duplicates a channel.
    pub fn connect(&mut self, config: &Config, http: &reqwest::Client, tx: mpsc::Sender<FeedEvent>) {
        self.close();
        for channel in Channel::ALL {
            let url = config.channel_url(channel);
            let request = http.get(&url).header("Accept", "text/event-stream");
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let es = match request.eventsource() {
                    Ok(es) => es,
                    Err(e) => {
                        let _ = tx
                            .send(FeedEvent::Error {
                                channel,
                                message: format!("failed to create event source: {e}"),
                            })
                            .await;
                        let _ = tx.send(FeedEvent::Closed(channel)).await;
                        return;
                    }
                };
                info!("[{}] subscribing to {}", channel, url);
                subscribe(channel, es, tx).await;
            });
            self.handles.push((channel, handle));
        }
    }

    /// Stop every subscription. Safe to call repeatedly.
    pub fn close(&mut self) {
        for (channel, handle) in self.handles.drain(..) {
            debug!("[{}] closing subscription", channel);
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.close();
    }
}

async fn subscribe(channel: Channel, mut es: EventSource, tx: mpsc::Sender<FeedEvent>) {
    let outcome = pump(channel, (&mut es).map(to_item), &tx).await;
    es.close();
    if outcome.is_ok() {
        let _ = tx.send(FeedEvent::Closed(channel)).await;
    }
    info!("[{}] subscription ended", channel);
}

// ---------------------------------------------------------------------------
// Stream processing
// ---------------------------------------------------------------------------

/// Transport-neutral view of one SSE stream item.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SseItem {
    Open,
    Message { event: String, data: String },
    Failure { message: String, fatal: bool },
}

fn to_item(result: Result<Event, reqwest_eventsource::Error>) -> SseItem {
    match result {
        Ok(Event::Open) => SseItem::Open,
        Ok(Event::Message(msg)) => SseItem::Message {
            event: msg.event,
            data: msg.data,
        },
        Err(err) => {
            let fatal = matches!(
                err,
                reqwest_eventsource::Error::InvalidStatusCode(..)
                    | reqwest_eventsource::Error::InvalidContentType(..)
            );
            SseItem::Failure {
                message: error_message(&err),
                fatal,
            }
        }
    }
}

fn error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("server returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => format!("network error: {e}"),
        reqwest_eventsource::Error::StreamEnded => "stream ended, reconnecting".to_string(),
        other => format!("stream error: {other}"),
    }
}

/// Whether an SSE event with this `event:` name belongs on `channel`.
///
/// Unnamed events (`message`) are accepted; named ones must match the
/// channel in either naming scheme.
pub(crate) fn accepts_event(channel: Channel, event_name: &str) -> bool {
    let name = event_name.trim();
    name.is_empty() || name == "message" || Channel::from_name(name) == Some(channel)
}

/// Forward `items` to `tx` until the stream ends or fails fatally.
///
/// Returns `Err(())` when the receiver is gone.
pub(crate) async fn pump<S>(channel: Channel, mut items: S, tx: &mpsc::Sender<FeedEvent>) -> Result<(), ()>
where
    S: Stream<Item = SseItem> + Unpin,
{
    while let Some(item) = items.next().await {
        let event = match item {
            SseItem::Open => {
                info!("[{}] connected", channel);
                FeedEvent::Connected(channel)
            }
            SseItem::Message { event, data } => {
                if !accepts_event(channel, &event) {
                    debug!("[{}] ignoring SSE event {:?}", channel, event);
                    continue;
                }
                if data.trim().is_empty() {
                    continue;
                }
                FeedEvent::Payload { channel, data }
            }
            SseItem::Failure { message, fatal } => {
                warn!(%channel, fatal, "SSE error: {}", message);
                tx.send(FeedEvent::Error { channel, message })
                    .await
                    .map_err(|_| ())?;
                if fatal {
                    return Ok(());
                }
                continue;
            }
        };
        tx.send(event).await.map_err(|_| ())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
