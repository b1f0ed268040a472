//! **Realtime channel**: one WebSocket to `{ws_base}/ws/chat`.
//!
//! The channel owns no session state. It turns socket activity into
//! [`SessionEvent`]s on the coordinator's queue:
//!
//! ```text
//! connect ok      -> ChannelOpened
//! text frame      -> ChannelMessage(raw)
//! send failure    -> ChatSendFailed, then ChannelClosed
//! close/error/EOF -> ChannelClosed
//! ```
//!
//! `ChannelClosed` is always the last event a channel posts, so a reconnect that
//! waits for [`ChannelHandle::close`] never sees a stale close after the new open.

use crate::error::{ClientError, ClientResult};
use elysia_core::{OutboundEvent, SessionEvent};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Sending half of an open (or opening) realtime channel.
pub struct ChannelHandle {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    /// Start connecting in the background. Events land on `events`.
    pub fn open(
        url: String,
        events: mpsc::UnboundedSender<SessionEvent>,
        heartbeat: Option<Duration>,
    ) -> Self {
        let (outbound, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(url, rx, events.clone(), heartbeat));
        Self {
            outbound,
            events,
            task,
        }
    }

    /// Queue an event for the socket. Fails once the channel task has ended.
    pub fn send(&self, event: OutboundEvent) -> ClientResult<()> {
        self.outbound
            .send(event)
            .map_err(|_| ClientError::ChannelClosed)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the socket and wait until `ChannelClosed` has been posted.
    pub async fn close(self) {
        let Self {
            outbound,
            events,
            mut task,
        } = self;
        drop(outbound);
        if time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
            warn!("Channel did not close in time, aborting");
            task.abort();
            let _ = events.send(SessionEvent::ChannelClosed);
        }
    }
}

async fn run_channel(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    heartbeat: Option<Duration>,
) {
    if let Err(e) = session(&url, &mut outbound, &events, heartbeat).await {
        warn!(error = %e, %url, "Realtime channel ended");
    }
    outbound.close();
    while let Ok(event) = outbound.try_recv() {
        if matches!(event, OutboundEvent::Chat { .. }) {
            let _ = events.send(SessionEvent::ChatSendFailed("channel closed before send".to_string()));
        }
    }
    let _ = events.send(SessionEvent::ChannelClosed);
}

async fn session(
    url: &str,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    heartbeat: Option<Duration>,
) -> ClientResult<()> {
    debug!(%url, "Connecting realtime channel");
    let (ws_stream, _) = connect_async(url).await?;
    info!(%url, "🔌 Realtime channel connected");
    let _ = events.send(SessionEvent::ChannelOpened);

    let (mut write, mut read) = ws_stream.split();
    let mut ticker = heartbeat.map(heartbeat_interval);

    loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(event) = next else {
                    debug!("Channel handle dropped, closing socket");
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };
                let payload = event.encode()?;
                if let Err(e) = write.send(Message::Text(payload.into())).await {
                    if matches!(event, OutboundEvent::Chat { .. }) {
                        let _ = events.send(SessionEvent::ChatSendFailed(e.to_string()));
                    }
                    return Err(e.into());
                }
            }
            _ = tick(ticker.as_mut()) => {
                let payload = OutboundEvent::Heartbeat.encode()?;
                write.send(Message::Text(payload.into())).await?;
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(SessionEvent::ChannelMessage(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Server closed the channel");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
        }
    }
}

fn heartbeat_interval(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
