//! Networked [`Bus`] implementation: a newline-delimited JSON frame protocol
//! carried over a single [`tokio::net::TcpStream`] to a relay process.
//!
//! Every [`TcpBus`] both publishes and subscribes over the same connection.
//! A publish frame is `{"kind":"pub","topic":...,"key":...,"value":...}`
//! (value base64-encoded); a subscription frame is
//! `{"kind":"sub","topic":...}`. The relay fans a `pub` frame out to every
//! peer that has sent a matching `sub` frame, including frames sent by this
//! bus itself when another peer is not subscribed locally.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use super::{Bus, BusError, MessageHandler, Topic};

const MAX_CONNECT_ATTEMPTS: u32 = 30;
const RECONNECT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Frame {
    Pub {
        topic: String,
        key: String,
        value: String,
    },
    Sub {
        topic: String,
    },
}

/// A [`Bus`] that relays messages through a TCP connection to a broker
/// reachable at a `tcp://host:port` address. Reconnects indefinitely if the
/// connection drops, resubscribing to every topic this bus has ever
/// subscribed to.
pub struct TcpBus {
    subscribers: DashMap<&'static str, Vec<Arc<dyn MessageHandler>>>,
    subscribed_topics: Mutex<HashSet<&'static str>>,
    outbound: mpsc::UnboundedSender<Frame>,
}

impl TcpBus {
    /// Connects to `addr` (e.g. `tcp://fleet-broker:4222`) and spawns the
    /// connection-management task. Retries the initial connection with
    /// capped backoff so the broker and this process can start in either
    /// order; once connected, reconnects indefinitely on disconnect.
    pub async fn connect(addr: &str) -> Result<Arc<Self>, BusError> {
        let host_port = parse_addr(addr);
        let stream = connect_with_backoff(&host_port).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Arc::new(Self {
            subscribers: DashMap::new(),
            subscribed_topics: Mutex::new(HashSet::new()),
            outbound: tx,
        });

        tokio::spawn(connection_loop(bus.clone(), host_port, stream, rx));
        Ok(bus)
    }

    fn dispatch(&self, topic: Topic, key: &str, value: &[u8]) {
        let handlers = self
            .subscribers
            .get(topic.as_str())
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        for handler in handlers {
            let key = key.to_string();
            let value = value.to_vec();
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(err) = handler.handle(&key, &value).await {
                    warn!(%key, error = %err, "subscriber handler failed");
                }
            });
        }
    }
}

#[async_trait]
impl Bus for TcpBus {
    async fn publish(&self, topic: Topic, key: &str, value: &[u8]) -> Result<(), BusError> {
        self.outbound
            .send(Frame::Pub {
                topic: topic.as_str().to_string(),
                key: key.to_string(),
                value: BASE64.encode(value),
            })
            .map_err(|_| BusError::Transport("connection loop has shut down".to_string()))
    }

    async fn subscribe(
        &self,
        topic: Topic,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        self.subscribers
            .entry(topic.as_str())
            .or_default()
            .push(handler);
        let mut subscribed = self.subscribed_topics.lock().await;
        if subscribed.insert(topic.as_str()) {
            self.outbound
                .send(Frame::Sub {
                    topic: topic.as_str().to_string(),
                })
                .map_err(|_| BusError::Transport("connection loop has shut down".to_string()))?;
        }
        Ok(())
    }
}

async fn connection_loop(
    bus: Arc<TcpBus>,
    host_port: String,
    mut stream: TcpStream,
    mut rx: mpsc::UnboundedReceiver<Frame>,
) {
    loop {
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        for topic in bus.subscribed_topics.lock().await.iter() {
            let frame = Frame::Sub {
                topic: (*topic).to_string(),
            };
            if write_frame(&mut write_half, &frame).await.is_err() {
                break;
            }
        }

        loop {
            tokio::select! {
                outgoing = rx.recv() => {
                    match outgoing {
                        Some(frame) => {
                            if write_frame(&mut write_half, &frame).await.is_err() {
                                break;
                            }
                        }
                        None => return,
                    }
                }
                incoming = lines.next_line() => {
                    match incoming {
                        Ok(Some(line)) => handle_incoming(&bus, &line),
                        Ok(None) | Err(_) => break,
                    }
                }
            }
        }

        warn!(broker = %host_port, "lost connection to message bus, reconnecting");
        loop {
            tokio::time::sleep(RECONNECT_WAIT).await;
            match TcpStream::connect(&host_port).await {
                Ok(s) => {
                    stream = s;
                    break;
                }
                Err(err) => warn!(broker = %host_port, error = %err, "reconnect attempt failed"),
            }
        }
    }
}

fn handle_incoming(bus: &Arc<TcpBus>, line: &str) {
    let Ok(frame) = serde_json::from_str::<Frame>(line) else {
        warn!(%line, "discarding malformed frame");
        return;
    };
    if let Frame::Pub { topic, key, value } = frame {
        let Some(topic) = topic_from_wire(&topic) else {
            return;
        };
        let Ok(value) = BASE64.decode(&value) else {
            warn!(%key, "discarding frame with invalid base64 payload");
            return;
        };
        bus.dispatch(topic, &key, &value);
    }
}

async fn write_frame(
    write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    frame: &Frame,
) -> Result<(), BusError> {
    let mut line = serde_json::to_vec(frame)?;
    line.push(b'\n');
    write_half
        .write_all(&line)
        .await
        .map_err(|err| BusError::Transport(err.to_string()))
}

async fn connect_with_backoff(host_port: &str) -> Result<TcpStream, BusError> {
    let mut last_err = None;
    for attempt in 0..MAX_CONNECT_ATTEMPTS {
        match TcpStream::connect(host_port).await {
            Ok(stream) => {
                info!(broker = %host_port, "connected to message bus");
                return Ok(stream);
            }
            Err(err) => {
                last_err = Some(err);
                tokio::time::sleep(Duration::from_millis(u64::from(attempt + 1) * 500)).await;
            }
        }
    }
    Err(BusError::Transport(format!(
        "could not connect to {host_port} after {MAX_CONNECT_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

fn parse_addr(addr: &str) -> String {
    addr.trim()
        .trim_start_matches("tcp://")
        .trim_start_matches("nats://")
        .to_string()
}

fn topic_from_wire(wire: &str) -> Option<Topic> {
    [
        Topic::WorkOrders,
        Topic::ZoneTasks,
        Topic::RobotCommands,
        Topic::RobotStatus,
        Topic::ZoneSummary,
        Topic::AreaSummary,
    ]
    .into_iter()
    .find(|t| t.as_str() == wire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_and_nats_style_urls() {
        assert_eq!(parse_addr("tcp://broker:4222"), "broker:4222");
        assert_eq!(parse_addr("nats://broker:4222"), "broker:4222");
        assert_eq!(parse_addr("broker:4222"), "broker:4222");
    }

    #[test]
    fn frame_round_trips_through_json() {
        let frame = Frame::Sub {
            topic: Topic::RobotStatus.as_str().to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Frame::Sub { .. }));
    }

    #[test]
    fn pub_frame_value_round_trips_through_base64() {
        let frame = Frame::Pub {
            topic: Topic::RobotStatus.as_str().to_string(),
            key: "robot-1".to_string(),
            value: BASE64.encode(b"{}"),
        };
        let json = serde_json::to_string(&frame).unwrap();
        let Frame::Pub { value, .. } = serde_json::from_str(&json).unwrap() else {
            panic!("expected Pub frame");
        };
        assert_eq!(BASE64.decode(value).unwrap(), b"{}");
    }
}
