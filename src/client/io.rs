//! The read, write and ping loops.
//!
//! Each loop ends when the session's stop token is cancelled. On a transport
//! failure a loop reports the error, requests a disconnect and returns; it
//! never tears the session down itself.

use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::Client;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::irc::IrcCodec;
use crate::message::Message;
use crate::transport::{BoxedReader, BoxedWriter};

pub(super) async fn read_loop(
    client: Client,
    reader: BoxedReader,
    stop: CancellationToken,
    deadline: Duration,
    max_line_len: usize,
) {
    let mut lines = FramedRead::new(reader, IrcCodec::with_max_len(max_line_len));

    loop {
        let next = tokio::select! {
            _ = stop.cancelled() => return,
            next = time::timeout(deadline, lines.next()) => next,
        };

        let raw = match next {
            Ok(Some(Ok(raw))) => raw,
            Ok(Some(Err(e))) => {
                warn!(error = %e, "read failed");
                client.report(e.into());
                break;
            }
            Ok(None) => {
                client.report(ClientError::from(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
                break;
            }
            Err(_) => {
                warn!(after = ?deadline, "read timed out");
                client.report(ClientError::Timeout {
                    operation: "read",
                    after: deadline,
                });
                break;
            }
        };

        let line = raw.trim();
        client.touch();
        if line.is_empty() {
            continue;
        }
        trace!("<-- {}", line);

        if line.starts_with("ERROR") {
            warn!(line, "server closed the link");
            break;
        }

        match line.parse::<Message>() {
            Ok(message) => client.run_handlers(message),
            Err(e) => {
                debug!(error = %e, "skipping unparsable line");
                client.report(e.into());
            }
        }
    }

    client.request_disconnect();
}

pub(super) async fn write_loop(
    client: Client,
    writer: BoxedWriter,
    mut queue: mpsc::Receiver<Message>,
    stop: CancellationToken,
    deadline: Duration,
) {
    let mut sink = FramedWrite::new(writer, IrcCodec::new());

    loop {
        let message = tokio::select! {
            _ = stop.cancelled() => break,
            message = queue.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        trace!("--> {}", message);
        match time::timeout(deadline, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "write failed");
                client.report(e.into());
                client.request_disconnect();
                break;
            }
            Err(_) => {
                warn!(after = ?deadline, "write timed out");
                client.report(ClientError::Timeout {
                    operation: "write",
                    after: deadline,
                });
                client.request_disconnect();
                break;
            }
        }
    }

    let mut writer = sink.into_inner();
    let _ = time::timeout(deadline, writer.shutdown()).await;
}

/// Timer settings for the ping loop.
#[derive(Clone, Copy, Debug)]
pub(super) struct PingSchedule {
    keepalive: Duration,
    keepalive_check: Duration,
    ping_frequency: Duration,
}

impl PingSchedule {
    pub(super) fn from_config(config: &ClientConfig) -> Self {
        Self {
            keepalive: config.keepalive,
            keepalive_check: config.keepalive_check,
            ping_frequency: config.ping_frequency,
        }
    }
}

/// Longest timer period; far enough out to never fire in practice.
const MAX_TICK_PERIOD: Duration = Duration::from_secs(86400 * 365 * 30);

/// An interval whose first tick is one period out.
fn ticker(period: Duration) -> Interval {
    let period = period.clamp(Duration::from_millis(1), MAX_TICK_PERIOD);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

pub(super) async fn ping_loop(client: Client, stop: CancellationToken, schedule: PingSchedule) {
    let mut check = ticker(schedule.keepalive_check);
    let mut frequency = ticker(schedule.ping_frequency);

    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = check.tick() => {
                if client.idle_for() >= schedule.keepalive {
                    send_ping(&client);
                }
            }
            _ = frequency.tick() => {
                send_ping(&client);
                reclaim_nick(&client);
            }
        }
    }
}

fn send_ping(client: &Client) {
    if let Err(e) = client.ping(&unix_nanos().to_string()) {
        warn!(error = %e, "failed to queue keepalive PING");
    }
}

fn reclaim_nick(client: &Client) {
    let preferred = client.preferred_nick();
    if client.nick() != preferred {
        if let Err(e) = client.set_nick(&preferred) {
            warn!(error = %e, nick = %preferred, "failed to reclaim nick");
        }
    }
}

/// Nanoseconds since the Unix epoch, the payload of our keepalive PINGs.
pub(super) fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}
