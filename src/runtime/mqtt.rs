//! MQTT transport: connection, subscription and the per-node event loop.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use crate::nodes::{Node, Publication};

use super::router::Router;

/// Minimum capacity of the client request queue.
const REQUEST_CAPACITY: usize = 64;

/// Request queue capacity for a node that queues up to `burst` messages
/// between two event-loop polls.
pub fn request_capacity(burst: usize) -> usize {
    REQUEST_CAPACITY.max(burst.saturating_mul(2))
}

/// Upper bound on flushing the disconnect packet at shutdown.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected MQTT session.
pub struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
    reconnect_delay: Duration,
}

impl Session {
    /// Creates the client; the connection is established by polling.
    ///
    /// `capacity` bounds the requests queued between two polls.
    pub fn new(client_id: &str, broker: &BrokerConfig, capacity: usize) -> Self {
        let mut options = MqttOptions::new(client_id, broker.host.as_str(), broker.port);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
        let (client, eventloop) = AsyncClient::new(options, capacity.max(1));
        info!(client_id, host = %broker.host, port = broker.port, "connecting to MQTT broker");
        Self {
            client,
            eventloop,
            reconnect_delay: Duration::from_millis(broker.reconnect_delay_ms),
        }
    }

    /// Polls the next transport event.
    ///
    /// Connection errors are logged and `None` is returned after the
    /// reconnect delay; the next poll reconnects.
    pub async fn poll(&mut self) -> Option<Event> {
        match self.eventloop.poll().await {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "MQTT connection error, reconnecting");
                sleep(self.reconnect_delay).await;
                None
            }
        }
    }

    /// Subscribes to `topics` without waiting for the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the request queue is closed or full.
    pub fn subscribe<'a>(&self, topics: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for topic in topics {
            self.client.try_subscribe(topic, QoS::AtMostOnce)?;
            debug!(topic, "subscribed");
        }
        Ok(())
    }

    /// Queues a message for delivery without waiting.
    ///
    /// Messages that do not fit into the request queue are dropped; returns
    /// whether the message was queued.
    pub fn publish(&self, publication: Publication) -> bool {
        let Publication { topic, payload } = publication;
        match self
            .client
            .try_publish(topic.as_str(), QoS::AtMostOnce, false, payload)
        {
            Ok(()) => {
                trace!(topic, "published");
                true
            }
            Err(e) => {
                warn!(topic, error = %e, "dropping message");
                false
            }
        }
    }

    /// Sends a disconnect and drives the event loop until it is flushed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if the disconnect request cannot be queued.
    pub async fn disconnect(mut self) -> Result<()> {
        self.client.disconnect().await?;
        let flushed = timeout(DISCONNECT_TIMEOUT, async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        if flushed.is_err() {
            warn!("disconnect not confirmed before timeout");
        }
        info!("disconnected from MQTT broker");
        Ok(())
    }
}

/// Runs `node` against the broker until interrupted.
///
/// Subscriptions are (re)issued on every connection acknowledgement. Each
/// incoming publish is dispatched through the node's route table and its
/// results are published immediately.
///
/// # Errors
///
/// Returns the first input error raised by the node, or a transport error
/// from the client. Ctrl-C ends the loop with `Ok(())` after disconnecting.
pub async fn run_node<N: Node>(client_id: &str, broker: &BrokerConfig, node: N) -> Result<()> {
    let mut router = Router::new(node);
    let capacity = request_capacity(router.node().max_publications());
    let mut session = Session::new(client_id, broker, capacity);
    info!(
        client_id,
        node = router.node().node_type(),
        routes = ?router.routes(),
        "node started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.map_err(Error::Signal)?;
                info!("interrupt received, shutting down");
                return session.disconnect().await;
            }
            event = session.poll() => match event {
                Some(Event::Incoming(Packet::ConnAck(_))) => {
                    session.subscribe(router.routes().topics())?;
                }
                Some(Event::Incoming(Packet::Publish(message))) => {
                    for publication in router.dispatch(&message.topic, &message.payload)? {
                        session.publish(publication);
                    }
                }
                Some(event) => trace!(?event, "transport event"),
                None => {}
            },
        }
    }
}
