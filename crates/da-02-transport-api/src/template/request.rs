//! # Request Template
//!
//! Caller side of the exchange: publishes a request carrying a fresh
//! correlation ID and this node's reply topic, then waits for the matching
//! response or the caller timeout.

use crate::domain::{run_eviction, CorrelationId, PendingRequestStore};
use crate::errors::TransportError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::{BusError, RecordConsumer, RecordPublisher};
use shared_types::{codec, Envelope};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Records drained per poll by the response listener.
const RESPONSE_BATCH: usize = 64;

pub struct RequestTemplate<Req, Resp> {
    requests_topic: String,
    response_topic: String,
    timeout: Duration,
    publisher: Arc<dyn RecordPublisher>,
    pending: Arc<PendingRequestStore<Resp>>,
    _request: PhantomData<fn(Req)>,
}

impl<Req, Resp> RequestTemplate<Req, Resp>
where
    Req: Serialize + Send + 'static,
    Resp: DeserializeOwned + Send + 'static,
{
    pub fn new(
        requests_topic: impl Into<String>,
        response_topic: impl Into<String>,
        timeout: Duration,
        publisher: Arc<dyn RecordPublisher>,
    ) -> Self {
        Self {
            requests_topic: requests_topic.into(),
            response_topic: response_topic.into(),
            timeout,
            publisher,
            pending: Arc::new(PendingRequestStore::new()),
            _request: PhantomData,
        }
    }

    /// Spawn the response listeners (one per reply partition) and the
    /// expired-waiter eviction.
    pub fn start(
        self: &Arc<Self>,
        consumers: Vec<Box<dyn RecordConsumer>>,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(consumers.len() + 1);
        for consumer in consumers {
            let template = Arc::clone(self);
            let shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                template.listen(consumer, poll_interval, shutdown).await;
            }));
        }

        let store = Arc::clone(&self.pending);
        let mut shutdown = shutdown;
        handles.push(tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = run_eviction(store, poll_interval) => {}
            }
        }));
        handles
    }

    /// Publish `request` and wait for its response.
    ///
    /// The timeout runs from registration, so time spent publishing counts
    /// against it. `kind` only labels the pending entry in logs.
    pub async fn send(&self, kind: &'static str, request: Req) -> Result<Resp, TransportError> {
        let (correlation_id, bytes) = {
            let envelope = Envelope::request(request, self.response_topic.clone());
            (CorrelationId::of(&envelope), codec::encode(&envelope)?)
        };

        let deadline = Instant::now() + self.timeout;
        let rx = self.pending.register(correlation_id, kind, self.timeout);
        let key = correlation_id.record_key();
        if let Err(e) = self
            .publisher
            .send(&self.requests_topic, Some(&key), bytes)
            .await
        {
            self.pending.cancel(&correlation_id);
            return Err(e.into());
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(reply)) => Ok(reply.payload),
            // Evicted by the expiry sweep at or after the deadline.
            Ok(Err(_)) if Instant::now() >= deadline => Err(TransportError::Timeout {
                correlation_id,
                timeout: self.timeout,
            }),
            Ok(Err(_)) => Err(TransportError::Cancelled(correlation_id)),
            Err(_) => {
                self.pending.cancel(&correlation_id);
                Err(TransportError::Timeout {
                    correlation_id,
                    timeout: self.timeout,
                })
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn response_topic(&self) -> &str {
        &self.response_topic
    }

    async fn listen(
        &self,
        mut consumer: Box<dyn RecordConsumer>,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let label = consumer.label();
        debug!(partition = %label, "Response listener started");

        loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                polled = consumer.poll(RESPONSE_BATCH, poll_interval) => polled,
            };

            let records = match polled {
                Ok(records) => records,
                Err(BusError::Closed) => break,
                Err(e) => {
                    warn!(partition = %label, error = %e, "Failed to poll responses");
                    tokio::time::sleep(poll_interval).await;
                    continue;
                }
            };
            if records.is_empty() {
                continue;
            }

            for record in &records {
                match codec::decode::<Resp>(&record.value) {
                    Ok(envelope) => {
                        self.pending
                            .deliver(CorrelationId::of(&envelope), envelope.payload);
                    }
                    Err(e) => {
                        warn!(partition = %label, offset = record.offset, error = %e, "Undecodable response skipped");
                    }
                }
            }
            consumer.commit();
        }

        info!(partition = %label, "Response listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::InMemoryBroker;

    const REQUESTS: &str = "requests";
    const REPLIES: &str = "replies.node-a";

    fn consumers(broker: &InMemoryBroker, group: &str, topic: &str) -> Vec<Box<dyn RecordConsumer>> {
        broker
            .consumers(group, topic)
            .unwrap()
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn RecordConsumer>)
            .collect()
    }

    /// Answers every request with its body upper-cased.
    fn spawn_responder(broker: InMemoryBroker) {
        tokio::spawn(async move {
            let mut consumer = broker.consumer("responder", REQUESTS, 0).unwrap();
            loop {
                let Ok(records) = consumer.poll(16, Duration::from_secs(60)).await else {
                    return;
                };
                for record in records {
                    let request: Envelope<String> = codec::decode(&record.value).unwrap();
                    let reply = Envelope::response(request.request_id, request.payload.to_uppercase());
                    let topic = request.response_topic.unwrap();
                    broker
                        .send(&topic, None, codec::encode(&reply).unwrap())
                        .await
                        .unwrap();
                }
            }
        });
    }

    fn template(broker: &InMemoryBroker, timeout: Duration) -> Arc<RequestTemplate<String, String>> {
        Arc::new(RequestTemplate::new(
            REQUESTS,
            REPLIES,
            timeout,
            Arc::new(broker.clone()),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_receives_matching_response() {
        let broker = InMemoryBroker::new();
        let client = template(&broker, Duration::from_secs(5));
        let (_tx, rx) = watch::channel(false);
        client.start(consumers(&broker, "node-a", REPLIES), Duration::from_millis(10), rx);
        spawn_responder(broker.clone());

        let (a, b) = tokio::join!(client.send("echo", "a".into()), client.send("echo", "b".into()));
        assert_eq!(a.unwrap(), "A");
        assert_eq!(b.unwrap(), "B");
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_times_out_without_responder() {
        let broker = InMemoryBroker::new();
        let client = template(&broker, Duration::from_secs(2));
        let (_tx, rx) = watch::channel(false);
        client.start(consumers(&broker, "node-a", REPLIES), Duration::from_millis(10), rx);

        let started = tokio::time::Instant::now();
        let err = client.send("echo", "lost".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(client.pending_count(), 0);
    }

    /// Broker handle whose sends take `delay` to complete.
    struct SlowPublisher {
        broker: InMemoryBroker,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl RecordPublisher for SlowPublisher {
        async fn send(
            &self,
            topic: &str,
            key: Option<&str>,
            value: Vec<u8>,
        ) -> Result<shared_bus::RecordMetadata, BusError> {
            tokio::time::sleep(self.delay).await;
            self.broker.send(topic, key, value).await
        }

        fn records_published(&self) -> u64 {
            self.broker.records_published()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_publish_still_reports_timeout() {
        let broker = InMemoryBroker::new();
        let publisher = Arc::new(SlowPublisher {
            broker: broker.clone(),
            delay: Duration::from_millis(100),
        });
        let client: Arc<RequestTemplate<String, String>> = Arc::new(RequestTemplate::new(
            REQUESTS,
            REPLIES,
            Duration::from_secs(1),
            publisher,
        ));
        let (_tx, rx) = watch::channel(false);
        client.start(consumers(&broker, "node-a", REPLIES), Duration::from_millis(10), rx);

        let started = tokio::time::Instant::now();
        let err = client.send("echo", "unanswered".into()).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout { .. }), "got {err:?}");
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_millis(1100));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_carries_reply_topic() {
        let broker = InMemoryBroker::new();
        let client = template(&broker, Duration::from_millis(50));

        let _ = client.send("echo", "x".into()).await;

        let mut consumer = broker.consumer("inspect", REQUESTS, 0).unwrap();
        let records = consumer.poll(1, Duration::from_millis(1)).await.unwrap();
        let envelope: Envelope<String> = codec::decode(&records[0].value).unwrap();
        assert_eq!(envelope.response_topic.as_deref(), Some(REPLIES));
        assert_eq!(records[0].key.as_deref(), Some(envelope.request_id.to_string().as_str()));
    }
}
