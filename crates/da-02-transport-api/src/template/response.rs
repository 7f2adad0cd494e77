//! # Response Template
//!
//! Serves a request topic: decodes each request, hands it to the handler on
//! its own task, and publishes the result to the request's reply topic under
//! the same correlation ID.
//!
//! ## Flow
//!
//! ```text
//!  request topic (partition p)         pending table (DashMap)
//!  ┌──────────────────────┐            ┌─────────────────────────┐
//!  │ consume loop (per p) │─dispatch──→│ id → result rx, deadline│
//!  │  poll 1 record       │            │      task, slot permit  │
//!  │  acquire slot        │            └─────────────────────────┘
//!  │  commit every tick   │                        │ every poll interval
//!  └──────────────────────┘                        ▼
//!                                       ┌─────────────────────────┐
//!                                       │ sweep                   │
//!                                       │  result ready → publish │
//!                                       │  deadline hit → abort,  │
//!                                       │    publish default      │
//!                                       │  entry removed → slot   │
//!                                       │    freed                │
//!                                       └─────────────────────────┘
//! ```
//!
//! Only the sweep publishes, and it removes the entry first, so each
//! request gets exactly one response. A loop holding a polled record does
//! not poll again until a slot frees; idle loops hold no slot.

use crate::config::TransportApiConfig;
use crate::domain::{CorrelationId, StatsSnapshot, TemplateStats};
use crate::ports::handler::RequestHandler;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::{BusError, Record, RecordConsumer, RecordPublisher};
use shared_types::{codec, Envelope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{oneshot, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace, warn};

/// A request handed to the handler and not yet answered.
struct InFlight<Resp> {
    response_topic: String,
    dispatched_at: Instant,
    deadline: Instant,
    result: oneshot::Receiver<Resp>,
    task: JoinHandle<()>,
    /// Returned to the slot pool when the entry is dropped.
    _permit: OwnedSemaphorePermit,
}

enum Settled<Resp> {
    Completed(Resp),
    TimedOut,
    Failed,
}

/// Server side of the correlated request/response exchange.
pub struct ResponseTemplate<Req, Resp> {
    config: TransportApiConfig,
    handler: Arc<dyn RequestHandler<Req, Resp>>,
    publisher: Arc<dyn RecordPublisher>,
    slots: Arc<Semaphore>,
    pending: DashMap<CorrelationId, InFlight<Resp>>,
    /// Set once the sweep starts abandoning pending requests.
    closing: AtomicBool,
    stats: TemplateStats,
}

impl<Req, Resp> ResponseTemplate<Req, Resp>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Default + Send + 'static,
{
    pub fn new(
        config: TransportApiConfig,
        handler: Arc<dyn RequestHandler<Req, Resp>>,
        publisher: Arc<dyn RecordPublisher>,
    ) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_pending_requests));
        Self {
            config,
            handler,
            publisher,
            slots,
            pending: DashMap::new(),
            closing: AtomicBool::new(false),
            stats: TemplateStats::default(),
        }
    }

    /// Spawn one consume loop per request partition plus the result sweep.
    ///
    /// All tasks stop when `shutdown` changes or its sender is dropped.
    pub fn start(
        self: &Arc<Self>,
        consumers: Vec<Box<dyn RecordConsumer>>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        info!(
            requests_topic = %self.config.requests_topic,
            partitions = consumers.len(),
            max_pending_requests = self.config.max_pending_requests,
            request_timeout_ms = self.config.request_timeout.as_millis(),
            "Starting transport API response template"
        );

        let mut handles = Vec::with_capacity(consumers.len() + 1);
        for consumer in consumers {
            handles.push(tokio::spawn(
                Arc::clone(self).consume_loop(consumer, shutdown.clone()),
            ));
        }
        handles.push(tokio::spawn(Arc::clone(self).poll_loop(shutdown)));
        handles
    }

    /// Number of requests awaiting a handler result.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of free pending slots.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &TransportApiConfig {
        &self.config
    }

    #[instrument(skip_all, fields(partition = %consumer.label()))]
    async fn consume_loop(
        self: Arc<Self>,
        mut consumer: Box<dyn RecordConsumer>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Request consumer started");
        let mut commit_tick = tokio::time::interval(self.config.request_auto_commit_interval);
        commit_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Cleared only when the record was dispatched; a record still held
        // at shutdown must not be committed past.
        let mut held = false;
        loop {
            let polled = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = commit_tick.tick() => {
                    consumer.commit();
                    continue;
                }
                polled = consumer.poll(1, self.config.request_poll_interval) => polled,
            };

            let record = match polled {
                Ok(records) => match records.into_iter().next() {
                    Some(record) => record,
                    None => continue,
                },
                Err(BusError::Closed) => {
                    info!("Request topic closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to obtain messages from queue");
                    tokio::time::sleep(self.config.request_poll_interval).await;
                    continue;
                }
            };

            held = true;
            let permit = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                permit = Arc::clone(&self.slots).acquire_owned() => permit,
            };
            let Ok(permit) = permit else { break };
            if shutdown_requested(&shutdown) {
                break;
            }
            self.dispatch(record, permit);
            held = false;
        }

        if held {
            info!(position = consumer.position(), "Request consumer stopped with an undispatched record");
            return;
        }
        consumer.commit();
        info!(position = consumer.position(), "Request consumer stopped");
    }

    /// Decode a record and hand it to the handler. `permit` stays with the
    /// request until it is answered; dropping it early frees the slot.
    fn dispatch(&self, record: Record, permit: OwnedSemaphorePermit) {
        TemplateStats::incr(&self.stats.received);

        let envelope: Envelope<Req> = match codec::decode(&record.value) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "Failed to process the request"
                );
                TemplateStats::incr(&self.stats.skipped);
                return;
            }
        };

        let correlation_id = CorrelationId::of(&envelope);
        let response_topic = envelope
            .response_topic
            .unwrap_or_else(|| self.config.responses_topic.clone());

        match self.pending.entry(correlation_id) {
            Entry::Occupied(_) => {
                debug!(request_id = %correlation_id, "Duplicate request already in flight");
                TemplateStats::incr(&self.stats.skipped);
            }
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                let handler = Arc::clone(&self.handler);
                let request = envelope.payload;
                let task = tokio::spawn(async move {
                    let response = handler.handle(request).await;
                    // Receiver is gone once the request timed out.
                    let _ = tx.send(response);
                });

                let now = Instant::now();
                slot.insert(InFlight {
                    response_topic,
                    dispatched_at: now,
                    deadline: now + self.config.request_timeout,
                    result: rx,
                    task,
                    _permit: permit,
                });
                // The shutdown sweep may have drained the table while this
                // entry was being inserted.
                if self.closing.load(Ordering::SeqCst) {
                    if let Some((_, in_flight)) = self.pending.remove(&correlation_id) {
                        in_flight.task.abort();
                    }
                    debug!(request_id = %correlation_id, "Request dropped during shutdown");
                    return;
                }
                TemplateStats::incr(&self.stats.dispatched);
                trace!(request_id = %correlation_id, offset = record.offset, "Request dispatched");
            }
        }
    }

    #[instrument(skip_all, name = "transport_api_sweep")]
    async fn poll_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.config.request_poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tick.tick() => {
                    self.sweep().await;
                }
            }
        }

        self.closing.store(true, Ordering::SeqCst);
        let abandoned = self.pending.len();
        for entry in self.pending.iter() {
            entry.task.abort();
        }
        self.pending.clear();
        if abandoned > 0 {
            warn!(abandoned = abandoned, "Shutdown with requests still pending");
        }
        info!("Response sweep stopped");
    }

    /// Publish every finished or expired request. Returns how many were settled.
    pub async fn sweep(&self) -> usize {
        let settled = self.collect_settled(Instant::now());
        let count = settled.len();

        for (correlation_id, outcome) in settled {
            let Some((_, in_flight)) = self.pending.remove(&correlation_id) else {
                continue;
            };

            let response = match outcome {
                Settled::Completed(response) => {
                    TemplateStats::incr(&self.stats.completed);
                    trace!(
                        request_id = %correlation_id,
                        latency_ms = in_flight.dispatched_at.elapsed().as_millis(),
                        "Request completed"
                    );
                    response
                }
                Settled::TimedOut => {
                    in_flight.task.abort();
                    TemplateStats::incr(&self.stats.timed_out);
                    warn!(
                        request_id = %correlation_id,
                        timeout_ms = self.config.request_timeout.as_millis(),
                        "Request timed out, sending default response"
                    );
                    Resp::default()
                }
                Settled::Failed => {
                    TemplateStats::incr(&self.stats.failed);
                    warn!(
                        request_id = %correlation_id,
                        "Handler finished without a result, sending default response"
                    );
                    Resp::default()
                }
            };

            self.respond(correlation_id, &in_flight.response_topic, response)
                .await;
            // Slot returns to the pool here.
            drop(in_flight);
        }

        count
    }

    fn collect_settled(&self, now: Instant) -> Vec<(CorrelationId, Settled<Resp>)> {
        let mut settled = Vec::new();
        for mut entry in self.pending.iter_mut() {
            let outcome = match entry.result.try_recv() {
                Ok(response) => Settled::Completed(response),
                Err(TryRecvError::Closed) => Settled::Failed,
                Err(TryRecvError::Empty) if now >= entry.deadline => Settled::TimedOut,
                Err(TryRecvError::Empty) => continue,
            };
            settled.push((*entry.key(), outcome));
        }
        settled
    }

    async fn respond(&self, correlation_id: CorrelationId, topic: &str, response: Resp) {
        let envelope = Envelope::response(correlation_id.into(), response);
        let bytes = match codec::encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                TemplateStats::incr(&self.stats.publish_errors);
                warn!(request_id = %correlation_id, error = %e, "Failed to encode response");
                return;
            }
        };

        let key = correlation_id.record_key();
        if let Err(e) = self.publisher.send(topic, Some(&key), bytes).await {
            TemplateStats::incr(&self.stats.publish_errors);
            warn!(
                request_id = %correlation_id,
                topic = topic,
                error = %e,
                "Failed to publish response"
            );
        }
    }
}

/// True once the shutdown signal fired or its sender was dropped.
fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    !matches!(shutdown.has_changed(), Ok(false))
}
