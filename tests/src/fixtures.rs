//! # Test Fixtures
//!
//! A token validation server and a requesting client sharing one
//! in-memory broker.

use da_01_token_validation::{
    DeviceService, InMemoryCredentialsStore, InMemoryDeviceStore, TokenValidationService,
    TransportApiHandler,
};
use da_02_transport_api::{RequestTemplate, ResponseTemplate, TransportApiConfig};
use shared_bus::{InMemoryBroker, RecordConsumer};
use shared_types::{
    Device, DeviceCredentials, DeviceId, LookupError, TenantId, TransportApiRequest,
    TransportApiResponse,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const REQUESTS_TOPIC: &str = "tb.transport.api.requests";
pub const RESPONSES_TOPIC: &str = "tb.transport.api.responses";
pub const REPLY_TOPIC: &str = "tb.transport.api.responses.client-1";
pub const GROUP: &str = "tb-node";

pub type Client = RequestTemplate<TransportApiRequest, TransportApiResponse>;
pub type Server = ResponseTemplate<TransportApiRequest, TransportApiResponse>;

pub fn transport_config(max_pending_requests: usize, request_timeout: Duration) -> TransportApiConfig {
    TransportApiConfig {
        requests_topic: REQUESTS_TOPIC.into(),
        responses_topic: RESPONSES_TOPIC.into(),
        max_pending_requests,
        request_timeout,
        request_poll_interval: Duration::from_millis(10),
        request_auto_commit_interval: Duration::from_millis(100),
    }
}

/// Server, client and stores wired together. Dropping it stops the tasks.
pub struct Cluster<D> {
    pub broker: InMemoryBroker,
    pub credentials: Arc<InMemoryCredentialsStore>,
    pub devices: Arc<D>,
    pub server: Arc<Server>,
    pub client: Arc<Client>,
    _shutdown: watch::Sender<bool>,
}

impl<D: DeviceService + 'static> Cluster<D> {
    /// Start a cluster. The client waits twice the server timeout, so the
    /// server's timeout response always reaches it.
    pub fn start(devices: Arc<D>, config: TransportApiConfig) -> Self {
        let broker = InMemoryBroker::with_partitions(2);
        let credentials = Arc::new(InMemoryCredentialsStore::new());
        let service = Arc::new(TokenValidationService::new(
            Arc::clone(&credentials),
            Arc::clone(&devices),
        ));

        let client_timeout = config.request_timeout * 2;
        let server: Arc<Server> = Arc::new(ResponseTemplate::new(
            config,
            Arc::new(TransportApiHandler::new(service)),
            Arc::new(broker.clone()),
        ));
        let client: Arc<Client> = Arc::new(RequestTemplate::new(
            REQUESTS_TOPIC,
            REPLY_TOPIC,
            client_timeout,
            Arc::new(broker.clone()),
        ));

        let (shutdown, rx) = watch::channel(false);
        server.start(consumers(&broker, GROUP, REQUESTS_TOPIC), rx.clone());
        client.start(
            consumers(&broker, "client-1", REPLY_TOPIC),
            Duration::from_millis(10),
            rx,
        );

        Self {
            broker,
            credentials,
            devices,
            server,
            client,
            _shutdown: shutdown,
        }
    }

    pub async fn validate(&self, token: &str) -> TransportApiResponse {
        self.client
            .send(
                "validate_device_token",
                TransportApiRequest::validate_token(token),
            )
            .await
            .expect("transport failure")
    }
}

pub fn consumers(broker: &InMemoryBroker, group: &str, topic: &str) -> Vec<Box<dyn RecordConsumer>> {
    broker
        .consumers(group, topic)
        .expect("consumer")
        .into_iter()
        .map(|c| Box::new(c) as Box<dyn RecordConsumer>)
        .collect()
}

/// The `sensor-1` thermostat of the reference example.
pub fn sensor() -> Device {
    Device::new(TenantId::random(), DeviceId::random(), "sensor-1", "thermostat")
        .with_additional_info(serde_json::json!({"fw": "1.2"}))
}

/// Register `device` in `devices` with access token `token`.
pub fn register(
    credentials: &InMemoryCredentialsStore,
    devices: &InMemoryDeviceStore,
    device: &Device,
    token: &str,
) {
    devices.insert(device.clone());
    credentials.insert(DeviceCredentials::access_token(device.id, token));
}

/// Device directory that waits `delay` before every answer.
pub struct SlowDirectory {
    pub inner: InMemoryDeviceStore,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowDirectory {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryDeviceStore::new(),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DeviceService for SlowDirectory {
    async fn find_by_id(&self, device_id: DeviceId) -> Result<Option<Device>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(device_id).await
    }
}

/// Device directory that never answers.
pub struct StalledDirectory;

#[async_trait::async_trait]
impl DeviceService for StalledDirectory {
    async fn find_by_id(&self, _device_id: DeviceId) -> Result<Option<Device>, LookupError> {
        std::future::pending().await
    }
}
