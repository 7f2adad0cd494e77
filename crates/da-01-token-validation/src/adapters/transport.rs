//! # Transport Adapter
//!
//! Plugs the token validation API into the correlation transport as its
//! request handler.

use crate::ports::inbound::TokenValidationApi;
use async_trait::async_trait;
use da_02_transport_api::RequestHandler;
use shared_types::{TransportApiRequest, TransportApiResponse};
use std::sync::Arc;

/// Request handler backed by a [`TokenValidationApi`].
pub struct TransportApiHandler<A> {
    api: Arc<A>,
}

impl<A: TokenValidationApi> TransportApiHandler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A> RequestHandler<TransportApiRequest, TransportApiResponse> for TransportApiHandler<A>
where
    A: TokenValidationApi + 'static,
{
    async fn handle(&self, request: TransportApiRequest) -> TransportApiResponse {
        self.api.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryCredentialsStore, InMemoryDeviceStore};
    use crate::service::TokenValidationService;
    use shared_types::{Device, DeviceCredentials, DeviceId, TenantId};

    #[tokio::test]
    async fn test_handler_answers_through_service() {
        let credentials = Arc::new(InMemoryCredentialsStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let device = Device::new(TenantId::random(), DeviceId::random(), "sensor-1", "thermostat");
        devices.insert(device.clone());
        credentials.insert(DeviceCredentials::access_token(device.id, "abc123"));

        let handler = TransportApiHandler::new(Arc::new(TokenValidationService::new(
            credentials,
            devices,
        )));

        let found = handler
            .handle(TransportApiRequest::validate_token("abc123"))
            .await;
        assert_eq!(found.device_info().unwrap().device_name, "sensor-1");

        let empty = handler.handle(TransportApiRequest::Unsupported).await;
        assert!(empty.is_empty());
    }
}
