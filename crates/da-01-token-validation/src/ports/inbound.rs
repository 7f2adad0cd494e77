//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::resolution::Resolution;
use async_trait::async_trait;
use shared_types::{TransportApiRequest, TransportApiResponse};

/// Token validation API.
///
/// Implementations must be thread-safe (`Send + Sync`) and must never block
/// the caller waiting on the device directory.
#[async_trait]
pub trait TokenValidationApi: Send + Sync {
    /// Resolve a request to its detailed outcome.
    async fn resolve(&self, request: &TransportApiRequest) -> Resolution;

    /// Answer a request. Every miss or failure is the empty response.
    async fn handle(&self, request: TransportApiRequest) -> TransportApiResponse {
        self.resolve(&request).await.into_response()
    }
}
