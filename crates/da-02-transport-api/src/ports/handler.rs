//! # Request Handler Port
//!
//! Implemented by the service behind the response template.

use async_trait::async_trait;

/// Handles one decoded request.
///
/// The returned future must complete without blocking the caller's thread.
/// It has no error channel: a handler answers every request, falling back to
/// its default response on failure. The template may drop the future after
/// the request timeout.
#[async_trait]
pub trait RequestHandler<Req, Resp>: Send + Sync {
    async fn handle(&self, request: Req) -> Resp;
}
