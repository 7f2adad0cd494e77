//! # Templates
//!
//! The two ends of the correlated request/response exchange.

pub mod request;
pub mod response;

pub use request::RequestTemplate;
pub use response::ResponseTemplate;
