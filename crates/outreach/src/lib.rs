//! Client for the external outreach service that performs actual email,
//! LinkedIn and SMS delivery.
//!
//! Callers depend on the [`OutreachGateway`] trait. [`HttpOutreachGateway`]
//! talks to the real service; [`DisabledGateway`] stands in when
//! `OUTREACH_API_URL` is not configured so local development works offline.

pub mod config;
pub mod gateway;
pub mod http;

pub use config::OutreachConfig;
pub use gateway::{DispatchReceipt, DisabledGateway, OutboundMessage, OutreachGateway};
pub use http::HttpOutreachGateway;

/// Errors raised while handing a message to the outreach service.
#[derive(Debug, thiserror::Error)]
pub enum OutreachError {
    /// Network, DNS, TLS or timeout failure.
    #[error("Outreach request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Outreach service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The service answered 2xx but the body was not a receipt.
    #[error("Outreach service returned an invalid response: {0}")]
    InvalidResponse(String),
}
