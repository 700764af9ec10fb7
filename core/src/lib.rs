//! Synchronous client core for the DealHub CPQ REST API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values; the round
//! trip itself goes through a [`Transport`]. `UreqTransport` is the blocking
//! default, and tests swap in scripted transports or a mock server, so the
//! request/response logic stays deterministic.
//!
//! # Design
//! - `DealHubClient` holds credentials, the resolved base URL and the
//!   transport. It has no mutable state and is cheap to clone.
//! - Requests are split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary stays explicit.
//! - Resource operations resolve host parameters into a [`Plan`] before any
//!   I/O happens; see [`operations`].
//! - The webhook trigger ([`trigger`]) verifies and normalizes inbound
//!   deliveries and manages the subscription lifecycle.

pub mod clean;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod keys;
pub mod operations;
pub mod pagination;
pub mod params;
pub mod retry;
pub mod signature;
pub mod transfer;
pub mod trigger;

pub use client::{DealHubClient, API_VERSION};
pub use config::ClientConfig;
pub use credentials::{Credentials, Environment};
pub use error::{ApiError, OperationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use operations::{execute, InputItem, OutputItem, Plan, Resource};
pub use pagination::{Pagination, PAGE_SIZE};
pub use params::Params;
pub use retry::{RetryPolicy, RetryTransport};
pub use transfer::{BinaryData, Download};
pub use trigger::{TriggerOptions, TriggerResponse, WebhookEvent, WebhookStore, WebhookSubscription};
