//! REST API access for the log-management server
//!
//! - [`client`]: authenticated JSON client with retries and timeouts
//! - [`auth`]: session token store and the token provider seam
//! - [`nodes`]: cluster membership lookup
//! - [`errors`]: API error classification

pub mod auth;
pub mod client;
pub mod errors;
pub mod nodes;

pub use auth::{basic_authorization, AccessTokenProvider, SessionStore};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
pub use nodes::ClusterNodesClient;
