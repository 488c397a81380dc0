//! chartproxy - chart repository management over HTTP
//!
//! Exposes the repository registry and chart search of `chartproxy-repo`
//! as a small REST API. Every reply uses the envelope defined in
//! [`response`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{ConfigError, CorsConfig, ProxyConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppContext, AppState};
