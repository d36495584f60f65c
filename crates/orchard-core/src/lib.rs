//! orchard-core: fruit stand HTTP service
//!
//! Request pipeline, in-memory record store and route handlers. The
//! pipeline itself is synchronous and can be driven directly through
//! [`App::handle`]; the hyper server lives behind the `native` feature.
//!
//! ## Features
//! - `native` - Native server with tokio/hyper (default)

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod routes;
pub mod store;

#[cfg(feature = "native")]
pub mod server;

// Re-exports
pub use app::{App, AppState};
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use pipeline::{Chain, Flow};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use store::{Fruit, FruitStore};

// Middleware re-exports
pub use middleware::{Middleware, MiddlewareChain};

#[cfg(feature = "native")]
pub use server::{create_optimized_socket, from_hyper_request, to_hyper_response, ConnectionTracker, Server};
