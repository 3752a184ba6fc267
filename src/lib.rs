//! # steep
//!
//! A small JSON:API service built on a composable middleware pipeline.
//!
//! ## The pipeline
//!
//! A request travels through an ordered [`Chain`] of named
//! [`Middleware`](middleware::Middleware) before reaching its handler. Each
//! layer may act before and after the rest of the chain, or answer early and
//! skip it. The first middleware appended is the outermost.
//!
//! - **Routing**: `:name` segments and a not-found fallback, via [`matchit`]
//! - **Request context**: a per-request, string-keyed value store
//! - **Errors**: one JSON:API envelope, `{"errors": [...]}`, for every failure
//! - **Panics**: caught by [`middleware::recover`] and turned into a single 500
//! - **Shutdown**: SIGTERM / Ctrl-C stops accepting and drains in-flight work
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use steep::middleware::{clear_context, json_body, recover, trace};
//! use steep::{Chain, Document, Method, Request, Response, Router, Server, StatusCode};
//!
//! #[derive(Clone, serde::Deserialize, serde::Serialize)]
//! struct Greeting {
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), steep::Error> {
//!     let common = Chain::new([recover(), clear_context(), trace()])?;
//!     let with_body = common.append(json_body::<Document<Greeting>>())?;
//!
//!     let app = Router::new()
//!         .on(Method::Get,  "/hello/:name", common.then(hello))
//!         .on(Method::Post, "/hello",       with_body.then(echo));
//!
//!     Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await
//! }
//!
//! async fn hello(req: Request) -> Response {
//!     let name = req.param("name").unwrap_or_default();
//!     Document::new(Greeting { name }).respond(StatusCode::OK)
//! }
//!
//! async fn echo(req: Request) -> Result<Response, steep::ApiError> {
//!     let body = req.context().take::<Document<Greeting>>("body")?;
//!     Ok(body.respond(StatusCode::CREATED))
//! }
//! ```

mod chain;
mod error;
mod handler;
mod jsonapi;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod context;
pub mod logging;
pub mod middleware;
pub mod pages;
pub mod static_files;
pub mod todos;

pub use chain::{Chain, Pipeline};
pub use config::Settings;
pub use context::RequestContext;
pub use error::Error;
pub use handler::Handler;
pub use http::StatusCode;
pub use jsonapi::{ApiError, Document, MEDIA_TYPE};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Params, Router};
pub use server::{DEFAULT_MAX_BODY_BYTES, Server};
