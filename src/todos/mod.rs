//! The todo resource: a JSON:API collection backed by a [`TodoStore`].
//!
//! Every route runs behind the caller's common chain plus `accept`.
//!
//! | Route | Extra middleware | Success |
//! |---|---|---|
//! | `GET /todos` | | 200 `{"data": [...]}` |
//! | `GET /todos/:id` | | 200 `{"data": {...}}` |
//! | `POST /todos` | `content_type`, `json_body` | 201 `{"data": {...}}` |
//! | `PUT /todos/:id` | `content_type`, `json_body` | 204 |
//! | `DELETE /todos/:id` | | 204 |
//!
//! Unknown ids answer `not_found` (404).

use std::sync::Arc;

mod handlers;
mod model;
mod store;

pub use model::Todo;
pub use store::{MemoryStore, StoreError, TodoStore};

use crate::chain::Chain;
use crate::error::Error;
use crate::jsonapi::Document;
use crate::method::Method;
use crate::middleware::{accept, content_type, json_body};
use crate::request::Request;
use crate::router::Router;

/// Registers the todo routes on `router`, each behind `common`.
pub fn routes(router: Router, common: &Chain, store: Arc<dyn TodoStore>) -> Result<Router, Error> {
    let api = common.append(accept())?;
    let with_body = api
        .append(content_type())?
        .append(json_body::<Document<Todo>>())?;

    router
        .try_on(Method::Get,    "/todos",     api.then(bind(Arc::clone(&store), handlers::index)))?
        .try_on(Method::Get,    "/todos/:id", api.then(bind(Arc::clone(&store), handlers::show)))?
        .try_on(Method::Post,   "/todos",     with_body.then(bind(Arc::clone(&store), handlers::create)))?
        .try_on(Method::Put,    "/todos/:id", with_body.then(bind(Arc::clone(&store), handlers::update)))?
        .try_on(Method::Delete, "/todos/:id", api.then(bind(store, handlers::destroy)))
}

/// Closes a store-taking handler over a shared store.
fn bind<F, Fut>(store: Arc<dyn TodoStore>, handler: F) -> impl Fn(Request) -> Fut + Send + Sync
where
    F: Fn(Arc<dyn TodoStore>, Request) -> Fut + Send + Sync + 'static,
{
    move |req| handler(Arc::clone(&store), req)
}
