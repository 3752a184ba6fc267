//! Middleware layer.
//!
//! A [`Middleware`] is a named `Handler -> Handler` transformation: it takes
//! the next handler in the pipeline and returns a new handler wrapping it.
//! The wrapping handler may
//!
//! - inspect or annotate the request (usually through its
//!   [`RequestContext`](crate::context::RequestContext)),
//! - short-circuit by returning a response without calling `next`,
//! - call `next` and then look at the response on the way out.
//!
//! Middleware hold no per-request state. Anything they are configured with
//! (a resolver, a target body type) is fixed when they are constructed.
//! Compose them with a [`Chain`](crate::Chain).
//!
//! ```rust
//! use steep::middleware::Middleware;
//! use steep::{Request, Response};
//!
//! let stamp = Middleware::from_fn("stamp", |req: Request, next| async move {
//!     req.context().set("stamped", true);
//!     next.run(req).await
//! });
//! assert_eq!(stamp.name(), "stamp");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

mod auth;
mod body;
mod clear;
mod negotiate;
mod recover;
mod trace;

pub use auth::{User, authenticate};
pub use body::json_body;
pub use clear::clear_context;
pub use negotiate::{accept, content_type};
pub use recover::recover;
pub use trace::trace;

pub(crate) use clear::NAME as CLEAR_CONTEXT;
pub(crate) use recover::NAME as RECOVER;

type Wrap = dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync;

/// A named handler transformer.
#[derive(Clone)]
pub struct Middleware {
    name: &'static str,
    wrap: Arc<Wrap>,
}

impl Middleware {
    /// Builds middleware from a raw `Handler -> Handler` function.
    pub fn new<W>(name: &'static str, wrap: W) -> Self
    where
        W: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    {
        Self { name, wrap: Arc::new(wrap) }
    }

    /// Builds middleware from an async function of the request and the
    /// [`Next`] handler.
    pub fn from_fn<F, Fut, R>(name: &'static str, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(name, move |next| {
            Arc::new(FnLayer { f: Arc::clone(&f), next })
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wraps `next`, producing the handler that runs this middleware first.
    pub(crate) fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}

/// The rest of the pipeline, as seen from inside a middleware.
///
/// Consumed by [`run`](Next::run), so it can be called at most once.
pub struct Next(BoxedHandler);

impl Next {
    pub async fn run(self, req: Request) -> Response {
        self.0.call(req).await
    }
}

struct FnLayer<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut, R> ErasedHandler for FnLayer<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.f)(req, Next(Arc::clone(&self.next)));
        Box::pin(async move { fut.await.into_response() })
    }
}
