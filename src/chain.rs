//! Ordered middleware composition.
//!
//! A [`Chain`] is an immutable list of [`Middleware`]. Closing it over a
//! terminal handler with [`Chain::then`] yields a [`Pipeline`], which the
//! router accepts like any other handler.
//!
//! Composition is right-to-left: `[m1, m2, m3]` over `h` builds
//! `m1(m2(m3(h)))`. `m1` runs first on the way in and last on the way out.
//!
//! ```rust
//! use steep::middleware::{clear_context, json_body, recover, trace};
//! use steep::{Chain, Document, Request, Response};
//!
//! # fn main() -> Result<(), steep::Error> {
//! let common = Chain::new([recover(), clear_context(), trace()])?;
//! let with_body = common.append(json_body::<Document<serde_json::Value>>())?;
//!
//! assert_eq!(common.names(), ["recover", "clear_context", "trace"]);
//! assert_eq!(with_body.len(), 4);
//!
//! let _pipeline = with_body.then(|_req: Request| async { Response::text("ok") });
//! # Ok(())
//! # }
//! ```
//!
//! Two placement rules are checked whenever a chain is built or extended,
//! because breaking them silently changes behaviour under failure:
//!
//! - [`recover`](crate::middleware::recover) must be outermost (index 0).
//! - [`clear_context`](crate::middleware::clear_context) must sit directly
//!   inside `recover` when both are present, so the context is released
//!   before the panic is logged.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{CLEAR_CONTEXT, Middleware, RECOVER};

/// An immutable, ordered sequence of middleware.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Arc<[Middleware]>,
}

impl Chain {
    /// Builds a chain, outermost middleware first.
    pub fn new(layers: impl IntoIterator<Item = Middleware>) -> Result<Self, Error> {
        let layers: Arc<[Middleware]> = layers.into_iter().collect();
        check_order(&layers)?;
        Ok(Self { layers })
    }

    /// Returns a new chain with `layer` placed just before the terminal
    /// handler. `self` is left untouched.
    pub fn append(&self, layer: Middleware) -> Result<Self, Error> {
        Self::new(self.layers.iter().cloned().chain(std::iter::once(layer)))
    }

    /// Closes the chain over its terminal handler.
    pub fn then(&self, handler: impl Handler) -> Pipeline {
        let terminal = handler.into_boxed_handler();
        let composed = self
            .layers
            .iter()
            .rev()
            .fold(terminal, |next, layer| layer.wrap(next));
        Pipeline(composed)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(Middleware::name).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A chain closed over its terminal handler, ready to register on a
/// [`Router`](crate::Router).
pub struct Pipeline(BoxedHandler);

impl Pipeline {
    pub(crate) fn into_inner(self) -> BoxedHandler {
        self.0
    }
}

fn check_order(layers: &[Middleware]) -> Result<(), Error> {
    let position = |name: &str| layers.iter().position(|m| m.name() == name);
    let count = |name: &str| layers.iter().filter(|m| m.name() == name).count();

    for name in [RECOVER, CLEAR_CONTEXT] {
        if count(name) > 1 {
            let index = layers.iter().rposition(|m| m.name() == name).unwrap_or_default();
            return Err(Error::MiddlewareOrder { name, index, reason: "registered more than once" });
        }
    }

    if let Some(index) = position(RECOVER).filter(|&i| i != 0) {
        return Err(Error::MiddlewareOrder {
            name: RECOVER,
            index,
            reason: "must be the outermost middleware",
        });
    }

    if let (Some(_), Some(index)) = (position(RECOVER), position(CLEAR_CONTEXT)) {
        if index != 1 {
            return Err(Error::MiddlewareOrder {
                name: CLEAR_CONTEXT,
                index,
                reason: "must directly follow `recover`",
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::handler::ErasedHandler;
    use crate::middleware::{clear_context, recover, trace};
    use crate::{Method, Request, Response};

    fn tracer(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Middleware {
        Middleware::from_fn(name, move |req: Request, next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name} in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{name} out"));
                res
            }
        })
    }

    #[tokio::test]
    async fn runs_in_order_and_unwinds_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(["A", "B", "C"].map(|n| tracer(n, Arc::clone(&log)))).unwrap();

        let terminal_log = Arc::clone(&log);
        let pipeline = chain.then(move |_req: Request| {
            let log = Arc::clone(&terminal_log);
            async move {
                log.lock().unwrap().push("H".to_owned());
                Response::text("done")
            }
        });

        let res = pipeline
            .into_boxed_handler()
            .call(Request::builder(Method::Get, "/").empty())
            .await;

        assert_eq!(res.body().as_ref(), b"done");
        assert_eq!(
            *log.lock().unwrap(),
            ["A in", "B in", "C in", "H", "C out", "B out", "A out"]
        );
    }

    #[test]
    fn append_leaves_the_base_untouched() {
        let base = Chain::new([recover(), clear_context()]).unwrap();
        let extended = base.append(trace()).unwrap();

        assert_eq!(base.names(), ["recover", "clear_context"]);
        assert_eq!(extended.names(), ["recover", "clear_context", "trace"]);
    }

    #[test]
    fn recover_must_be_outermost() {
        let err = Chain::new([trace(), recover()]).unwrap_err();
        assert!(matches!(err, Error::MiddlewareOrder { name: "recover", index: 1, .. }));

        let base = Chain::new([trace()]).unwrap();
        assert!(base.append(recover()).is_err());
    }

    #[test]
    fn clear_context_must_follow_recover() {
        let err = Chain::new([recover(), trace(), clear_context()]).unwrap_err();
        assert!(matches!(err, Error::MiddlewareOrder { name: "clear_context", index: 2, .. }));

        // Without recover, clear_context may sit anywhere.
        assert!(Chain::new([trace(), clear_context()]).is_ok());
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = Chain::new([recover(), clear_context(), clear_context()]).unwrap_err();
        assert!(matches!(err, Error::MiddlewareOrder { name: "clear_context", index: 2, .. }));
    }

    #[tokio::test]
    async fn empty_chain_is_the_handler_itself() {
        let pipeline = Chain::default().then(|_req: Request| async { "bare" });
        let res = pipeline
            .into_boxed_handler()
            .call(Request::builder(Method::Get, "/").empty())
            .await;
        assert_eq!(res.body().as_ref(), b"bare");
    }
}
