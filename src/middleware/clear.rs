use super::Middleware;
use crate::context::RequestContext;
use crate::request::Request;

pub(crate) const NAME: &str = "clear_context";

/// Clears the request's context once the inner chain is done with it,
/// whether it returned normally or unwound from a panic.
///
/// Place it directly inside [`recover`](super::recover).
pub fn clear_context() -> Middleware {
    Middleware::from_fn(NAME, |req: Request, next| async move {
        let _guard = ClearOnDrop(req.context().clone());
        next.run(req).await
    })
}

struct ClearOnDrop(RequestContext);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.0.clear();
    }
}
