//! Panic isolation.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::error;

use super::Middleware;
use crate::jsonapi::ApiError;
use crate::request::Request;
use crate::response::IntoResponse;

pub(crate) const NAME: &str = "recover";

/// Catches a panic anywhere downstream, logs it, and answers
/// `internal_server_error`. Must be the outermost middleware of a chain.
///
/// This is a safety net for the unexpected. Predictable failures (bad body,
/// wrong media type, missing resource) are turned into their own error
/// responses before they can panic.
pub fn recover() -> Middleware {
    Middleware::from_fn(NAME, |req: Request, next| async move {
        let method = req.method();
        let path = req.path().to_owned();

        // Bound by `let` so the inner future, and anything it still owns, is
        // dropped before the panic is logged.
        let outcome = AssertUnwindSafe(next.run(req)).catch_unwind().await;

        match outcome {
            Ok(res) => res,
            Err(payload) => {
                error!(%method, %path, panic = panic_message(payload.as_ref()), "handler panicked");
                ApiError::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
