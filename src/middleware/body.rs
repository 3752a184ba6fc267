//! Typed body decoding.

use std::any::type_name;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::Middleware;
use crate::context::keys;
use crate::jsonapi::ApiError;
use crate::request::Request;
use crate::response::IntoResponse;

/// Decodes the JSON body into a fresh `T` for every request and stores it
/// under [`keys::BODY`]. A body that does not decode is answered with
/// `bad_request` and the rest of the chain is skipped.
///
/// ```rust
/// use steep::middleware::json_body;
/// use steep::Document;
///
/// #[derive(serde::Deserialize)]
/// struct NewTea { name: String }
///
/// let mw = json_body::<Document<NewTea>>();
/// assert_eq!(mw.name(), "json_body");
/// ```
pub fn json_body<T>() -> Middleware
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    Middleware::from_fn("json_body", |req: Request, next| async move {
        match serde_json::from_slice::<T>(req.body()) {
            Ok(value) => {
                req.context().set(keys::BODY, value);
                next.run(req).await
            }
            Err(e) => {
                debug!(error = %e, shape = type_name::<T>(), "rejecting malformed body");
                ApiError::BAD_REQUEST.into_response()
            }
        }
    })
}
