//! JSON:API envelopes and the structured error taxonomy.
//!
//! Every success body is `{"data": ...}` and every failure body is
//! `{"errors": [{"id", "status", "title", "detail"}]}`, both labelled with
//! the vendor media type [`MEDIA_TYPE`].
//!
//! ```rust
//! use steep::{ApiError, IntoResponse, StatusCode};
//!
//! let res = ApiError::NOT_ACCEPTABLE.into_response();
//! assert_eq!(res.status_code(), StatusCode::NOT_ACCEPTABLE);
//! assert_eq!(res.content_type(), Some("application/vnd.api+json"));
//! ```

use std::borrow::Cow;
use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize, Serializer};
use tracing::error;

use crate::context::ContextError;
use crate::response::{IntoResponse, Response};

/// The only media type the API speaks.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

// ── Success envelope ──────────────────────────────────────────────────────────

/// `{"data": T}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T: Serialize> Document<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Serialises the envelope with the given status.
    pub fn respond(&self, status: StatusCode) -> Response {
        match serde_json::to_vec(self) {
            Ok(body) => Response::builder().status(status).jsonapi(body),
            Err(e) => {
                error!(error = %e, "failed to serialise response document");
                ApiError::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Document<T> {
    fn into_response(self) -> Response {
        self.respond(StatusCode::OK)
    }
}

// ── Error envelope ────────────────────────────────────────────────────────────

/// One entry of the `errors` array, and the error type handlers return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    id: &'static str,
    #[serde(serialize_with = "status_as_number")]
    status: StatusCode,
    title: &'static str,
    detail: Cow<'static, str>,
}

impl ApiError {
    /// The body failed to parse as the expected shape.
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        StatusCode::BAD_REQUEST,
        "Bad request",
        "Request body is not well-formed. It must be JSON.",
    );

    /// No route matched, or the addressed resource does not exist.
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        StatusCode::NOT_FOUND,
        "Not Found",
        "The requested resource does not exist.",
    );

    /// The method is not one the service routes.
    pub const METHOD_NOT_ALLOWED: Self = Self::new(
        "method_not_allowed",
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed",
        "The request method is not supported.",
    );

    /// `Accept` rejects the only supported media type.
    pub const NOT_ACCEPTABLE: Self = Self::new(
        "not_acceptable",
        StatusCode::NOT_ACCEPTABLE,
        "Not Acceptable",
        "Accept header must be set to 'application/vnd.api+json'.",
    );

    /// The body is larger than the server accepts.
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        StatusCode::PAYLOAD_TOO_LARGE,
        "Payload Too Large",
        "Request body exceeds the size limit.",
    );

    /// `Content-Type` is not the supported media type.
    pub const UNSUPPORTED_MEDIA_TYPE: Self = Self::new(
        "unsupported_media_type",
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "Unsupported Media Type",
        "Content-Type header must be set to: 'application/vnd.api+json'.",
    );

    /// Anything unexpected. Never carries internal detail to the client.
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        "Something went wrong.",
    );

    const fn new(
        id: &'static str,
        status: StatusCode,
        title: &'static str,
        detail: &'static str,
    ) -> Self {
        Self { id, status, title, detail: Cow::Borrowed(detail) }
    }

    /// Same error, different human-readable detail.
    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn id(&self) -> &'static str { self.id }
    pub fn status(&self) -> StatusCode { self.status }
    pub fn title(&self) -> &'static str { self.title }
    pub fn detail(&self) -> &str { &self.detail }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.status.as_u16(), self.detail)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorDocument<'a> {
    errors: [&'a ApiError; 1],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::to_vec(&ErrorDocument { errors: [&self] }).unwrap_or_else(|e| {
            error!(error = %e, id = self.id, "failed to serialise error document");
            br#"{"errors":[{"id":"internal_server_error","status":500}]}"#.to_vec()
        });
        Response::builder().status(self.status).jsonapi(body)
    }
}

/// Context lookups only fail when a route is wired without the middleware
/// its handler depends on.
impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        error!(error = %e, "request context lookup failed");
        Self::INTERNAL_SERVER_ERROR
    }
}

fn status_as_number<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}
