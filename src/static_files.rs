//! Static file fallback.
//!
//! Serves a built single-page client for every request the router does not
//! claim. Register it with [`Router::fallback`](crate::Router::fallback):
//!
//! ```rust,no_run
//! use steep::{Router, static_files};
//!
//! let app = Router::new().fallback(static_files::serve_dir("client/build".into()));
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::error;

use crate::handler::Handler;
use crate::jsonapi::ApiError;
use crate::method::Method;
use crate::request::Request;
use crate::response::{ContentType, IntoResponse, Response};

/// Returns a handler serving files below `root`.
///
/// Only `GET` and `HEAD` are served. Directories resolve to their
/// `index.html`. Paths containing `..` or backslashes are refused with
/// `not_found`, as are files that do not exist.
pub fn serve_dir(root: PathBuf) -> impl Handler {
    let root: Arc<Path> = Arc::from(root);
    move |req: Request| {
        let root = Arc::clone(&root);
        async move { serve(&root, &req).await }
    }
}

async fn serve(root: &Path, req: &Request) -> Response {
    if !matches!(req.method(), Method::Get | Method::Head) {
        return ApiError::NOT_FOUND.into_response();
    }

    let Some(mut path) = resolve(root, req.path()) else {
        return ApiError::NOT_FOUND.into_response();
    };

    if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(contents) => {
            let content_type = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(ContentType::OctetStream, ContentType::from_extension);
            let res = Response::builder().bytes(content_type, contents);
            if req.method() == Method::Head {
                Response { body: Default::default(), ..res }
            } else {
                res
            }
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            ApiError::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read static file");
            ApiError::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Maps a URL path onto `root`, refusing anything that could escape it.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in url_path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::Router;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>todos</h1>").unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/app.js"), "console.log(1)").unwrap();
        dir
    }

    #[test]
    fn resolve_refuses_traversal() {
        let root = Path::new("/srv");
        assert_eq!(resolve(root, "/static/app.js"), Some(PathBuf::from("/srv/static/app.js")));
        assert_eq!(resolve(root, "/"), Some(PathBuf::from("/srv")));
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/a/..%2f/../b"), None);
    }

    #[tokio::test]
    async fn serves_files_and_index() {
        let dir = site();
        let router = Router::new().fallback(serve_dir(dir.path().to_path_buf()));

        let res = router.dispatch(Request::builder(Method::Get, "/").empty()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(res.body().as_ref(), b"<h1>todos</h1>");

        let res = router.dispatch(Request::builder(Method::Get, "/static/app.js").empty()).await;
        assert_eq!(res.content_type(), Some("text/javascript"));
        assert_eq!(res.body().as_ref(), b"console.log(1)");
    }

    #[tokio::test]
    async fn misses_are_not_found() {
        let dir = site();
        let router = Router::new().fallback(serve_dir(dir.path().to_path_buf()));

        for path in ["/missing.css", "/../secret", "/static/app.js/x"] {
            let res = router.dispatch(Request::builder(Method::Get, path).empty()).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{path}");
        }

        let res = router.dispatch(Request::builder(Method::Post, "/").empty()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_has_no_body() {
        let dir = site();
        let router = Router::new().fallback(serve_dir(dir.path().to_path_buf()));

        let res = router.dispatch(Request::builder(Method::Head, "/").empty()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.body().is_empty());
    }
}
