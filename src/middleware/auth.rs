//! Principal resolution.

use serde::Serialize;
use tracing::debug;

use super::Middleware;
use crate::context::keys;
use crate::request::Request;

/// The authenticated principal, stored under [`keys::USER`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Runs `resolve` over each request and stores the resulting [`User`], if
/// any. Requests without a principal continue unchanged; deciding what an
/// anonymous caller may see is up to the handler.
pub fn authenticate<F>(resolve: F) -> Middleware
where
    F: Fn(&Request) -> Option<User> + Send + Sync + 'static,
{
    Middleware::from_fn("authenticate", move |req: Request, next| {
        let user = resolve(&req);
        async move {
            match user {
                Some(user) => {
                    debug!(user = %user.name, "request authenticated");
                    req.context().set(keys::USER, user);
                }
                None => debug!("request is anonymous"),
            }
            next.run(req).await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ErasedHandler, Handler};
    use crate::{Chain, Method};

    fn whoami() -> crate::handler::BoxedHandler {
        Chain::new([authenticate(|req| req.header("x-user").map(User::new))])
            .unwrap()
            .then(|req: Request| async move {
                req.context()
                    .get::<User>(keys::USER)
                    .map_or_else(|| "anonymous".to_owned(), |u| u.name.clone())
            })
            .into_boxed_handler()
    }

    #[tokio::test]
    async fn stores_resolved_user() {
        let req = Request::builder(Method::Get, "/admin").header("x-user", "jemo").empty();
        let res = whoami().call(req).await;
        assert_eq!(res.body().as_ref(), b"jemo");
    }

    #[tokio::test]
    async fn anonymous_requests_pass_through() {
        let res = whoami().call(Request::builder(Method::Get, "/admin").empty()).await;
        assert_eq!(res.body().as_ref(), b"anonymous");
    }
}
