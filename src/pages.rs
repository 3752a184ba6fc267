//! Plain pages: a welcome text, an about text, and an admin view of the
//! authenticated principal.

use crate::chain::Chain;
use crate::context::keys;
use crate::error::Error;
use crate::jsonapi::Document;
use crate::method::Method;
use crate::middleware::{User, authenticate};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;

/// Registers `/`, `/about`, and `/admin` behind `common`. `/admin` also runs
/// [`authenticate`], attaching `admin` as the principal.
pub fn routes(router: Router, common: &Chain, admin: User) -> Result<Router, Error> {
    let authenticated = common.append(authenticate(move |_req| Some(admin.clone())))?;

    router
        .try_on(Method::Get, "/",      common.then(index))?
        .try_on(Method::Get, "/about", common.then(about))?
        .try_on(Method::Get, "/admin", authenticated.then(admin_page))
}

async fn index(_req: Request) -> &'static str {
    "Welcome!"
}

async fn about(_req: Request) -> &'static str {
    "You are on the about page."
}

async fn admin_page(req: Request) -> Response {
    let user = req.context().get::<User>(keys::USER);
    Document::new(user.as_deref()).into_response()
}
