use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use super::model::Todo;
use super::store::TodoStore;
use crate::context::keys;
use crate::jsonapi::{ApiError, Document};
use crate::request::Request;
use crate::response::Response;
use crate::router::Params;

type Store = Arc<dyn TodoStore>;
type Outcome = Result<Response, ApiError>;

pub(super) async fn index(store: Store, _req: Request) -> Outcome {
    let todos = store.find_all().await?;
    Ok(Document::new(todos).respond(StatusCode::OK))
}

pub(super) async fn show(store: Store, req: Request) -> Outcome {
    let id = path_id(&req)?;
    let todo = store.find_by_id(&id).await?;
    Ok(Document::new(todo).respond(StatusCode::OK))
}

pub(super) async fn create(store: Store, req: Request) -> Outcome {
    let body = req.context().take::<Document<Todo>>(keys::BODY)?;
    let created = store.insert(body.data).await?;
    Ok(Document::new(created).respond(StatusCode::CREATED))
}

pub(super) async fn update(store: Store, req: Request) -> Outcome {
    let id = path_id(&req)?;
    let body = req.context().take::<Document<Todo>>(keys::BODY)?;
    store.update_by_id(&id, body.data).await?;
    Ok(Response::status(StatusCode::NO_CONTENT))
}

pub(super) async fn destroy(store: Store, req: Request) -> Outcome {
    let id = path_id(&req)?;
    store.delete_by_id(&id).await?;
    Ok(Response::status(StatusCode::NO_CONTENT))
}

fn path_id(req: &Request) -> Result<String, ApiError> {
    let params = req.context().require::<Params>(keys::PARAMS)?;
    params.get("id").map(str::to_owned).ok_or_else(|| {
        error!(path = req.path(), "route has no `:id` segment");
        ApiError::INTERNAL_SERVER_ERROR
    })
}
