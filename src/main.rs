use std::sync::Arc;

use steep::middleware::{User, clear_context, recover, trace};
use steep::todos::MemoryStore;
use steep::{Chain, Router, Server, Settings, logging, pages, static_files, todos};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), steep::Error> {
    let settings = Settings::load()?;
    logging::init(&settings.log_filter);

    let common = Chain::new([recover(), clear_context(), trace()])?;
    let store = Arc::new(MemoryStore::default());

    let app = pages::routes(Router::new(), &common, User::new(&settings.admin_user))?;
    let mut app = todos::routes(app, &common, store)?;

    if let Some(root) = settings.static_root() {
        info!(root = %root.display(), "serving static files");
        app = app.fallback(common.then(static_files::serve_dir(root.to_path_buf())));
    }

    Server::bind(settings.listen)
        .max_body_bytes(settings.max_body_bytes)
        .serve(app)
        .await
}
