use std::sync::Arc;

use counter_handler::{Handler, IncrementHandler, MemoryStore, StorageEngine};
use counter_service::{init_tracing, serve, ServiceSettings};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let settings = ServiceSettings::from_env();
    info!("Booting counter service with {:?}", settings);

    // one engine for the whole process, shared by every request
    let engine: Arc<dyn StorageEngine> =
        Arc::new(MemoryStore::with_tables([settings.handler.table.clone()]));
    let handler: Arc<dyn Handler> = Arc::new(IncrementHandler::with_config(
        engine,
        settings.handler.clone(),
    ));

    serve(&settings, handler)?.await
}
