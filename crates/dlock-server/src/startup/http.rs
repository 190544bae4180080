//! HTTP server setup for the lock node.

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

use dlock_core::LockServer;

use crate::api;

/// Creates and binds the lock node HTTP server.
///
/// OS signal handling is disabled; the caller stops the server through its
/// handle when the shutdown signal fires.
pub fn lock_http_server(
    lock_server: Arc<LockServer>,
    address: String,
    port: u16,
    workers: Option<usize>,
) -> Result<Server, std::io::Error> {
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(lock_server.clone()))
            .service(api::routes())
    })
    .disable_signals();

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    Ok(server.bind((address, port))?.run())
}
