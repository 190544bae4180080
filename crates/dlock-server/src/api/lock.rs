//! Lock RPC handlers
//!
//! Implements the lock node RPC surface:
//! - POST /dlock/v1/lock - acquire a write lock
//! - POST /dlock/v1/unlock - release a write lock
//! - POST /dlock/v1/rlock - acquire a read lock
//! - POST /dlock/v1/runlock - release a read lock
//! - POST /dlock/v1/force-unlock - clear every holder of a name
//! - POST /dlock/v1/expired - whether a request id still holds a name
//! - GET /dlock/v1/epoch - epoch of this node run
//! - GET /dlock/v1/stats - lock table counts

use actix_web::{HttpResponse, Responder, get, post, web};
use tracing::warn;

use dlock_common::{LockResult, error::INVALID_ARGUMENT};
use dlock_core::{Epoch, LockArgs, LockServer, LockStats};

use crate::model::response::{Result, error_response};

fn respond(operation: &str, args: &LockArgs, result: LockResult<bool>) -> HttpResponse {
    match result {
        Ok(value) => Result::<bool>::http_success(value),
        Err(e) => {
            warn!(
                operation,
                name = %args.resource_name,
                request_id = %args.request_id,
                error = %e,
                "Lock request failed"
            );
            error_response(&e)
        }
    }
}

#[post("/lock")]
pub async fn lock(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("lock", &args, server.lock(&args))
}

#[post("/unlock")]
pub async fn unlock(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("unlock", &args, server.unlock(&args))
}

#[post("/rlock")]
pub async fn rlock(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("rlock", &args, server.rlock(&args))
}

#[post("/runlock")]
pub async fn runlock(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("runlock", &args, server.runlock(&args))
}

#[post("/force-unlock")]
pub async fn force_unlock(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("force_unlock", &args, server.force_unlock(&args))
}

#[post("/expired")]
pub async fn expired(server: web::Data<LockServer>, args: web::Json<LockArgs>) -> impl Responder {
    respond("expired", &args, server.expired(&args))
}

#[get("/epoch")]
pub async fn epoch(server: web::Data<LockServer>) -> impl Responder {
    Result::<Epoch>::http_success(server.epoch())
}

#[get("/stats")]
pub async fn stats(server: web::Data<LockServer>) -> impl Responder {
    Result::<LockStats>::http_success(server.stats())
}

/// JSON extractor config answering malformed bodies with the standard envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = Result::<()>::http_response(400, INVALID_ARGUMENT.code, err.to_string(), ());
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

pub fn routes() -> actix_web::Scope {
    web::scope(dlock_common::API_PREFIX)
        .app_data(json_config())
        .service(lock)
        .service(unlock)
        .service(rlock)
        .service(runlock)
        .service(force_unlock)
        .service(expired)
        .service(epoch)
        .service(stats)
}
