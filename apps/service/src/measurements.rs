//! HTTP endpoint through which relay echo status changes reach the catalog.

use actix_web::{HttpResponse, Responder, web};
use relay_qos::{MeasurementKind, MeasurementUpdate, MemoryCatalog};
use tracing::{info, warn};

type Catalog = web::Data<MemoryCatalog>;

/// Register the measurement route
pub fn register(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.route(path, web::post().to(record_measurement));
}

async fn record_measurement(catalog: Catalog, update: web::Json<MeasurementUpdate>) -> impl Responder {
    match catalog.apply(&update, MeasurementKind::RelayEcho).await {
        Ok(()) => {
            info!("Relay echo of {} via {} is now {}", update.cloud, update.relay, update.status);
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            warn!("Rejected {} update of {} via {}: {}", update.status, update.cloud, update.relay, e);
            HttpResponse::Conflict().body(e.to_string())
        }
    }
}
