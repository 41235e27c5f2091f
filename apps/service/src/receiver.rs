//! HTTP endpoint the external ping monitor publishes its events to.
//!
//! The same server also accepts relay echo status changes, see
//! [`crate::measurements`].

use actix_web::{HttpResponse, Responder, dev::Server, web};
use relay_qos::{MemoryCatalog, ProbeEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::EventReceiver;
use crate::measurements;

type EventSender = web::Data<mpsc::Sender<ProbeEvent>>;

/// Register the event route
pub fn register(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.route(path, web::post().to(receive_event));
}

/// Bind the receiver; the returned server must be spawned to run
pub fn bind(
    config: &EventReceiver,
    events: mpsc::Sender<ProbeEvent>,
    catalog: Arc<MemoryCatalog>,
) -> std::io::Result<Server> {
    let events: EventSender = web::Data::new(events);
    let catalog = web::Data::from(catalog);
    let path = config.path.clone();
    let measurements_path = config.measurements_path.clone();

    let server = actix_web::HttpServer::new(move || {
        let path = path.clone();
        let measurements_path = measurements_path.clone();
        actix_web::App::new()
            .app_data(events.clone())
            .app_data(catalog.clone())
            .configure(move |cfg| register(cfg, &path))
            .configure(move |cfg| measurements::register(cfg, &measurements_path))
    })
    .workers(1)
    .bind((config.bind.as_str(), config.port))?
    .run();

    Ok(server)
}

async fn receive_event(events: EventSender, event: web::Json<ProbeEvent>) -> impl Responder {
    let event = event.into_inner();
    debug!("Received event of measurement {}", event.process_id);

    match events.send(event).await {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(e) => {
            warn!("Event collector is gone, rejecting event of measurement {}", e.0.process_id);
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}
