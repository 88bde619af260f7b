mod handle_calendar_webhook;

use actix_web::web;
use handle_calendar_webhook::handle_calendar_webhook_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/webhooks/calendar",
        web::post().to(handle_calendar_webhook_controller),
    );
}
